use anyhow::Result;

use crate::locale::Language;
use crate::session::{PlayerProfile, SessionResult};
use crate::settings::EngineSettings;
use crate::stats::{StatsDispatcher, StatsReporter};

/// Everything a run needs that used to live in globals: who is playing, in
/// which language, with which tunables, and where results go.
///
/// Open it once at startup and [`close`](EngineContext::close) it at the
/// end so queued results get delivered.
pub struct EngineContext {
    pub profile: PlayerProfile,
    pub language: Language,
    pub settings: EngineSettings,
    dispatcher: StatsDispatcher,
}

impl EngineContext {
    /// Must be called inside a tokio runtime; starts the stats worker.
    pub fn open<R>(
        profile: PlayerProfile,
        language: Language,
        settings: EngineSettings,
        reporter: R,
    ) -> Self
    where
        R: StatsReporter + Send + Sync + 'static,
    {
        let dispatcher = StatsDispatcher::spawn(reporter, &settings.reporting);
        Self {
            profile,
            language,
            settings,
            dispatcher,
        }
    }

    /// Queue a finished run for delivery. Never waits.
    pub fn report(&self, result: SessionResult) -> bool {
        self.dispatcher.dispatch(result)
    }

    /// Drain pending deliveries and stop the worker.
    pub async fn close(mut self) -> Result<()> {
        self.dispatcher.shutdown().await
    }
}
