use crate::locale::Language;
use crate::session::SessionView;

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Rendering seam. The engine hands over a view once per frame.
pub trait Presenter {
    fn present(&mut self, view: &SessionView);
}

/// Keeps every view; handy for replays and tests.
impl Presenter for Vec<SessionView> {
    fn present(&mut self, view: &SessionView) {
        self.push(view.clone());
    }
}

/// Logs the view whenever it changes, which while a run is on the clock
/// means about once a second.
pub struct LogPresenter {
    language: Language,
    last: Option<SessionView>,
}

impl LogPresenter {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            last: None,
        }
    }
}

impl Presenter for LogPresenter {
    fn present(&mut self, view: &SessionView) {
        if self.last.as_ref() == Some(view) {
            return;
        }
        log_info!(
            "[{}] {} {} level {} score {} reps {}/{} time {}s{}{}",
            self.language,
            view.exercise,
            view.status.as_str(),
            view.level,
            view.score,
            view.reps,
            view.level_goal.map(|g| g.to_string()).unwrap_or_else(|| "-".into()),
            view.elapsed_secs,
            view.remaining_secs
                .map(|r| format!(" ({r}s left)"))
                .unwrap_or_default(),
            view.instruction
                .map(|key| format!(" instruction {key}"))
                .unwrap_or_default(),
        );
        self.last = Some(view.clone());
    }
}
