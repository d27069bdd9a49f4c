use std::time::{Duration, Instant};

use anyhow::Result;

use crate::exercises::{Exercise, ExerciseKind, FrameInput};
use crate::gesture::{GestureRegistry, HandReading, Perception};
use crate::session::{Session, SessionResult, SessionStatus};
use crate::tracking::FrameSource;

use super::context::EngineContext;
use super::controls::ControlSurface;
use super::presenter::Presenter;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Where frame timestamps come from.
#[derive(Debug, Clone, Copy)]
pub enum FrameClock {
    /// Live input: the moment the frame arrives.
    Wall,
    /// Replayed input: a fixed step per frame from `origin`, so a replay
    /// scores the same no matter how fast it is fed.
    Fixed {
        origin: Instant,
        step: Duration,
        ticks: u32,
    },
}

impl FrameClock {
    pub fn fixed(step: Duration) -> Self {
        Self::Fixed {
            origin: Instant::now(),
            step,
            ticks: 0,
        }
    }

    pub fn now(&self) -> Instant {
        match self {
            Self::Wall => Instant::now(),
            Self::Fixed {
                origin,
                step,
                ticks,
            } => *origin + *step * *ticks,
        }
    }

    fn tick(&mut self) {
        if let Self::Fixed { ticks, .. } = self {
            *ticks = ticks.saturating_add(1);
        }
    }
}

/// Why the frame loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ExitRequested,
    SourceEnded,
    SourceFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub reason: StopReason,
    pub frames: u64,
    pub transient_failures: u64,
    /// Partial or non-finite hands the source could not use.
    pub dropped_hands: u64,
    /// Results handed to the dispatcher, in order.
    pub results: Vec<SessionResult>,
}

/// Single-threaded frame loop: acquire, classify, advance, present, poll.
///
/// The only await point is frame acquisition. Controls are read after the
/// frame is presented and take effect before the next one is acquired.
pub struct Engine<'a> {
    ctx: &'a EngineContext,
    perception: Perception,
    session: Session,
    clock: FrameClock,
}

impl<'a> Engine<'a> {
    pub fn new(ctx: &'a EngineContext, kind: ExerciseKind, clock: FrameClock) -> Self {
        let settings = &ctx.settings;
        let perception = Perception::new(
            settings.classifier.clone(),
            GestureRegistry::standard(&settings.circle),
        );
        let session = Session::new(
            Exercise::new(kind, settings),
            ctx.profile.clone(),
            settings.seed,
        );
        Self {
            ctx,
            perception,
            session,
            clock,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Begin the first run without waiting for the Start affordance.
    pub fn auto_start(&mut self) {
        let now = self.clock.now();
        self.session.start(now);
    }

    pub async fn run<S, C, P>(
        &mut self,
        source: &mut S,
        controls: &mut C,
        presenter: &mut P,
    ) -> Result<LoopOutcome>
    where
        S: FrameSource,
        C: ControlSurface,
        P: Presenter,
    {
        let max_failures = self.ctx.settings.input.max_consecutive_failures;
        let mut outcome = LoopOutcome {
            reason: StopReason::SourceEnded,
            frames: 0,
            transient_failures: 0,
            dropped_hands: 0,
            results: Vec::new(),
        };
        let mut consecutive_failures = 0u32;

        loop {
            let hands: Option<Vec<HandReading>> = match source.next_frame().await {
                Ok(Some(frame)) => {
                    consecutive_failures = 0;
                    if frame.dropped_hands > 0 {
                        outcome.dropped_hands += frame.dropped_hands as u64;
                        log_debug!("{} partial hand(s) dropped this frame", frame.dropped_hands);
                    }
                    Some(self.perception.read(frame))
                }
                Ok(None) => {
                    log_info!("frame source ended");
                    self.stop(StopReason::SourceEnded, &mut outcome);
                    break;
                }
                Err(err) => {
                    consecutive_failures += 1;
                    outcome.transient_failures += 1;
                    if consecutive_failures > max_failures {
                        log_error!(
                            "frame source failed {} times in a row, giving up: {err:#}",
                            consecutive_failures
                        );
                        self.stop(StopReason::SourceFailed, &mut outcome);
                        break;
                    }
                    log_warn!("skipping frame: {err:#}");
                    None
                }
            };

            outcome.frames += 1;
            let now = self.clock.now();
            // A skipped frame leaves the model alone; only the clock advances.
            let closed = match hands {
                Some(hands) => {
                    let input = FrameInput::new(now, hands, self.ctx.settings.input.mirror_x);
                    self.session.advance(&input)
                }
                None => self.session.tick(now),
            };
            if let Some(result) = closed {
                self.submit(result, &mut outcome);
            }

            presenter.present(&self.session.view(now));

            let signals = controls.poll();
            if signals.exit {
                if self.session.status() == SessionStatus::Idle {
                    log_info!("exit before any run started");
                }
                self.stop(StopReason::ExitRequested, &mut outcome);
                break;
            }
            if signals.restart {
                if let Some(result) = self.session.restart(now) {
                    self.submit(result, &mut outcome);
                }
            } else if signals.start {
                self.session.start(now);
            }

            self.clock.tick();
        }

        Ok(outcome)
    }

    /// Close the current run (if one is in progress) as an exit.
    fn stop(&mut self, reason: StopReason, outcome: &mut LoopOutcome) {
        outcome.reason = reason;
        if let Some(result) = self.session.exit(self.clock.now()) {
            self.submit(result, outcome);
        }
    }

    fn submit(&self, result: SessionResult, outcome: &mut LoopOutcome) {
        outcome.results.push(result.clone());
        self.ctx.report(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::controls::{ChannelControls, ControlEvent};
    use crate::locale::Language;
    use crate::session::{PlayerProfile, ResultCode, SessionView};
    use crate::settings::EngineSettings;
    use crate::stats::reporter::fixtures::FlakyReporter;
    use crate::tracking::{LandmarkFrame, ScriptedSource};

    fn context(settings: EngineSettings, reporter: FlakyReporter) -> EngineContext {
        EngineContext::open(PlayerProfile::new("kostas", 58), Language::En, settings, reporter)
    }

    fn empty_frames(n: usize) -> ScriptedSource {
        let mut source = ScriptedSource::new();
        for _ in 0..n {
            source.push_frame(LandmarkFrame::empty());
        }
        source
    }

    #[tokio::test]
    async fn test_end_of_stream_is_an_implicit_exit() {
        let reporter = FlakyReporter::default();
        let ctx = context(EngineSettings::default(), reporter.clone());
        let mut engine = Engine::new(&ctx, ExerciseKind::Repetition, FrameClock::fixed(Duration::from_millis(100)));
        engine.auto_start();

        let (_tx, mut controls) = ChannelControls::channel(4);
        let mut views: Vec<SessionView> = Vec::new();
        let outcome = engine.run(&mut empty_frames(25), &mut controls, &mut views).await.unwrap();

        assert_eq!(outcome.reason, StopReason::SourceEnded);
        assert_eq!(outcome.frames, 25);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].result, ResultCode::Exit);
        assert_eq!(outcome.results[0].time_seconds, 2);
        assert_eq!(views.len(), 25);

        ctx.close().await.unwrap();
        assert_eq!(reporter.delivered().len(), 1);
        assert_eq!(reporter.delivered()[0].identity, "kostas");
    }

    #[tokio::test]
    async fn test_timer_expiry_is_reported_once_through_the_loop() {
        let mut settings = EngineSettings::default();
        settings.capture.time_limit_secs = 1;
        settings.reporting.retry_delay_ms = 10;
        let reporter = FlakyReporter::failing(1);
        let ctx = context(settings, reporter.clone());
        let mut engine = Engine::new(&ctx, ExerciseKind::Capture, FrameClock::fixed(Duration::from_millis(250)));
        engine.auto_start();

        let (_tx, mut controls) = ChannelControls::channel(4);
        let outcome = engine
            .run(&mut empty_frames(12), &mut controls, &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].result, ResultCode::Lose);
        assert_eq!(engine.session().status(), SessionStatus::Lost);

        ctx.close().await.unwrap();
        assert_eq!(reporter.attempts(), 2);
        assert_eq!(reporter.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_persistent_failures_end_the_run() {
        let mut settings = EngineSettings::default();
        settings.input.max_consecutive_failures = 3;
        let ctx = context(settings, FlakyReporter::default());
        let mut engine = Engine::new(&ctx, ExerciseKind::Puzzle, FrameClock::fixed(Duration::from_millis(33)));
        engine.auto_start();

        let mut source = ScriptedSource::new();
        source.push_frame(LandmarkFrame::empty());
        source.push_failure("camera hiccup");
        source.push_frame(LandmarkFrame::empty());
        for _ in 0..4 {
            source.push_failure("camera gone");
        }
        source.push_frame(LandmarkFrame::empty());

        let (_tx, mut controls) = ChannelControls::channel(4);
        let outcome = engine.run(&mut source, &mut controls, &mut Vec::new()).await.unwrap();

        assert_eq!(outcome.reason, StopReason::SourceFailed);
        assert_eq!(outcome.transient_failures, 5);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].result, ResultCode::Exit);
        assert_eq!(source.remaining(), 1);

        ctx.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_exit_while_idle_reports_nothing() {
        let reporter = FlakyReporter::default();
        let ctx = context(EngineSettings::default(), reporter.clone());
        let mut engine = Engine::new(&ctx, ExerciseKind::Drag, FrameClock::Wall);

        let (tx, mut controls) = ChannelControls::channel(4);
        tx.send(ControlEvent::Exit).await.unwrap();
        let outcome = engine.run(&mut empty_frames(10), &mut controls, &mut Vec::new()).await.unwrap();

        assert_eq!(outcome.reason, StopReason::ExitRequested);
        assert_eq!(outcome.frames, 1);
        assert!(outcome.results.is_empty());

        ctx.close().await.unwrap();
        assert_eq!(reporter.attempts(), 0);
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_the_held_shape() {
        use crate::gesture::grasp::fixtures::fist_at;

        let mut settings = EngineSettings::default();
        settings.input.mirror_x = false;
        let ctx = context(settings, FlakyReporter::default());
        let mut engine = Engine::new(&ctx, ExerciseKind::Drag, FrameClock::fixed(Duration::from_millis(100)));
        engine.auto_start();
        let Exercise::Drag(drag) = engine.session().exercise() else {
            unreachable!()
        };
        let cube = drag.shapes()[0].center;

        let mut source = ScriptedSource::new();
        source
            .push_frame(LandmarkFrame::with_hands(vec![fist_at((cube.x, cube.y), 0.04)]))
            .push_frame(LandmarkFrame::with_hands(vec![fist_at((0.6, 0.8), 0.04)]))
            .push_failure("camera hiccup")
            .push_frame(LandmarkFrame::with_hands(vec![fist_at((0.7, 0.9), 0.04)]));

        let (_tx, mut controls) = ChannelControls::channel(4);
        let outcome = engine.run(&mut source, &mut controls, &mut Vec::new()).await.unwrap();
        assert_eq!(outcome.transient_failures, 1);

        let Exercise::Drag(drag) = engine.session().exercise() else {
            unreachable!()
        };
        let held = drag.held().expect("cube still held after the skipped frame");
        assert!((held.center.x - 0.7).abs() < 1e-4);
        assert!((held.center.y - 0.9).abs() < 1e-4);

        ctx.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_skipped_frames_still_run_the_countdown() {
        let mut settings = EngineSettings::default();
        settings.capture.time_limit_secs = 1;
        settings.input.max_consecutive_failures = 100;
        let ctx = context(settings, FlakyReporter::default());
        let mut engine = Engine::new(&ctx, ExerciseKind::Capture, FrameClock::fixed(Duration::from_millis(250)));
        engine.auto_start();

        let mut source = ScriptedSource::new();
        source.push_frame(LandmarkFrame {
            hands: Vec::new(),
            dropped_hands: 2,
        });
        for _ in 0..8 {
            source.push_failure("no camera frame");
        }

        let (_tx, mut controls) = ChannelControls::channel(4);
        let outcome = engine.run(&mut source, &mut controls, &mut Vec::new()).await.unwrap();

        assert_eq!(outcome.reason, StopReason::SourceEnded);
        assert_eq!(outcome.dropped_hands, 2);
        assert_eq!(outcome.transient_failures, 8);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].result, ResultCode::Lose);
        assert_eq!(outcome.results[0].time_seconds, 1);

        ctx.close().await.unwrap();
    }

    /// Presses controls on chosen frames, right before the loop polls them.
    struct ScriptedPresenter {
        tx: tokio::sync::mpsc::Sender<ControlEvent>,
        script: Vec<(usize, ControlEvent)>,
        views: Vec<SessionView>,
    }

    impl Presenter for ScriptedPresenter {
        fn present(&mut self, view: &SessionView) {
            self.views.push(view.clone());
            let frame = self.views.len();
            for (at, event) in &self.script {
                if *at == frame {
                    self.tx.try_send(*event).unwrap();
                }
            }
        }
    }

    #[tokio::test]
    async fn test_start_then_restart_then_exit() {
        let ctx = context(EngineSettings::default(), FlakyReporter::default());
        let mut engine = Engine::new(&ctx, ExerciseKind::Repetition, FrameClock::fixed(Duration::from_millis(100)));

        let (tx, mut controls) = ChannelControls::channel(4);
        let mut presenter = ScriptedPresenter {
            tx,
            script: vec![
                (1, ControlEvent::Start),
                (5, ControlEvent::Restart),
                (8, ControlEvent::Exit),
            ],
            views: Vec::new(),
        };
        let outcome = engine
            .run(&mut empty_frames(50), &mut controls, &mut presenter)
            .await
            .unwrap();

        assert_eq!(outcome.reason, StopReason::ExitRequested);
        assert_eq!(outcome.frames, 8);
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results.iter().all(|r| r.result == ResultCode::Exit));
        assert_ne!(outcome.results[0].run_id, outcome.results[1].run_id);

        assert_eq!(presenter.views[0].status, SessionStatus::Idle);
        assert_eq!(presenter.views[1].status, SessionStatus::Playing);
        assert_eq!(engine.session().status(), SessionStatus::Exited);

        ctx.close().await.unwrap();
    }
}
