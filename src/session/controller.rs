use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use uuid::Uuid;

use crate::exercises::{Exercise, FrameInput, InteractionModel, Progress, Verdict};

use super::{PlayerProfile, RunClock, SessionResult, SessionStatus};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// What the renderer needs to draw one frame of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub exercise: &'static str,
    pub status: SessionStatus,
    pub score: u32,
    /// One-based for display.
    pub level: usize,
    pub reps: u32,
    pub level_goal: Option<u32>,
    pub elapsed_secs: u64,
    pub remaining_secs: Option<u64>,
    pub instruction: Option<&'static str>,
}

/// State machine for one exercise: `Idle → Playing → {Won, Lost, Completed, Exited}`.
///
/// Every terminal transition goes through [`Session::finalize`], which hands
/// back the result record at most once per run. The one-shot flag is cleared
/// only when a new run begins.
#[derive(Debug)]
pub struct Session {
    exercise: Exercise,
    profile: PlayerProfile,
    status: SessionStatus,
    progress: Progress,
    clock: RunClock,
    rng: StdRng,
    run_id: Option<String>,
    reported: bool,
}

impl Session {
    pub fn new(exercise: Exercise, profile: PlayerProfile, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            exercise,
            profile,
            status: SessionStatus::Idle,
            progress: Progress::default(),
            clock: RunClock::new(),
            rng,
            run_id: None,
            reported: false,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// Begin a run from `Idle` or a terminal state. Ignored while playing.
    pub fn start(&mut self, now: Instant) {
        if self.status == SessionStatus::Playing {
            log_debug!("start ignored, run already in progress");
            return;
        }
        self.begin_run(now);
    }

    /// Start over with fresh counters and a fresh configuration. A run still
    /// in progress is closed as an exit first and its result returned.
    pub fn restart(&mut self, now: Instant) -> Option<SessionResult> {
        let closed = match self.status {
            SessionStatus::Playing => self.finalize(SessionStatus::Exited, now),
            _ => None,
        };
        self.begin_run(now);
        closed
    }

    /// Explicit exit. Only a run in progress produces a result.
    pub fn exit(&mut self, now: Instant) -> Option<SessionResult> {
        match self.status {
            SessionStatus::Playing => self.finalize(SessionStatus::Exited, now),
            _ => None,
        }
    }

    /// Feed one frame. Returns the result record on the frame the run ends.
    pub fn advance(&mut self, input: &FrameInput) -> Option<SessionResult> {
        if self.status != SessionStatus::Playing {
            return None;
        }

        let verdict = self
            .exercise
            .advance(input, &mut self.progress, &mut self.rng);

        // Goal checks come before the clock: reaching the goal on the last
        // frame of the budget still counts.
        let terminal = match verdict {
            Verdict::Won => Some(SessionStatus::Won),
            Verdict::Lost => Some(SessionStatus::Lost),
            Verdict::Completed => Some(SessionStatus::Completed),
            Verdict::Continue if self.clock.is_expired(input.now) => Some(SessionStatus::Lost),
            Verdict::Continue => None,
        };

        terminal.and_then(|status| self.finalize(status, input.now))
    }

    /// Frame with no usable input. Only the clock moves; the model and its
    /// grasp state are left as they were.
    pub fn tick(&mut self, now: Instant) -> Option<SessionResult> {
        if self.status == SessionStatus::Playing && self.clock.is_expired(now) {
            return self.finalize(SessionStatus::Lost, now);
        }
        None
    }

    pub fn view(&self, now: Instant) -> SessionView {
        let running = self.status != SessionStatus::Idle;
        SessionView {
            exercise: self.exercise.kind().game_id(),
            status: self.status,
            score: self.progress.score,
            level: self.progress.level + 1,
            reps: self.progress.reps,
            level_goal: self.exercise.level_goal(&self.progress),
            elapsed_secs: if running { self.clock.elapsed_secs(now) } else { 0 },
            remaining_secs: if running {
                self.clock.remaining_ms(now).map(|ms| ms.div_ceil(1000))
            } else {
                self.exercise.time_limit().map(|d| d.as_secs())
            },
            instruction: self.exercise.instruction(),
        }
    }

    fn begin_run(&mut self, now: Instant) {
        let run_id = Uuid::new_v4().to_string();
        self.exercise.reset(&mut self.rng);
        self.progress = Progress::default();
        self.clock.begin(self.exercise.time_limit(), now);
        self.status = SessionStatus::Playing;
        self.reported = false;
        log_info!(
            "run {} started: {} for {}",
            run_id,
            self.exercise.kind().game_id(),
            self.profile.identity
        );
        self.run_id = Some(run_id);
    }

    /// Enter `status` and build the result, unless this run already reported.
    fn finalize(&mut self, status: SessionStatus, now: Instant) -> Option<SessionResult> {
        if self.reported {
            return None;
        }
        let result = status.result_code()?;

        self.clock.stop(now);
        self.status = status;
        self.reported = true;

        let record = SessionResult {
            identity: self.profile.identity.clone(),
            age: self.profile.age,
            game_id: self.exercise.kind().game_id().to_string(),
            score: self.progress.score,
            time_seconds: self.clock.elapsed_secs(now),
            result,
            run_id: self.run_id.clone().unwrap_or_default(),
        };
        log_info!(
            "run {} ended {} (score {}, {}s)",
            record.run_id,
            record.result,
            record.score,
            record.time_seconds
        );
        Some(record)
    }
}
