//! The four interaction models.
//!
//! Each model owns only its private sub-state and advances once per frame
//! through [`InteractionModel::advance`]. The shared counters live in
//! [`Progress`], which the session owns and resets on every run. Timing is
//! handled by the session's run clock; a model only reports whether its own
//! goal has been reached.

pub mod capture;
pub mod drag;
pub mod repetition;
pub mod sliding;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Error};
use rand::rngs::StdRng;
use serde::Serialize;

use crate::geometry::Point;
use crate::gesture::HandReading;
use crate::settings::EngineSettings;
use crate::tracking::Landmark;

pub use capture::{CaptureModel, CaptureSettings, Collectible};
pub use drag::{DragModel, DragSettings, Shape, ShapeKind};
pub use repetition::{RepetitionModel, RepetitionSettings};
pub use sliding::{PuzzleSettings, SlidingPuzzle};

/// Everything a model sees for one frame.
#[derive(Debug, Clone)]
pub struct FrameInput {
    pub now: Instant,
    pub hands: Vec<HandReading>,
    /// Flip x when mapping landmarks onto the (mirrored) play field.
    pub mirror_x: bool,
}

impl FrameInput {
    pub fn new(now: Instant, hands: Vec<HandReading>, mirror_x: bool) -> Self {
        Self {
            now,
            hands,
            mirror_x,
        }
    }

    /// Map a camera-space landmark onto the play field.
    pub fn point(&self, lm: Landmark) -> Point {
        if self.mirror_x {
            lm.mirrored().into()
        } else {
            lm.into()
        }
    }

    pub fn primary_hand(&self) -> Option<&HandReading> {
        self.hands.first()
    }
}

/// Counters shared by every model. `level` is zero-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub score: u32,
    pub level: usize,
    pub reps: u32,
}

/// Model outcome for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Won,
    Lost,
    Completed,
}

pub trait InteractionModel {
    /// Throw away the sub-state and build a fresh configuration.
    fn reset(&mut self, rng: &mut StdRng);

    fn advance(&mut self, input: &FrameInput, progress: &mut Progress, rng: &mut StdRng) -> Verdict;

    /// Countdown budget for one run, `None` when untimed.
    fn time_limit(&self) -> Option<Duration>;

    /// Localization key of what the player should do right now.
    fn instruction(&self) -> Option<&'static str>;

    /// Goal of the current level, for display.
    fn level_goal(&self, progress: &Progress) -> Option<u32>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Capture,
    Drag,
    Puzzle,
    Repetition,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::Capture,
        ExerciseKind::Drag,
        ExerciseKind::Puzzle,
        ExerciseKind::Repetition,
    ];

    /// Stable key reported with every result.
    pub fn game_id(&self) -> &'static str {
        match self {
            Self::Capture => "exercise_1",
            Self::Drag => "exercise_2",
            Self::Puzzle => "exercise_3",
            Self::Repetition => "exercise_4",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Drag => "drag",
            Self::Puzzle => "puzzle",
            Self::Repetition => "repetition",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == key || kind.game_id() == key)
            .ok_or_else(|| anyhow!("unknown exercise '{s}'"))
    }
}

/// Tagged variant over the four models.
#[derive(Debug, Clone)]
pub enum Exercise {
    Capture(CaptureModel),
    Drag(DragModel),
    Puzzle(SlidingPuzzle),
    Repetition(RepetitionModel),
}

impl Exercise {
    pub fn new(kind: ExerciseKind, settings: &EngineSettings) -> Self {
        match kind {
            ExerciseKind::Capture => Self::Capture(CaptureModel::new(settings.capture.clone())),
            ExerciseKind::Drag => {
                Self::Drag(DragModel::new(settings.drag.clone(), settings.grasp.clone()))
            }
            ExerciseKind::Puzzle => {
                Self::Puzzle(SlidingPuzzle::new(settings.puzzle.clone(), settings.grasp.clone()))
            }
            ExerciseKind::Repetition => Self::Repetition(RepetitionModel::new(
                settings.repetition.clone(),
                &settings.circle,
            )),
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        match self {
            Self::Capture(_) => ExerciseKind::Capture,
            Self::Drag(_) => ExerciseKind::Drag,
            Self::Puzzle(_) => ExerciseKind::Puzzle,
            Self::Repetition(_) => ExerciseKind::Repetition,
        }
    }

    fn model(&self) -> &dyn InteractionModel {
        match self {
            Self::Capture(m) => m,
            Self::Drag(m) => m,
            Self::Puzzle(m) => m,
            Self::Repetition(m) => m,
        }
    }

    fn model_mut(&mut self) -> &mut dyn InteractionModel {
        match self {
            Self::Capture(m) => m,
            Self::Drag(m) => m,
            Self::Puzzle(m) => m,
            Self::Repetition(m) => m,
        }
    }
}

impl InteractionModel for Exercise {
    fn reset(&mut self, rng: &mut StdRng) {
        self.model_mut().reset(rng)
    }

    fn advance(&mut self, input: &FrameInput, progress: &mut Progress, rng: &mut StdRng) -> Verdict {
        self.model_mut().advance(input, progress, rng)
    }

    fn time_limit(&self) -> Option<Duration> {
        self.model().time_limit()
    }

    fn instruction(&self) -> Option<&'static str> {
        self.model().instruction()
    }

    fn level_goal(&self, progress: &Progress) -> Option<u32> {
        self.model().level_goal(progress)
    }
}
