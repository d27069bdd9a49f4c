use std::time::Duration;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::gesture::{GraspEdge, GraspMode, GraspThresholds, GraspTracker};
use crate::puzzle::{BoardLayout, PuzzleBoard, Slide, TargetTile};
use crate::tracking::HandLandmark;

use super::{FrameInput, InteractionModel, Progress, Verdict};

const ENABLE_LOGS: bool = false;

use crate::log_debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleSettings {
    pub grid_size: usize,
    pub shuffle_moves: usize,
    /// Directed moves needed to clear each level.
    pub level_goals: Vec<u32>,
    pub layout: BoardLayout,
}

impl Default for PuzzleSettings {
    fn default() -> Self {
        Self {
            grid_size: 4,
            shuffle_moves: 20,
            level_goals: vec![5, 10, 15],
            layout: BoardLayout::default(),
        }
    }
}

/// Push highlighted tiles into the gap with a pinch. Untimed.
///
/// `Progress::reps` counts directed moves inside the current level and
/// `Progress::score` counts them over the whole run.
#[derive(Debug, Clone)]
pub struct SlidingPuzzle {
    settings: PuzzleSettings,
    board: PuzzleBoard,
    target: Option<TargetTile>,
    tracker: GraspTracker,
    moves: u32,
}

impl SlidingPuzzle {
    pub fn new(settings: PuzzleSettings, grasp: GraspThresholds) -> Self {
        let board = PuzzleBoard::solved(settings.grid_size);
        Self {
            settings,
            board,
            target: None,
            tracker: GraspTracker::new(GraspMode::Pinch, grasp),
            moves: 0,
        }
    }

    pub fn board(&self) -> &PuzzleBoard {
        &self.board
    }

    pub fn target(&self) -> Option<TargetTile> {
        self.target
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.settings.layout
    }

    /// Accepted slides this run, directed or not.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    fn shuffle(&mut self, rng: &mut StdRng) {
        let (board, _) =
            PuzzleBoard::generate(self.settings.grid_size, self.settings.shuffle_moves, rng);
        self.board = board;
        self.target = self.board.pick_target(rng);
    }

    /// After a slide, is the empty cell next to the tile we asked for?
    fn is_directed(&self) -> bool {
        self.target
            .and_then(|t| self.board.position_of(t.value))
            .map(|cell| cell.is_adjacent(&self.board.empty_cell()))
            .unwrap_or(false)
    }

    fn apply(&mut self, slide: Slide, progress: &mut Progress, rng: &mut StdRng) -> Verdict {
        self.moves += 1;
        let directed = self.is_directed();
        log_debug!(
            "tile {} slid {:?} -> {:?} (directed: {})",
            slide.value,
            slide.from,
            slide.to,
            directed
        );

        if directed {
            progress.reps += 1;
            progress.score += 1;
        }
        self.target = self.board.pick_target(rng);

        let Some(goal) = self.settings.level_goals.get(progress.level).copied() else {
            return Verdict::Completed;
        };
        if progress.reps < goal {
            return Verdict::Continue;
        }
        if progress.level + 1 >= self.settings.level_goals.len() {
            return Verdict::Completed;
        }

        progress.level += 1;
        progress.reps = 0;
        self.shuffle(rng);
        Verdict::Continue
    }
}

impl InteractionModel for SlidingPuzzle {
    fn reset(&mut self, rng: &mut StdRng) {
        self.moves = 0;
        self.tracker.reset();
        self.shuffle(rng);
    }

    fn advance(&mut self, input: &FrameInput, progress: &mut Progress, rng: &mut StdRng) -> Verdict {
        let hand = input.primary_hand();
        let edge = self.tracker.update(hand.map(|h| &h.observation));

        let (GraspEdge::Engaged, Some(hand)) = (edge, hand) else {
            return Verdict::Continue;
        };

        let cursor = input.point(hand.observation.get(HandLandmark::IndexTip));
        let Some(cell) = self.settings.layout.cell_at(cursor, self.board.size()) else {
            return Verdict::Continue;
        };

        match self.board.slide(cell) {
            Ok(slide) => self.apply(slide, progress, rng),
            Err(reason) => {
                log_debug!("slide at {:?} rejected: {:?}", cell, reason);
                Verdict::Continue
            }
        }
    }

    fn time_limit(&self) -> Option<Duration> {
        None
    }

    fn instruction(&self) -> Option<&'static str> {
        None
    }

    fn level_goal(&self, progress: &Progress) -> Option<u32> {
        self.settings.level_goals.get(progress.level).copied()
    }
}
