use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::gesture::{CircleThresholds, Gesture, GestureRegistry};

use super::{FrameInput, InteractionModel, Progress, Verdict};

const ENABLE_LOGS: bool = false;

use crate::log_debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepetitionSettings {
    /// Reps required per entry, one value per level.
    pub rep_levels: Vec<u32>,
    pub cooldown_ms: u64,
    pub points_per_entry: u32,
}

impl Default for RepetitionSettings {
    fn default() -> Self {
        Self {
            rep_levels: vec![5, 10, 15, 20, 25],
            cooldown_ms: 500,
            points_per_entry: 10,
        }
    }
}

/// Gestures the player works through at every level.
pub const CATALOGUE: [Gesture; 5] = [
    Gesture::CloseAllFingers,
    Gesture::OpenOnlyThumb,
    Gesture::CloseIndexThumb,
    Gesture::CloseThumbIndexMiddle,
    Gesture::CloseOnlyThumb,
];

/// Repeat each requested gesture a set number of times; the count
/// escalates level by level until every level is done.
#[derive(Debug, Clone)]
pub struct RepetitionModel {
    settings: RepetitionSettings,
    registry: GestureRegistry,
    order: Vec<Gesture>,
    entry: usize,
    last_counted: Option<Instant>,
}

impl RepetitionModel {
    pub fn new(settings: RepetitionSettings, circle: &CircleThresholds) -> Self {
        Self {
            settings,
            registry: GestureRegistry::standard(circle),
            order: CATALOGUE.to_vec(),
            entry: 0,
            last_counted: None,
        }
    }

    /// The gesture currently asked for.
    pub fn current(&self) -> Option<Gesture> {
        self.order.get(self.entry).copied()
    }

    pub fn order(&self) -> &[Gesture] {
        &self.order
    }

    fn cooldown(&self) -> Duration {
        Duration::from_millis(self.settings.cooldown_ms)
    }

    fn cooled_down(&self, now: Instant) -> bool {
        self.last_counted
            .map(|last| now.saturating_duration_since(last) >= self.cooldown())
            .unwrap_or(true)
    }

    fn reshuffle(&mut self, rng: &mut StdRng) {
        self.order = CATALOGUE.to_vec();
        self.order.shuffle(rng);
        self.entry = 0;
    }
}

impl InteractionModel for RepetitionModel {
    fn reset(&mut self, rng: &mut StdRng) {
        self.last_counted = None;
        self.reshuffle(rng);
    }

    fn advance(&mut self, input: &FrameInput, progress: &mut Progress, rng: &mut StdRng) -> Verdict {
        let Some(gesture) = self.current() else {
            return Verdict::Completed;
        };
        let Some(goal) = self.settings.rep_levels.get(progress.level).copied() else {
            return Verdict::Completed;
        };

        let matched = input
            .hands
            .iter()
            .any(|hand| self.registry.matches(gesture, &hand.fingers, &hand.observation));
        if !matched || !self.cooled_down(input.now) {
            return Verdict::Continue;
        }

        progress.reps += 1;
        self.last_counted = Some(input.now);
        log_debug!("{} rep {}/{}", gesture.id(), progress.reps, goal);

        if progress.reps < goal {
            return Verdict::Continue;
        }

        progress.score += self.settings.points_per_entry;
        progress.reps = 0;
        self.entry += 1;
        if self.entry < self.order.len() {
            return Verdict::Continue;
        }

        progress.level += 1;
        if progress.level >= self.settings.rep_levels.len() {
            return Verdict::Completed;
        }
        self.reshuffle(rng);
        Verdict::Continue
    }

    fn time_limit(&self) -> Option<Duration> {
        None
    }

    fn instruction(&self) -> Option<&'static str> {
        self.current().map(|g| g.label_key())
    }

    fn level_goal(&self, progress: &Progress) -> Option<u32> {
        self.settings.rep_levels.get(progress.level).copied()
    }
}
