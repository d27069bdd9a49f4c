use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::gesture::HandReading;
use crate::tracking::HandLandmark;

use super::{FrameInput, InteractionModel, Progress, Verdict};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub win_score: u32,
    pub time_limit_secs: u64,
    pub collectibles: usize,
    /// Edge of a collectible, normalized.
    pub collectible_size: f32,
    /// Edge of the hand cursor box, normalized.
    pub cursor_size: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            win_score: 10,
            time_limit_secs: 30,
            collectibles: 5,
            collectible_size: 0.067,
            cursor_size: 0.133,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collectible {
    pub id: u64,
    pub bounds: Rect,
}

/// Collect stars by closing the hand over them before the clock runs out.
#[derive(Debug, Clone)]
pub struct CaptureModel {
    settings: CaptureSettings,
    collectibles: Vec<Collectible>,
    next_id: u64,
}

impl CaptureModel {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings,
            collectibles: Vec::new(),
            next_id: 0,
        }
    }

    pub fn collectibles(&self) -> &[Collectible] {
        &self.collectibles
    }

    fn spawn(&mut self, rng: &mut StdRng) -> Collectible {
        let size = self.settings.collectible_size;
        let span = (1.0 - size).max(0.0);
        let id = self.next_id;
        self.next_id += 1;
        Collectible {
            id,
            bounds: Rect::new(rng.gen::<f32>() * span, rng.gen::<f32>() * span, size, size),
        }
    }

    /// Cursor box for one hand, or `None` while the middle finger is extended.
    fn cursor(&self, input: &FrameInput, hand: &HandReading) -> Option<Rect> {
        let obs = &hand.observation;
        let base = obs.get(HandLandmark::MiddleMcp);
        let tip = obs.get(HandLandmark::MiddleTip);
        if tip.y <= base.y {
            return None;
        }
        let center: Point = input.point(base);
        Some(Rect::centered(
            center,
            self.settings.cursor_size,
            self.settings.cursor_size,
        ))
    }
}

impl InteractionModel for CaptureModel {
    fn reset(&mut self, rng: &mut StdRng) {
        self.collectibles.clear();
        for _ in 0..self.settings.collectibles {
            let item = self.spawn(rng);
            self.collectibles.push(item);
        }
    }

    fn advance(&mut self, input: &FrameInput, progress: &mut Progress, rng: &mut StdRng) -> Verdict {
        let cursors: Vec<Rect> = input
            .hands
            .iter()
            .filter_map(|hand| self.cursor(input, hand))
            .collect();

        for cursor in cursors {
            for slot in 0..self.collectibles.len() {
                if cursor.intersects(&self.collectibles[slot].bounds) {
                    self.collectibles[slot] = self.spawn(rng);
                    progress.score += 1;
                }
            }
        }

        if progress.score >= self.settings.win_score {
            Verdict::Won
        } else {
            Verdict::Continue
        }
    }

    fn time_limit(&self) -> Option<Duration> {
        Some(Duration::from_secs(self.settings.time_limit_secs))
    }

    fn instruction(&self) -> Option<&'static str> {
        None
    }

    fn level_goal(&self, _progress: &Progress) -> Option<u32> {
        Some(self.settings.win_score)
    }
}
