use serde::{Deserialize, Serialize};

use crate::tracking::{HandLandmark, HandObservation, Landmark};

/// How a "holding" hand is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraspMode {
    /// Thumb tip touching the index tip.
    Pinch,
    /// All five fingertips bunched together.
    Fist,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraspThresholds {
    /// Maximum thumb-to-index tip distance for a pinch.
    pub pinch_distance: f32,
    /// Maximum distance between any two fingertips for a fist grab.
    pub fist_spread: f32,
}

impl Default for GraspThresholds {
    fn default() -> Self {
        Self {
            pinch_distance: 0.08,
            fist_spread: 0.08,
        }
    }
}

pub fn is_engaged(hand: &HandObservation, mode: GraspMode, thresholds: &GraspThresholds) -> bool {
    match mode {
        GraspMode::Pinch => {
            hand.distance(HandLandmark::ThumbTip, HandLandmark::IndexTip) < thresholds.pinch_distance
        }
        GraspMode::Fist => {
            let tips = HandLandmark::fingertips();
            tips.iter().enumerate().all(|(i, a)| {
                tips[i + 1..]
                    .iter()
                    .all(|b| hand.distance(*a, *b) < thresholds.fist_spread)
            })
        }
    }
}

/// Mean of the five fingertips; the drag cursor.
pub fn fingertip_centroid(hand: &HandObservation) -> Landmark {
    hand.centroid(&HandLandmark::fingertips())
}

/// Grasp transition seen on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraspEdge {
    Idle,
    /// Rising edge: not engaged last frame, engaged now.
    Engaged,
    Holding,
    /// Falling edge, including the hand disappearing mid-hold.
    Released,
}

impl GraspEdge {
    pub fn is_engaged(&self) -> bool {
        matches!(self, GraspEdge::Engaged | GraspEdge::Holding)
    }
}

/// Engage/release edge detector over successive frames.
#[derive(Debug, Clone)]
pub struct GraspTracker {
    mode: GraspMode,
    thresholds: GraspThresholds,
    engaged: bool,
}

impl GraspTracker {
    pub fn new(mode: GraspMode, thresholds: GraspThresholds) -> Self {
        Self {
            mode,
            thresholds,
            engaged: false,
        }
    }

    /// Feed this frame's tracked hand (`None` when no hand is visible).
    pub fn update(&mut self, hand: Option<&HandObservation>) -> GraspEdge {
        let now_engaged = hand
            .map(|h| is_engaged(h, self.mode, &self.thresholds))
            .unwrap_or(false);

        let edge = match (self.engaged, now_engaged) {
            (false, true) => GraspEdge::Engaged,
            (true, true) => GraspEdge::Holding,
            (true, false) => GraspEdge::Released,
            (false, false) => GraspEdge::Idle,
        };
        self.engaged = now_engaged;
        edge
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn reset(&mut self) {
        self.engaged = false;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::gesture::classifier::fixtures::{hand_from, set};

    /// Hand whose thumb and index tips sit at `cursor`, `gap` apart.
    pub fn pinch_at(cursor: (f32, f32), gap: f32) -> HandObservation {
        hand_from(|p| {
            set(p, HandLandmark::Wrist, cursor.0, cursor.1 + 0.3);
            set(p, HandLandmark::ThumbTip, cursor.0 - gap / 2.0, cursor.1);
            set(p, HandLandmark::IndexTip, cursor.0 + gap / 2.0, cursor.1);
            set(p, HandLandmark::MiddleTip, cursor.0 + 0.2, cursor.1 - 0.1);
            set(p, HandLandmark::RingTip, cursor.0 + 0.25, cursor.1 - 0.1);
            set(p, HandLandmark::PinkyTip, cursor.0 + 0.3, cursor.1 - 0.1);
        })
    }

    /// Hand with every fingertip within `spread` of `center`.
    pub fn fist_at(center: (f32, f32), spread: f32) -> HandObservation {
        let offsets = [(-1.0, 0.0), (1.0, 0.0), (0.0, -1.0), (0.0, 1.0), (0.0, 0.0)];
        hand_from(|p| {
            set(p, HandLandmark::Wrist, center.0, center.1 + 0.3);
            for (tip, (dx, dy)) in HandLandmark::fingertips().iter().zip(offsets) {
                set(p, *tip, center.0 + dx * spread / 2.0, center.1 + dy * spread / 2.0);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_pinch_threshold() {
        let t = GraspThresholds::default();
        assert!(is_engaged(&pinch_at((0.5, 0.5), 0.02), GraspMode::Pinch, &t));
        assert!(!is_engaged(&pinch_at((0.5, 0.5), 0.2), GraspMode::Pinch, &t));
    }

    #[test]
    fn test_fist_needs_every_tip_close() {
        let t = GraspThresholds::default();
        assert!(is_engaged(&fist_at((0.5, 0.5), 0.04), GraspMode::Fist, &t));
        // A pinch alone is not a fist.
        assert!(!is_engaged(&pinch_at((0.5, 0.5), 0.02), GraspMode::Fist, &t));
    }

    #[test]
    fn test_edges_fire_once_per_transition() {
        let mut tracker = GraspTracker::new(GraspMode::Pinch, GraspThresholds::default());
        let open = pinch_at((0.5, 0.5), 0.3);
        let closed = pinch_at((0.5, 0.5), 0.01);

        assert_eq!(tracker.update(Some(&open)), GraspEdge::Idle);
        assert_eq!(tracker.update(Some(&closed)), GraspEdge::Engaged);
        assert_eq!(tracker.update(Some(&closed)), GraspEdge::Holding);
        assert_eq!(tracker.update(Some(&closed)), GraspEdge::Holding);
        assert_eq!(tracker.update(Some(&open)), GraspEdge::Released);
        assert_eq!(tracker.update(Some(&open)), GraspEdge::Idle);
    }

    #[test]
    fn test_lost_hand_releases() {
        let mut tracker = GraspTracker::new(GraspMode::Pinch, GraspThresholds::default());
        let closed = pinch_at((0.5, 0.5), 0.01);
        tracker.update(Some(&closed));
        assert_eq!(tracker.update(None), GraspEdge::Released);
        assert!(!tracker.is_engaged());
        assert_eq!(tracker.update(None), GraspEdge::Idle);
    }

    #[test]
    fn test_centroid_follows_fingertips() {
        let hand = fist_at((0.3, 0.6), 0.04);
        let c = fingertip_centroid(&hand);
        assert!((c.x - 0.3).abs() < 1e-5);
        assert!((c.y - 0.6).abs() < 1e-5);
    }
}
