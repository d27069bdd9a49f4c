use serde::{Deserialize, Serialize};

use crate::tracking::{HandLandmark, HandObservation};

/// Distance thresholds for open/closed classification, in normalized
/// image units. They depend on camera field of view and resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Minimum tip-to-DIP distance for index..pinky to count as open.
    pub finger_open_distance: f32,
    /// Minimum thumb tip-to-IP distance for the thumb to count as open.
    pub thumb_open_distance: f32,
    /// Thumb tip closer than this to the middle MCP is tucked (closed).
    pub thumb_tuck_distance: f32,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            finger_open_distance: 0.04,
            thumb_open_distance: 0.05,
            thumb_tuck_distance: 0.06,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn tip(self) -> HandLandmark {
        match self {
            Finger::Thumb => HandLandmark::ThumbTip,
            Finger::Index => HandLandmark::IndexTip,
            Finger::Middle => HandLandmark::MiddleTip,
            Finger::Ring => HandLandmark::RingTip,
            Finger::Pinky => HandLandmark::PinkyTip,
        }
    }

    /// The joint just below the tip (IP for the thumb).
    pub fn dip(self) -> HandLandmark {
        match self {
            Finger::Thumb => HandLandmark::ThumbIp,
            Finger::Index => HandLandmark::IndexDip,
            Finger::Middle => HandLandmark::MiddleDip,
            Finger::Ring => HandLandmark::RingDip,
            Finger::Pinky => HandLandmark::PinkyDip,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerState {
    Open,
    Closed,
}

/// Which way the fingers point in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandOrientation {
    Up,
    Down,
}

/// Open/closed state of all five fingers for one hand in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FingerStateVector {
    states: [FingerState; 5],
}

impl FingerStateVector {
    /// Build from open flags in thumb..pinky order.
    pub fn from_open(open: [bool; 5]) -> Self {
        Self {
            states: open.map(|o| if o { FingerState::Open } else { FingerState::Closed }),
        }
    }

    pub fn get(&self, finger: Finger) -> FingerState {
        self.states[finger as usize]
    }

    pub fn is_open(&self, finger: Finger) -> bool {
        self.get(finger) == FingerState::Open
    }

    pub fn open_count(&self) -> usize {
        self.states.iter().filter(|s| **s == FingerState::Open).count()
    }
}

pub fn orientation(hand: &HandObservation) -> HandOrientation {
    if hand.get(HandLandmark::MiddleTip).y < hand.get(HandLandmark::Wrist).y {
        HandOrientation::Up
    } else {
        HandOrientation::Down
    }
}

/// Classify every finger of one hand. Stateless; call once per frame.
pub fn classify(hand: &HandObservation, thresholds: &ClassifierThresholds) -> FingerStateVector {
    let orientation = orientation(hand);

    let mut open = [false; 5];
    for finger in Finger::ALL {
        let tip = hand.get(finger.tip());
        let dip = hand.get(finger.dip());
        let distance = tip.distance(&dip);

        open[finger as usize] = match finger {
            // The thumb abducts sideways, so the vertical test does not apply.
            Finger::Thumb => {
                let to_palm = hand.distance(HandLandmark::ThumbTip, HandLandmark::MiddleMcp);
                to_palm >= thresholds.thumb_tuck_distance
                    && distance > thresholds.thumb_open_distance
            }
            _ => {
                let dy = tip.y - dip.y;
                let extended = match orientation {
                    HandOrientation::Up => dy < 0.0,
                    HandOrientation::Down => dy > 0.0,
                };
                distance > thresholds.finger_open_distance && extended
            }
        };
    }

    FingerStateVector::from_open(open)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_zero_tip_dip_distance_is_all_closed() {
        // Every landmark on the same point: nothing is extended.
        let hand = hand_from(|_| {});
        let states = classify(&hand, &ClassifierThresholds::default());
        for finger in Finger::ALL {
            assert_eq!(states.get(finger), FingerState::Closed, "{}", finger.as_str());
        }
    }

    #[test]
    fn test_fully_extended_hand_is_all_open() {
        let hand = upright_hand([true; 5]);
        let states = classify(&hand, &ClassifierThresholds::default());
        assert_eq!(states.open_count(), 5, "{states:?}");
    }

    #[test]
    fn test_fist_is_all_closed() {
        let hand = upright_hand([false; 5]);
        let states = classify(&hand, &ClassifierThresholds::default());
        assert_eq!(states.open_count(), 0, "{states:?}");
    }

    #[test]
    fn test_orientation_follows_middle_tip() {
        let up = upright_hand([true; 5]);
        assert_eq!(orientation(&up), HandOrientation::Up);

        let down = hand_from(|p| {
            set(p, HandLandmark::Wrist, 0.5, 0.2);
            set(p, HandLandmark::MiddleTip, 0.5, 0.7);
        });
        assert_eq!(orientation(&down), HandOrientation::Down);
    }

    #[test]
    fn test_downward_hand_extends_towards_bottom() {
        let hand = hand_from(|p| {
            set(p, HandLandmark::Wrist, 0.5, 0.1);
            set(p, HandLandmark::IndexDip, 0.42, 0.60);
            set(p, HandLandmark::IndexTip, 0.42, 0.70);
            set(p, HandLandmark::MiddleDip, 0.50, 0.60);
            set(p, HandLandmark::MiddleTip, 0.50, 0.70);
        });
        let states = classify(&hand, &ClassifierThresholds::default());
        assert!(states.is_open(Finger::Index));
        assert!(states.is_open(Finger::Middle));
        assert!(!states.is_open(Finger::Ring));
    }

    #[test]
    fn test_tucked_thumb_is_closed_even_when_stretched() {
        let hand = hand_from(|p| {
            set(p, HandLandmark::MiddleMcp, 0.50, 0.60);
            set(p, HandLandmark::ThumbIp, 0.40, 0.60);
            // Far from its IP joint but resting on the palm.
            set(p, HandLandmark::ThumbTip, 0.48, 0.61);
        });
        let states = classify(&hand, &ClassifierThresholds::default());
        assert!(!states.is_open(Finger::Thumb));
    }

    #[test]
    fn test_thresholds_are_overridable() {
        let hand = upright_hand([true; 5]);
        let strict = ClassifierThresholds {
            finger_open_distance: 0.5,
            thumb_open_distance: 0.5,
            thumb_tuck_distance: 0.06,
        };
        assert_eq!(classify(&hand, &strict).open_count(), 0);
    }
}
