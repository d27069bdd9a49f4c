use serde::{Deserialize, Serialize};

use crate::tracking::{HandLandmark, HandObservation};

use super::classifier::FingerStateVector;

/// Geometry band for the wrist-circle pose: fingertips bunched together and
/// held at a moderate distance from the wrist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleThresholds {
    pub max_mean_tip_gap: f32,
    pub min_wrist_reach: f32,
    pub max_wrist_reach: f32,
}

impl Default for CircleThresholds {
    fn default() -> Self {
        Self {
            max_mean_tip_gap: 0.05,
            min_wrist_reach: 0.10,
            max_wrist_reach: 0.30,
        }
    }
}

/// Gestures the exercises ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    CloseOnlyThumb,
    CloseIndexThumb,
    CloseAllFingers,
    CloseThumbIndexMiddle,
    WristCircle,
    OpenOnlyThumb,
}

impl Gesture {
    /// Stable identifier, independent of display language.
    pub fn id(&self) -> &'static str {
        match self {
            Self::CloseOnlyThumb => "close_only_thumb",
            Self::CloseIndexThumb => "close_index_thumb",
            Self::CloseAllFingers => "close_all_fingers",
            Self::CloseThumbIndexMiddle => "close_thumb_index_middle",
            Self::WristCircle => "wrist_circle",
            Self::OpenOnlyThumb => "open_only_thumb",
        }
    }

    /// Key into the external localization table.
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::CloseOnlyThumb => "game4_ex_close_only_thumb",
            Self::CloseIndexThumb => "game4_ex_close_index_thumb",
            Self::CloseAllFingers => "game4_ex_close_all_fingers",
            Self::CloseThumbIndexMiddle => "game4_ex_close_thumb_index_middle",
            Self::WristCircle => "game4_ex_wrist_circle",
            Self::OpenOnlyThumb => "game4_ex_open_only_thumb",
        }
    }

    /// Finger pattern (thumb..pinky) for the pose-only gestures.
    pub fn finger_pattern(&self) -> Option<FingerStateVector> {
        let open = match self {
            Self::CloseOnlyThumb => [false, true, true, true, true],
            Self::CloseIndexThumb => [false, false, true, true, true],
            Self::CloseAllFingers => [false; 5],
            Self::CloseThumbIndexMiddle => [false, false, false, true, true],
            Self::OpenOnlyThumb => [true, false, false, false, false],
            Self::WristCircle => return None,
        };
        Some(FingerStateVector::from_open(open))
    }
}

#[derive(Debug, Clone)]
pub enum DetectorRule {
    /// Exact match of the finger state vector.
    Fingers(FingerStateVector),
    /// Raw-landmark geometry test.
    Circle(CircleThresholds),
}

#[derive(Debug, Clone)]
pub struct GestureDetector {
    pub gesture: Gesture,
    pub rule: DetectorRule,
}

impl GestureDetector {
    /// Detector for `gesture` using its default rule.
    pub fn for_gesture(gesture: Gesture, circle: &CircleThresholds) -> Self {
        let rule = match gesture.finger_pattern() {
            Some(pattern) => DetectorRule::Fingers(pattern),
            None => DetectorRule::Circle(circle.clone()),
        };
        Self { gesture, rule }
    }

    pub fn matches(&self, states: &FingerStateVector, hand: &HandObservation) -> bool {
        match &self.rule {
            DetectorRule::Fingers(pattern) => pattern == states,
            DetectorRule::Circle(thresholds) => is_wrist_circle(hand, thresholds),
        }
    }
}

fn is_wrist_circle(hand: &HandObservation, thresholds: &CircleThresholds) -> bool {
    let tips = [
        HandLandmark::IndexTip,
        HandLandmark::MiddleTip,
        HandLandmark::RingTip,
        HandLandmark::PinkyTip,
    ];

    let mean_gap = tips
        .windows(2)
        .map(|pair| hand.distance(pair[0], pair[1]))
        .sum::<f32>()
        / (tips.len() - 1) as f32;

    let mean_reach = tips
        .iter()
        .map(|tip| hand.distance(HandLandmark::Wrist, *tip))
        .sum::<f32>()
        / tips.len() as f32;

    mean_gap < thresholds.max_mean_tip_gap
        && mean_reach > thresholds.min_wrist_reach
        && mean_reach < thresholds.max_wrist_reach
}

/// Ordered detector list. The first detector that matches wins, so
/// registration order is the priority order.
#[derive(Debug, Clone, Default)]
pub struct GestureRegistry {
    detectors: Vec<GestureDetector>,
}

impl GestureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The instruction catalogue in its fixed priority order.
    pub fn standard(circle: &CircleThresholds) -> Self {
        let mut registry = Self::new();
        for gesture in [
            Gesture::CloseOnlyThumb,
            Gesture::CloseIndexThumb,
            Gesture::CloseAllFingers,
            Gesture::CloseThumbIndexMiddle,
            Gesture::WristCircle,
            Gesture::OpenOnlyThumb,
        ] {
            registry.register(GestureDetector::for_gesture(gesture, circle));
        }
        registry
    }

    pub fn register(&mut self, detector: GestureDetector) -> &mut Self {
        self.detectors.push(detector);
        self
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Active label for this hand, if any detector matches.
    pub fn first_match(&self, states: &FingerStateVector, hand: &HandObservation) -> Option<Gesture> {
        self.detectors
            .iter()
            .find(|d| d.matches(states, hand))
            .map(|d| d.gesture)
    }

    /// Evaluate one specific gesture regardless of priority.
    pub fn matches(&self, gesture: Gesture, states: &FingerStateVector, hand: &HandObservation) -> bool {
        self.detectors
            .iter()
            .filter(|d| d.gesture == gesture)
            .any(|d| d.matches(states, hand))
    }
}
