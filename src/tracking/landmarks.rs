//! Hand landmark data as produced by the external detector.
//!
//! Coordinates are normalized image coordinates: origin top-left, x to the
//! right, y downwards, both nominally in `0.0..=1.0`. Depth is optional and
//! is never used by the classifier.

use serde::{Deserialize, Serialize};

/// Number of landmarks in one hand observation.
pub const LANDMARK_COUNT: usize = 21;

/// The fixed landmark order of a hand observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl HandLandmark {
    /// Position of this landmark inside a [`HandObservation`] (0-20).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn fingertips() -> [HandLandmark; 5] {
        [
            Self::ThumbTip,
            Self::IndexTip,
            Self::MiddleTip,
            Self::RingTip,
            Self::PinkyTip,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Planar Euclidean distance; depth is ignored.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Flip horizontally, as a selfie preview does.
    pub fn mirrored(&self) -> Landmark {
        Landmark {
            x: 1.0 - self.x,
            ..*self
        }
    }
}

/// All 21 landmarks of one detected hand in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    landmarks: [Landmark; LANDMARK_COUNT],
}

impl HandObservation {
    /// Build an observation from detector output.
    ///
    /// Returns `None` for partial hands (wrong landmark count) or occluded
    /// points reported as NaN/inf; callers skip such hands for the frame.
    pub fn from_landmarks(points: &[Landmark]) -> Option<Self> {
        let landmarks: [Landmark; LANDMARK_COUNT] = points.try_into().ok()?;
        if !landmarks.iter().all(Landmark::is_finite) {
            return None;
        }
        Some(Self { landmarks })
    }

    pub fn get(&self, landmark: HandLandmark) -> Landmark {
        self.landmarks[landmark.index()]
    }

    pub fn distance(&self, a: HandLandmark, b: HandLandmark) -> f32 {
        self.get(a).distance(&self.get(b))
    }

    /// Mean position of the given landmarks.
    pub fn centroid(&self, points: &[HandLandmark]) -> Landmark {
        if points.is_empty() {
            return self.get(HandLandmark::Wrist);
        }
        let n = points.len() as f32;
        let (sx, sy, sz) = points.iter().fold((0.0, 0.0, 0.0), |acc, p| {
            let lm = self.get(*p);
            (acc.0 + lm.x, acc.1 + lm.y, acc.2 + lm.z)
        });
        Landmark {
            x: sx / n,
            y: sy / n,
            z: sz / n,
        }
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }
}

/// The detector output for a single camera frame.
///
/// Frames are consumed by the loop iteration that acquired them and are not
/// kept afterwards.
#[derive(Debug, Clone, Default)]
pub struct LandmarkFrame {
    pub hands: Vec<HandObservation>,
    /// Hands the source saw but could not turn into a full observation.
    pub dropped_hands: usize,
}

impl LandmarkFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_hands(hands: Vec<HandObservation>) -> Self {
        Self {
            hands,
            dropped_hands: 0,
        }
    }
}
