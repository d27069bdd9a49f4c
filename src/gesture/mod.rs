pub mod classifier;
pub mod grasp;
pub mod matcher;

pub use classifier::{classify, ClassifierThresholds, Finger, FingerState, FingerStateVector};
pub use grasp::{fingertip_centroid, GraspEdge, GraspMode, GraspThresholds, GraspTracker};
pub use matcher::{CircleThresholds, Gesture, GestureDetector, GestureRegistry};

use crate::tracking::{HandObservation, LandmarkFrame};

/// One hand after per-frame classification.
#[derive(Debug, Clone)]
pub struct HandReading {
    pub observation: HandObservation,
    pub fingers: FingerStateVector,
    /// Highest-priority matching instruction, if any.
    pub gesture: Option<Gesture>,
}

/// Stateless frame classifier: finger states plus first-match gesture label
/// for every hand in the frame.
#[derive(Debug, Clone)]
pub struct Perception {
    thresholds: ClassifierThresholds,
    registry: GestureRegistry,
}

impl Perception {
    pub fn new(thresholds: ClassifierThresholds, registry: GestureRegistry) -> Self {
        Self {
            thresholds,
            registry,
        }
    }

    pub fn read(&self, frame: LandmarkFrame) -> Vec<HandReading> {
        frame
            .hands
            .into_iter()
            .map(|observation| {
                let fingers = classify(&observation, &self.thresholds);
                let gesture = self.registry.first_match(&fingers, &observation);
                HandReading {
                    observation,
                    fingers,
                    gesture,
                }
            })
            .collect()
    }
}
