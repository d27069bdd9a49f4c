pub mod landmarks;
pub mod source;

pub use landmarks::{HandLandmark, HandObservation, Landmark, LandmarkFrame, LANDMARK_COUNT};
pub use source::{parse_frame_record, FrameSource, ReplaySource, ScriptedSource};
