pub mod context;
pub mod controls;
pub mod presenter;
pub mod runner;

pub use context::EngineContext;
pub use controls::{forward_stdin, ChannelControls, ControlEvent, ControlSignals, ControlSurface};
pub use presenter::{LogPresenter, Presenter};
pub use runner::{Engine, FrameClock, LoopOutcome, StopReason};
