pub mod clock;
pub mod controller;
pub mod state;

pub use clock::{ClockMode, ClockStatus, RunClock};
pub use controller::{Session, SessionView};
pub use state::{PlayerProfile, ResultCode, SessionResult, SessionStatus};
