pub mod dispatcher;
pub mod reporter;

pub use dispatcher::{ReportingSettings, RetryPolicy, StatsDispatcher};
pub use reporter::{HttpReporter, JsonlReporter, LogReporter, Reporter, StatsReporter};
