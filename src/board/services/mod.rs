//! Application services for the board mirror.

mod lifecycle;
mod periods;
mod report;
mod retry;

pub use lifecycle::{
    AdvanceTaskRequest, CreateTaskRequest, PLACEHOLDER_TITLE, TaskLifecycleError,
    TaskLifecycleResult, TaskLifecycleService,
};
pub use periods::{ClosedPeriod, PeriodTracker, PeriodTrackerError, PeriodTrackerResult};
pub use report::ReportGenerator;
pub use retry::RetryPolicy;
