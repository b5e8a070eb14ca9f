//! Domain model for the board mirror.
//!
//! Tasks, periods, and reports are plain values. Timestamps are passed in by
//! callers, so nothing in this module reads a clock or touches I/O.

mod error;
mod ids;
mod period;
mod priority;
mod report;
mod status;
mod task;

pub use error::{
    BoardDomainError, ParsePeriodKindError, ParsePriorityError, ParseTaskStatusError,
};
pub use ids::{CardId, LabelId, ListId, MemberId};
pub use period::{Period, PeriodKind, PeriodState};
pub use priority::{Priority, resolve_priority_label};
pub use report::{CompletionReport, PriorityCounts, ReportBody, ReportEntry};
pub use status::{StatusListMap, TaskStatus};
pub use task::{PersistedTaskData, Task, TaskDraft};
