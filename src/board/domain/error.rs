//! Error types for board domain validation and parsing.

use super::{CardId, ListId, PeriodKind, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating board domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// A remote identifier was empty after trimming.
    #[error("{0} identifier must not be empty")]
    EmptyIdentifier(&'static str),

    /// The requested status change is not permitted by the workflow.
    #[error("invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        /// Task whose transition was rejected.
        task_id: CardId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The deployment has no list configured for the status.
    #[error("status {0} is not available on this board")]
    StatusUnavailable(TaskStatus),

    /// Two workflow statuses were mapped onto the same remote list.
    #[error("list {0} is mapped to more than one status")]
    DuplicateListMapping(ListId),

    /// A period close was requested while the period is not open.
    #[error("{0} period is not open")]
    PeriodNotOpen(PeriodKind),

    /// A stored period record lacks the stamps its state requires.
    #[error("stored {0} period record has inconsistent timestamps")]
    MalformedPeriod(PeriodKind),
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing priorities from user input or label names.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Error returned while parsing period kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown period kind: {0}")]
pub struct ParsePeriodKindError(pub String);
