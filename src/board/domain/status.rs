//! Workflow statuses and their mapping onto remote lists.

use super::{BoardDomainError, ListId, ParseTaskStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been created but work has not started.
    Todo,
    /// Task is being worked on.
    Doing,
    /// Task is awaiting review. Only available when a review list is mapped.
    UnderReview,
    /// Task has been completed.
    Done,
}

impl TaskStatus {
    /// All statuses in workflow order.
    pub const ALL: [Self; 4] = [Self::Todo, Self::Doing, Self::UnderReview, Self::Done];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Doing => "doing",
            Self::UnderReview => "under_review",
            Self::Done => "done",
        }
    }

    /// Returns `true` when the workflow permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Todo, Self::Doing)
                | (Self::Doing, Self::UnderReview | Self::Done)
                | (Self::UnderReview, Self::Done)
        )
    }

    /// Returns `true` when no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "todo" => Ok(Self::Todo),
            "doing" => Ok(Self::Doing),
            "under_review" | "review" => Ok(Self::UnderReview),
            "done" => Ok(Self::Done),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Bidirectional mapping between workflow statuses and remote lists.
///
/// The review list is optional; without it [`TaskStatus::UnderReview`] is
/// unavailable. Every mapped list is distinct, so a list resolves to at most
/// one status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusListMap {
    todo: ListId,
    doing: ListId,
    under_review: Option<ListId>,
    done: ListId,
}

impl StatusListMap {
    /// Creates a mapping without a review list.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::DuplicateListMapping`] when two statuses
    /// share a list.
    pub fn new(todo: ListId, doing: ListId, done: ListId) -> Result<Self, BoardDomainError> {
        let map = Self {
            todo,
            doing,
            under_review: None,
            done,
        };
        map.ensure_distinct()?;
        Ok(map)
    }

    /// Adds a review list to the mapping.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::DuplicateListMapping`] when the list is
    /// already mapped to another status.
    pub fn with_under_review(mut self, list: ListId) -> Result<Self, BoardDomainError> {
        self.under_review = Some(list);
        self.ensure_distinct()?;
        Ok(self)
    }

    /// Returns the list holding newly created tasks.
    #[must_use]
    pub const fn todo(&self) -> &ListId {
        &self.todo
    }

    /// Returns the list for a status, or `None` when the status is not
    /// available on this board.
    #[must_use]
    pub const fn list_for(&self, status: TaskStatus) -> Option<&ListId> {
        match status {
            TaskStatus::Todo => Some(&self.todo),
            TaskStatus::Doing => Some(&self.doing),
            TaskStatus::UnderReview => self.under_review.as_ref(),
            TaskStatus::Done => Some(&self.done),
        }
    }

    /// Returns the status represented by a list, if the list is mapped.
    #[must_use]
    pub fn status_for(&self, list: &ListId) -> Option<TaskStatus> {
        self.lists()
            .find(|(_, mapped)| *mapped == list)
            .map(|(status, _)| status)
    }

    /// Returns `true` when the status has a list on this board.
    #[must_use]
    pub const fn is_available(&self, status: TaskStatus) -> bool {
        self.list_for(status).is_some()
    }

    /// Iterates over the mapped statuses and their lists in workflow order.
    pub fn lists(&self) -> impl Iterator<Item = (TaskStatus, &ListId)> + '_ {
        TaskStatus::ALL
            .into_iter()
            .filter_map(|status| self.list_for(status).map(|list| (status, list)))
    }

    fn ensure_distinct(&self) -> Result<(), BoardDomainError> {
        let mapped: Vec<&ListId> = self.lists().map(|(_, list)| list).collect();
        for (position, list) in mapped.iter().enumerate() {
            if mapped.iter().skip(position + 1).any(|other| other == list) {
                return Err(BoardDomainError::DuplicateListMapping((*list).clone()));
            }
        }
        Ok(())
    }
}
