//! Pending chat interaction values.

use crate::board::domain::{BoardDomainError, CardId, ParsePriorityError, Priority, TaskStatus};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Chat conversation identifier assigned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(i64);

impl ChatId {
    /// Wraps a transport chat id.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw chat id.
    #[must_use]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl From<i64> for ChatId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the next message in a chat is expected to supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Awaiting {
    /// A task title.
    Title,
    /// A task description.
    Description,
    /// A priority word or priority label name.
    Priority,
    /// A card id picked from a task list.
    TaskSelection,
}

impl fmt::Display for Awaiting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Priority => "priority",
            Self::TaskSelection => "task selection",
        })
    }
}

/// Values collected so far for a multi-step command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingPayload {
    /// Collected task title.
    pub title: Option<String>,
    /// Collected task description.
    pub description: Option<String>,
    /// Collected priority.
    pub priority: Option<Priority>,
    /// Selected card.
    pub task_id: Option<CardId>,
    /// Status the selected card should move to.
    pub target: Option<TaskStatus>,
}

impl PendingPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the target status for a task selection.
    #[must_use]
    pub const fn with_target(mut self, target: TaskStatus) -> Self {
        self.target = Some(target);
        self
    }

    /// Merges `input` into the payload according to `awaiting`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] when the input cannot be parsed; the payload is
    /// left untouched.
    pub fn merge(&mut self, awaiting: Awaiting, input: &str) -> Result<(), InputError> {
        let text = input.trim();
        match awaiting {
            Awaiting::Title => self.title = Some(text.to_owned()),
            Awaiting::Description => self.description = Some(text.to_owned()),
            Awaiting::Priority => self.priority = Some(Priority::try_from(text)?),
            Awaiting::TaskSelection => self.task_id = Some(CardId::new(text)?),
        }
        Ok(())
    }
}

/// Input that does not fit what the session awaits.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    /// The input is not a priority.
    #[error(transparent)]
    Priority(#[from] ParsePriorityError),

    /// The input is not a card id.
    #[error(transparent)]
    TaskId(#[from] BoardDomainError),
}

/// A command waiting for the next message in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    /// Chat the entry belongs to.
    pub chat_id: ChatId,
    /// What the next message should supply.
    pub awaiting: Awaiting,
    /// Values collected so far.
    pub payload: PendingPayload,
    /// Moment from which the entry counts as absent.
    pub expires_at: DateTime<Utc>,
}

impl PendingEntry {
    /// Returns `true` once `now` has reached the expiry time.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
