//! Task aggregate mirrored from a remote card.

use super::{BoardDomainError, CardId, ListId, MemberId, Priority, StatusListMap, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Locally cached mirror of a remote card.
///
/// `status` and `list_id` always change together, and `completed_at` is
/// present only while the task is [`TaskStatus::Done`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PersistedTaskData")]
pub struct Task {
    id: CardId,
    title: String,
    description: String,
    priority: Priority,
    status: TaskStatus,
    list_id: ListId,
    assignees: BTreeSet<MemberId>,
    completed_at: Option<DateTime<Utc>>,
    url: Option<String>,
}

/// Fields of a card the remote board has just created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Card identifier assigned by the board.
    pub id: CardId,
    /// Card title.
    pub title: String,
    /// Card description, possibly empty.
    pub description: String,
    /// Priority resolved from the labels attached to the card.
    pub priority: Priority,
    /// Card permalink.
    pub url: Option<String>,
}

/// Parameter object for rebuilding a task from storage or a board snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistedTaskData {
    /// Card identifier.
    pub id: CardId,
    /// Card title.
    pub title: String,
    /// Card description.
    #[serde(default)]
    pub description: String,
    /// Task priority.
    #[serde(default)]
    pub priority: Priority,
    /// Workflow status.
    pub status: TaskStatus,
    /// List the card sits in.
    pub list_id: ListId,
    /// Card members.
    #[serde(default)]
    pub assignees: BTreeSet<MemberId>,
    /// Completion timestamp; discarded unless `status` is done.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Card permalink.
    #[serde(default)]
    pub url: Option<String>,
}

impl From<PersistedTaskData> for Task {
    fn from(data: PersistedTaskData) -> Self {
        Self::from_persisted(data)
    }
}

impl Task {
    /// Builds the record for a card just created in the TODO list.
    ///
    /// The configured user is recorded as the sole assignee.
    #[must_use]
    pub fn from_created(draft: TaskDraft, lists: &StatusListMap, assignee: MemberId) -> Self {
        Self {
            id: draft.id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            status: TaskStatus::Todo,
            list_id: lists.todo().clone(),
            assignees: BTreeSet::from([assignee]),
            completed_at: None,
            url: draft.url,
        }
    }

    /// Reconstructs a task from persisted or fetched data.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        let completed_at = data.completed_at.filter(|_| data.status == TaskStatus::Done);
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            priority: data.priority,
            status: data.status,
            list_id: data.list_id,
            assignees: data.assignees,
            completed_at,
            url: data.url,
        }
    }

    /// Returns the card identifier.
    #[must_use]
    pub const fn id(&self) -> &CardId {
        &self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the task priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the list the card sits in.
    #[must_use]
    pub const fn list_id(&self) -> &ListId {
        &self.list_id
    }

    /// Returns the card members.
    #[must_use]
    pub const fn assignees(&self) -> &BTreeSet<MemberId> {
        &self.assignees
    }

    /// Returns the completion timestamp, set only for done tasks.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the card permalink.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Moves the task to `target`, updating status and list together.
    ///
    /// Entering DOING adds `assignee`; entering DONE stamps `completed_at`
    /// with `now`. On error the task is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidTransition`] when the workflow
    /// forbids the move, or [`BoardDomainError::StatusUnavailable`] when the
    /// board has no list for `target`.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        lists: &StatusListMap,
        assignee: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<(), BoardDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(BoardDomainError::InvalidTransition {
                task_id: self.id.clone(),
                from: self.status,
                to: target,
            });
        }
        let list_id = lists
            .list_for(target)
            .ok_or(BoardDomainError::StatusUnavailable(target))?;

        self.status = target;
        self.list_id = list_id.clone();
        self.completed_at = (target == TaskStatus::Done).then_some(now);
        if target == TaskStatus::Doing {
            self.assignees.insert(assignee.clone());
        }
        Ok(())
    }
}
