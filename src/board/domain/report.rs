//! Render-agnostic completion report.

use super::{CardId, PeriodKind, Priority, Task};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// One completed task in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Card identifier.
    pub id: CardId,
    /// Task title.
    pub title: String,
    /// Task priority.
    pub priority: Priority,
    /// Completion timestamp.
    pub completed_at: DateTime<Utc>,
}

impl ReportEntry {
    /// Builds an entry from a task that carries a completion timestamp.
    #[must_use]
    pub fn from_task(task: &Task) -> Option<Self> {
        task.completed_at().map(|completed_at| Self {
            id: task.id().clone(),
            title: task.title().to_owned(),
            priority: task.priority(),
            completed_at,
        })
    }
}

/// Number of completed tasks per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    /// High-priority completions.
    pub high: usize,
    /// Medium-priority completions.
    pub medium: usize,
    /// Low-priority completions.
    pub low: usize,
}

impl PriorityCounts {
    /// Counts entries by priority.
    #[must_use]
    pub fn tally(entries: &[ReportEntry]) -> Self {
        entries
            .iter()
            .fold(Self::default(), |mut counts, entry| {
                match entry.priority {
                    Priority::High => counts.high += 1,
                    Priority::Medium => counts.medium += 1,
                    Priority::Low => counts.low += 1,
                }
                counts
            })
    }

    /// Returns the count for one priority.
    #[must_use]
    pub const fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    /// Returns the total across priorities.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Report contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportBody {
    /// No task was completed inside the window.
    Empty,
    /// At least one task was completed inside the window.
    Completed {
        /// Completions per priority.
        counts: PriorityCounts,
        /// Completed tasks, high priority first, then by completion time.
        entries: Vec<ReportEntry>,
    },
}

/// Summary of the tasks completed during a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    kind: PeriodKind,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    body: ReportBody,
}

impl CompletionReport {
    /// Assembles a report from completed tasks.
    ///
    /// Entries are ordered by priority, then completion time; ties keep the
    /// order in which `tasks` yields them.
    #[must_use]
    pub fn from_completed<'a>(
        kind: PeriodKind,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        tasks: impl IntoIterator<Item = &'a Task>,
    ) -> Self {
        let mut entries: Vec<ReportEntry> =
            tasks.into_iter().filter_map(ReportEntry::from_task).collect();
        entries.sort_by(|left, right| {
            left.priority
                .cmp(&right.priority)
                .then(left.completed_at.cmp(&right.completed_at))
        });

        let body = if entries.is_empty() {
            ReportBody::Empty
        } else {
            ReportBody::Completed {
                counts: PriorityCounts::tally(&entries),
                entries,
            }
        };
        Self {
            kind,
            start,
            end,
            body,
        }
    }

    /// Returns the period kind the report covers.
    #[must_use]
    pub const fn kind(&self) -> PeriodKind {
        self.kind
    }

    /// Returns the start of the window.
    #[must_use]
    pub const fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    /// Returns the end of the window.
    #[must_use]
    pub const fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    /// Returns the report body.
    #[must_use]
    pub const fn body(&self) -> &ReportBody {
        &self.body
    }

    /// Returns `true` when no task qualified.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.body, ReportBody::Empty)
    }

    /// Returns the completed entries; empty for an empty report.
    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        match &self.body {
            ReportBody::Empty => &[],
            ReportBody::Completed { entries, .. } => entries,
        }
    }

    /// Returns completions per priority.
    #[must_use]
    pub fn counts(&self) -> PriorityCounts {
        match &self.body {
            ReportBody::Empty => PriorityCounts::default(),
            ReportBody::Completed { counts, .. } => *counts,
        }
    }
}
