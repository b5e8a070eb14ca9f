//! Day and week work periods.

use super::{BoardDomainError, ParsePeriodKindError};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of tracked work period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    /// A working day.
    Day,
    /// A working week.
    Week,
}

impl PeriodKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PeriodKind {
    type Error = ParsePeriodKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(ParsePeriodKindError(value.to_owned())),
        }
    }
}

/// Open/closed state of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodState {
    /// No session is running.
    Closed,
    /// A session is running.
    Open,
}

/// Tracked work period.
///
/// Timestamps carry the offset of the configured timezone at the moment they
/// were taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedPeriodData")]
pub struct Period {
    kind: PeriodKind,
    state: PeriodState,
    opened_at: Option<DateTime<FixedOffset>>,
    closed_at: Option<DateTime<FixedOffset>>,
}

/// Period fields as stored, before their stamps are checked.
#[derive(Debug, Deserialize)]
struct PersistedPeriodData {
    kind: PeriodKind,
    state: PeriodState,
    #[serde(default)]
    opened_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    closed_at: Option<DateTime<FixedOffset>>,
}

impl TryFrom<PersistedPeriodData> for Period {
    type Error = BoardDomainError;

    fn try_from(data: PersistedPeriodData) -> Result<Self, Self::Error> {
        match (data.state, data.opened_at, data.closed_at) {
            (PeriodState::Open, Some(opened), _) => Ok(Self::open(data.kind, opened)),
            (PeriodState::Closed, Some(opened), Some(closed)) if opened <= closed => Ok(Self {
                kind: data.kind,
                state: PeriodState::Closed,
                opened_at: Some(opened),
                closed_at: Some(closed),
            }),
            _ => Err(BoardDomainError::MalformedPeriod(data.kind)),
        }
    }
}

impl Period {
    /// Starts a new open period.
    #[must_use]
    pub const fn open(kind: PeriodKind, now: DateTime<FixedOffset>) -> Self {
        Self {
            kind,
            state: PeriodState::Open,
            opened_at: Some(now),
            closed_at: None,
        }
    }

    /// Returns the period kind.
    #[must_use]
    pub const fn kind(&self) -> PeriodKind {
        self.kind
    }

    /// Returns the period state.
    #[must_use]
    pub const fn state(&self) -> PeriodState {
        self.state
    }

    /// Returns `true` while the period is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, PeriodState::Open)
    }

    /// Returns when the period was opened.
    #[must_use]
    pub const fn opened_at(&self) -> Option<DateTime<FixedOffset>> {
        self.opened_at
    }

    /// Returns when the period was closed.
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<FixedOffset>> {
        self.closed_at
    }

    /// Returns the `[opened_at, closed_at]` window of a closed period.
    #[must_use]
    pub fn window(&self) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        match (self.state, self.opened_at, self.closed_at) {
            (PeriodState::Closed, Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Closes an open period at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::PeriodNotOpen`] when the period is closed.
    pub fn close(&mut self, now: DateTime<FixedOffset>) -> Result<(), BoardDomainError> {
        if !self.is_open() {
            return Err(BoardDomainError::PeriodNotOpen(self.kind));
        }
        self.state = PeriodState::Closed;
        self.closed_at = Some(now);
        Ok(())
    }
}
