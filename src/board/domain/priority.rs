//! Task priority and priority-label resolution.

use super::ParsePriorityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task priority.
///
/// Variants are declared in severity order, so the derived `Ord` sorts
/// `High` before `Medium` before `Low`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Most urgent work.
    High,
    /// Default priority for unlabelled cards.
    #[default]
    Medium,
    /// Work that can wait.
    Low,
}

impl Priority {
    /// All priorities, most severe first.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Returns the board label name carrying this priority.
    #[must_use]
    pub const fn label_name(self) -> &'static str {
        match self {
            Self::High => "High Priority",
            Self::Medium => "Medium Priority",
            Self::Low => "Low Priority",
        }
    }

    /// Matches a board label name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_label(name: &str) -> Option<Self> {
        let normalized = name.trim();
        Self::ALL
            .into_iter()
            .find(|priority| priority.label_name().eq_ignore_ascii_case(normalized))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    /// Accepts the storage form (`high`) or the label form (`High Priority`).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Self::from_label(&normalized).ok_or_else(|| ParsePriorityError(value.to_owned())),
        }
    }
}

/// Maps a set of card label names onto a priority.
///
/// Unmatched or empty input yields [`Priority::Medium`]. When several
/// priority labels are present the most severe one wins.
#[must_use]
pub fn resolve_priority_label<I, S>(label_names: I) -> Priority
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    label_names
        .into_iter()
        .filter_map(|name| Priority::from_label(name.as_ref()))
        .min()
        .unwrap_or_default()
}
