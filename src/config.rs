//! Deployment configuration read from `config.json`.

use crate::board::domain::{BoardDomainError, ListId, MemberId, StatusListMap};
use crate::board::services::RetryPolicy;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use chrono::TimeDelta;
use chrono_tz::Tz;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CACHE_PATH: &str = "TrelloTasks.json";
const DEFAULT_SESSION_TTL_SECS: u64 = 600;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: Arc<std::io::Error>,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid config JSON: {0}")]
    Parse(String),

    /// A required value is missing or blank.
    #[error("config value `{0}` is required")]
    Missing(&'static str),

    /// The timezone name is unknown.
    #[error("unknown timezone `{0}`")]
    InvalidTimezone(String),

    /// The list or member ids are unusable.
    #[error(transparent)]
    Board(#[from] BoardDomainError),
}

/// Trello credentials and board layout.
#[derive(Debug, Clone, Deserialize)]
pub struct TrelloSection {
    /// API key.
    pub api_key: String,
    /// User token.
    pub token: String,
    /// List holding TODO cards.
    pub todo_list_id: String,
    /// List holding DOING cards.
    pub doing_list_id: String,
    /// List holding cards under review; blank or absent disables review.
    #[serde(default)]
    pub under_review_list_id: Option<String>,
    /// List holding DONE cards.
    pub done_list_id: String,
    /// The single user's member id.
    pub my_member_id: String,
    /// Board id for label lookups; discovered when absent.
    #[serde(default)]
    pub board_id: Option<String>,
    /// REST endpoint override.
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Optional title inference settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiSection {
    /// API key; inference is disabled without one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name.
    #[serde(default)]
    pub model: Option<String>,
}

/// Retry settings for remote board calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Total calls, including the first.
    pub max_attempts: u32,
    /// Wait after the first failure, in milliseconds.
    pub base_delay_ms: u64,
    /// Extra wait added after each further failure, in milliseconds.
    pub delay_increment_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
            delay_increment_ms: 250,
        }
    }
}

/// Top-level configuration document.
///
/// Unknown sections, such as the chat transport's, are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Trello settings.
    pub trello: TrelloSection,
    /// Title inference settings.
    #[serde(default)]
    pub gemini: GeminiSection,
    /// IANA timezone for period stamps.
    pub timezone: String,
    /// Cache file location, relative to the working directory.
    #[serde(default = "default_cache_path")]
    pub cache_path: Utf8PathBuf,
    /// Pending command lifetime in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Retry settings.
    #[serde(default)]
    pub retry: RetrySection,
}

fn default_cache_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_CACHE_PATH)
}

const fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn required(value: &str, name: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(())
}

impl BoardConfig {
    /// Reads and validates the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let read_error = |source: std::io::Error| ConfigError::Read {
            path: path.to_owned(),
            source: Arc::new(source),
        };
        let file_name = path
            .file_name()
            .ok_or_else(|| read_error(std::io::Error::other("path has no file name")))?;
        let parent = path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
        let raw = dir.read_to_string(file_name).map_err(read_error)?;
        Self::from_json(&raw)
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the JSON is malformed or a value is
    /// invalid.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        required(&self.trello.api_key, "trello.api_key")?;
        required(&self.trello.token, "trello.token")?;
        required(&self.trello.todo_list_id, "trello.todo_list_id")?;
        required(&self.trello.doing_list_id, "trello.doing_list_id")?;
        required(&self.trello.done_list_id, "trello.done_list_id")?;
        required(&self.trello.my_member_id, "trello.my_member_id")?;
        self.status_lists()?;
        self.timezone()?;
        Ok(())
    }

    /// Builds the status-to-list mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Board`] when an id is blank or two statuses
    /// share a list.
    pub fn status_lists(&self) -> Result<StatusListMap, ConfigError> {
        let lists = StatusListMap::new(
            ListId::new(self.trello.todo_list_id.as_str())?,
            ListId::new(self.trello.doing_list_id.as_str())?,
            ListId::new(self.trello.done_list_id.as_str())?,
        )?;
        let Some(review) = self
            .trello
            .under_review_list_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
        else {
            return Ok(lists);
        };
        Ok(lists.with_under_review(ListId::new(review)?)?)
    }

    /// Returns the configured user's member id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Board`] when the id is blank.
    pub fn member_id(&self) -> Result<MemberId, ConfigError> {
        Ok(MemberId::new(self.trello.my_member_id.as_str())?)
    }

    /// Returns the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimezone`] for unknown names.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Returns the retry policy for remote board calls.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
            Duration::from_millis(self.retry.delay_increment_ms),
        )
    }

    /// Returns the pending command lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> TimeDelta {
        i64::try_from(self.session_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Returns the Gemini API key when title inference is enabled.
    #[must_use]
    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardConfig, ConfigError};
    use crate::board::domain::{BoardDomainError, TaskStatus};
    use chrono::TimeDelta;
    use eyre::Result;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn document() -> Value {
        json!({
            "telegram": { "bot_token": "ignored" },
            "trello": {
                "api_key": "key",
                "token": "token",
                "todo_list_id": "list-todo",
                "doing_list_id": "list-doing",
                "under_review_list_id": "",
                "done_list_id": "list-done",
                "my_member_id": "member-me"
            },
            "gemini": { "api_key": "" },
            "timezone": "Europe/Berlin"
        })
    }

    fn document_with(pointer: &str, value: Value) -> String {
        let mut raw = document();
        if let Some(slot) = raw.pointer_mut(pointer) {
            *slot = value;
        }
        raw.to_string()
    }

    #[rstest]
    fn applies_defaults_and_ignores_unknown_sections() -> Result<()> {
        let config = BoardConfig::from_json(&document().to_string())?;
        assert_eq!(config.cache_path.as_str(), "TrelloTasks.json");
        assert_eq!(config.session_ttl(), TimeDelta::minutes(10));
        assert_eq!(config.retry_policy().max_attempts(), 3);
        assert_eq!(config.gemini_api_key(), None);
        assert!(!config.status_lists()?.is_available(TaskStatus::UnderReview));
        Ok(())
    }

    #[rstest]
    fn review_list_enables_review() -> Result<()> {
        let raw = document_with("/trello/under_review_list_id", json!("list-review"));
        let config = BoardConfig::from_json(&raw)?;
        assert!(config.status_lists()?.is_available(TaskStatus::UnderReview));
        Ok(())
    }

    #[rstest]
    fn rejects_unknown_timezone() {
        let raw = document_with("/timezone", json!("Mars/Olympus"));
        assert!(matches!(
            BoardConfig::from_json(&raw),
            Err(ConfigError::InvalidTimezone(name)) if name == "Mars/Olympus"
        ));
    }

    #[rstest]
    #[case("todo_list_id", "trello.todo_list_id")]
    #[case("my_member_id", "trello.my_member_id")]
    fn rejects_blank_required_ids(#[case] field: &str, #[case] expected: &str) {
        let raw = document_with(&format!("/trello/{field}"), json!("  "));
        assert!(matches!(
            BoardConfig::from_json(&raw),
            Err(ConfigError::Missing(name)) if name == expected
        ));
    }

    #[rstest]
    fn rejects_shared_lists() {
        let raw = document_with("/trello/done_list_id", json!("list-doing"));
        assert!(matches!(
            BoardConfig::from_json(&raw),
            Err(ConfigError::Board(BoardDomainError::DuplicateListMapping(_)))
        ));
    }
}
