//! Title inference port.

use async_trait::async_trait;
use thiserror::Error;

/// Suggests a short task title from free text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TitleInference: Send + Sync {
    /// Returns a title for `text`.
    ///
    /// # Errors
    ///
    /// Returns [`TitleInferenceError`] for any failure; callers do not
    /// distinguish causes.
    async fn infer_title(&self, text: &str) -> Result<String, TitleInferenceError>;
}

/// Opaque title inference failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("title inference failed: {0}")]
pub struct TitleInferenceError(pub String);

impl TitleInferenceError {
    /// Builds an error from any displayable cause.
    pub fn from_display(cause: impl std::fmt::Display) -> Self {
        Self(cause.to_string())
    }
}
