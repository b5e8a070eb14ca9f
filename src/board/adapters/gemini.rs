//! Gemini `generateContent` adapter for title inference.

use crate::board::ports::{TitleInference, TitleInferenceError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Public Gemini REST endpoint.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when the configuration names none.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

const MAX_TITLE_CHARS: usize = 80;

/// Title inference backed by a Gemini model.
pub struct GeminiTitleInference {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for GeminiTitleInference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiTitleInference")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiTitleInference {
    /// Creates an adapter for `model`, or [`DEFAULT_GEMINI_MODEL`].
    ///
    /// # Errors
    ///
    /// Returns [`TitleInferenceError`] when the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        model: Option<String>,
    ) -> Result<Self, TitleInferenceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(TitleInferenceError::from_display)?;
        Ok(Self {
            http,
            api_base: DEFAULT_GEMINI_API_BASE.to_owned(),
            api_key: api_key.into(),
            model: model
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_owned()),
        })
    }

    /// Points the adapter at another endpoint.
    #[must_use]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        api_base.trim_end_matches('/').clone_into(&mut self.api_base);
        self
    }
}

fn prompt(text: &str) -> String {
    format!(
        "Write a short title, at most eight words, for the task described below. \
         Reply with the title only.\n\n{text}"
    )
}

/// Reduces a model reply to a usable title.
///
/// Takes the first non-empty line, strips markdown emphasis, heading marks,
/// and surrounding quotes, and bounds the length.
#[must_use]
pub fn clean_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;
    let stripped = line
        .trim_start_matches('#')
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '*' | '`'))
        .trim();
    if stripped.is_empty() {
        return None;
    }
    Some(stripped.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_owned())
}

#[async_trait]
impl TitleInference for GeminiTitleInference {
    async fn infer_title(&self, text: &str) -> Result<String, TitleInferenceError> {
        if text.trim().is_empty() {
            return Err(TitleInferenceError("nothing to infer a title from".to_owned()));
        }
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt(text) }] }]
        });
        let response = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                self.api_base, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(TitleInferenceError::from_display)?;
        let status = response.status();
        debug!(status = status.as_u16(), model = %self.model, "gemini request finished");
        if !status.is_success() {
            return Err(TitleInferenceError(format!(
                "gemini answered with status {}",
                status.as_u16()
            )));
        }
        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(TitleInferenceError::from_display)?;
        reply
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .find_map(|part| clean_title(&part.text))
            .ok_or_else(|| TitleInferenceError("gemini returned no title".to_owned()))
    }
}
