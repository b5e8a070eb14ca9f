//! Remote board gateway port.

use crate::board::domain::{CardId, LabelId, ListId, MemberId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for remote board operations.
pub type BoardGatewayResult<T> = Result<T, BoardGatewayError>;

/// Card acknowledged by the remote board after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCard {
    /// Identifier assigned by the board.
    pub id: CardId,
    /// Card permalink, when the board reports one.
    pub url: Option<String>,
}

/// Label defined on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLabel {
    /// Label identifier.
    pub id: LabelId,
    /// Label display name.
    pub name: String,
}

/// Card as fetched from the remote board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSnapshot {
    /// Card identifier.
    pub id: CardId,
    /// List the card sits in.
    pub list_id: ListId,
    /// Card title.
    pub title: String,
    /// Card description.
    pub description: String,
    /// Card permalink.
    pub url: Option<String>,
    /// Names of the labels attached to the card.
    pub label_names: Vec<String>,
    /// Members assigned to the card.
    pub member_ids: Vec<MemberId>,
    /// When the card was marked complete, if it was.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Card, list, label, and member operations against the remote board.
///
/// Implementations report any non-success response as an error; the engine
/// never inspects partial results.
#[async_trait]
pub trait BoardGateway: Send + Sync {
    /// Creates a card in `list_id`.
    async fn create_card(
        &self,
        list_id: &ListId,
        title: &str,
        description: &str,
    ) -> BoardGatewayResult<CreatedCard>;

    /// Moves a card to another list.
    async fn move_card(&self, card_id: &CardId, list_id: &ListId) -> BoardGatewayResult<()>;

    /// Attaches a board label to a card.
    async fn add_label(&self, card_id: &CardId, label_id: &LabelId) -> BoardGatewayResult<()>;

    /// Adds a member to a card.
    async fn add_member(&self, card_id: &CardId, member_id: &MemberId) -> BoardGatewayResult<()>;

    /// Marks a card's due date complete at `completed_at`.
    async fn mark_complete(
        &self,
        card_id: &CardId,
        completed_at: DateTime<Utc>,
    ) -> BoardGatewayResult<()>;

    /// Posts a comment on a card.
    async fn add_comment(&self, card_id: &CardId, text: &str) -> BoardGatewayResult<()>;

    /// Lists the labels defined on the board.
    async fn fetch_labels(&self) -> BoardGatewayResult<Vec<BoardLabel>>;

    /// Fetches every card on the board's mapped lists.
    async fn fetch_board_snapshot(&self) -> BoardGatewayResult<Vec<CardSnapshot>>;
}

/// Errors returned by remote board adapters.
#[derive(Debug, Clone, Error)]
pub enum BoardGatewayError {
    /// The board answered with a non-success status.
    #[error("{operation} rejected with status {status}: {body}")]
    Rejected {
        /// Operation that was attempted.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The board answered with a body that could not be decoded.
    #[error("{operation} returned an undecodable response: {reason}")]
    Decode {
        /// Operation that was attempted.
        operation: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl BoardGatewayError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns `true` when repeating the call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Rejected { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::Decode { .. } => false,
            Self::Transport(_) => true,
        }
    }

    /// Returns `true` when the board refused the call before acting on it.
    ///
    /// Only 429 and 503 qualify; a timeout or other server error may hide a
    /// call that was applied, so non-idempotent calls must not be repeated.
    #[must_use]
    pub const fn is_unprocessed(&self) -> bool {
        matches!(self, Self::Rejected { status: 429 | 503, .. })
    }
}
