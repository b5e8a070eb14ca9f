//! In-memory remote board adapter.

use crate::board::{
    domain::{CardId, LabelId, ListId, MemberId, Priority},
    ports::{
        BoardGateway, BoardGatewayError, BoardGatewayResult, BoardLabel, CardSnapshot, CreatedCard,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Gateway operations, used to inject failures and inspect calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    /// [`BoardGateway::create_card`].
    CreateCard,
    /// [`BoardGateway::move_card`].
    MoveCard,
    /// [`BoardGateway::add_label`].
    AddLabel,
    /// [`BoardGateway::add_member`].
    AddMember,
    /// [`BoardGateway::mark_complete`].
    MarkComplete,
    /// [`BoardGateway::add_comment`].
    AddComment,
    /// [`BoardGateway::fetch_labels`].
    FetchLabels,
    /// [`BoardGateway::fetch_board_snapshot`].
    FetchSnapshot,
}

impl GatewayOperation {
    const fn name(self) -> &'static str {
        match self {
            Self::CreateCard => "create card",
            Self::MoveCard => "move card",
            Self::AddLabel => "add label",
            Self::AddMember => "add member",
            Self::MarkComplete => "mark complete",
            Self::AddComment => "add comment",
            Self::FetchLabels => "fetch labels",
            Self::FetchSnapshot => "fetch board snapshot",
        }
    }
}

/// Injected failure; `remaining: None` never runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outage {
    remaining: Option<u32>,
    status: u16,
}

/// In-memory remote board.
///
/// This adapter models board behaviour without network access. It is
/// suitable for unit and integration tests: failures can be injected per
/// operation, and every successful call is recorded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardGateway {
    state: Arc<RwLock<InMemoryBoardState>>,
}

#[derive(Debug, Default)]
struct InMemoryBoardState {
    cards: Vec<CardSnapshot>,
    labels: Vec<BoardLabel>,
    comments: HashMap<CardId, Vec<String>>,
    outages: HashMap<GatewayOperation, Outage>,
    calls: Vec<GatewayOperation>,
}

fn lock_error(err: impl std::fmt::Display) -> BoardGatewayError {
    BoardGatewayError::transport(std::io::Error::other(err.to_string()))
}

fn missing_card(operation: GatewayOperation, card_id: &CardId) -> BoardGatewayError {
    BoardGatewayError::Rejected {
        operation: operation.name(),
        status: 404,
        body: format!("card {card_id} not found"),
    }
}

impl InMemoryBoardState {
    fn begin(&mut self, operation: GatewayOperation) -> BoardGatewayResult<()> {
        if let Some(outage) = self.outages.get(&operation).copied() {
            if let Some(remaining) = outage.remaining {
                if remaining > 1 {
                    self.outages.insert(
                        operation,
                        Outage {
                            remaining: Some(remaining - 1),
                            ..outage
                        },
                    );
                } else {
                    self.outages.remove(&operation);
                }
            }
            return Err(BoardGatewayError::Rejected {
                operation: operation.name(),
                status: outage.status,
                body: "simulated outage".to_owned(),
            });
        }
        self.calls.push(operation);
        Ok(())
    }

    fn card_mut(
        &mut self,
        operation: GatewayOperation,
        card_id: &CardId,
    ) -> BoardGatewayResult<&mut CardSnapshot> {
        self.cards
            .iter_mut()
            .find(|card| &card.id == card_id)
            .ok_or_else(|| missing_card(operation, card_id))
    }
}

impl InMemoryBoardGateway {
    /// Creates an empty board with no labels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board that defines the three priority labels.
    #[must_use]
    pub fn with_priority_labels() -> Self {
        let gateway = Self::default();
        if let Ok(mut state) = gateway.state.write() {
            state.labels = Priority::ALL
                .into_iter()
                .filter_map(|priority| {
                    mint_label_id().ok().map(|id| BoardLabel {
                        id,
                        name: priority.label_name().to_owned(),
                    })
                })
                .collect();
        }
        gateway
    }

    /// Defines a label on the board and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn define_label(&self, name: impl Into<String>) -> BoardGatewayResult<LabelId> {
        let mut state = self.state.write().map_err(lock_error)?;
        let id = mint_label_id()?;
        state.labels.push(BoardLabel {
            id: id.clone(),
            name: name.into(),
        });
        Ok(id)
    }

    /// Places a card on the board directly, bypassing the engine.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn insert_card(&self, card: CardSnapshot) -> BoardGatewayResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.cards.retain(|existing| existing.id != card.id);
        state.cards.push(card);
        Ok(())
    }

    /// Makes the next `times` calls of `operation` fail with a 503.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn fail_next(&self, operation: GatewayOperation, times: u32) -> BoardGatewayResult<()> {
        self.fail_next_with(operation, times, 503)
    }

    /// Makes the next `times` calls of `operation` fail with `status`.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn fail_next_with(
        &self,
        operation: GatewayOperation,
        times: u32,
        status: u16,
    ) -> BoardGatewayResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if times > 0 {
            state.outages.insert(
                operation,
                Outage {
                    remaining: Some(times),
                    status,
                },
            );
        }
        Ok(())
    }

    /// Makes every call of `operation` fail until [`Self::restore`].
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn fail_always(&self, operation: GatewayOperation) -> BoardGatewayResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.outages.insert(
            operation,
            Outage {
                remaining: None,
                status: 503,
            },
        );
        Ok(())
    }

    /// Clears every injected failure.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn restore(&self) -> BoardGatewayResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.outages.clear();
        Ok(())
    }

    /// Returns the card with `card_id`.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn card(&self, card_id: &CardId) -> BoardGatewayResult<Option<CardSnapshot>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.cards.iter().find(|card| &card.id == card_id).cloned())
    }

    /// Returns the comments posted on a card.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn comments(&self, card_id: &CardId) -> BoardGatewayResult<Vec<String>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.comments.get(card_id).cloned().unwrap_or_default())
    }

    /// Returns the successful calls in order.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn calls(&self) -> BoardGatewayResult<Vec<GatewayOperation>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.calls.clone())
    }
}

fn mint_label_id() -> BoardGatewayResult<LabelId> {
    LabelId::new(Uuid::new_v4().simple().to_string()).map_err(|err| BoardGatewayError::Decode {
        operation: GatewayOperation::FetchLabels.name(),
        reason: err.to_string(),
    })
}

fn mint_card_id() -> BoardGatewayResult<CardId> {
    CardId::new(Uuid::new_v4().simple().to_string()).map_err(|err| BoardGatewayError::Decode {
        operation: GatewayOperation::CreateCard.name(),
        reason: err.to_string(),
    })
}

#[async_trait]
impl BoardGateway for InMemoryBoardGateway {
    async fn create_card(
        &self,
        list_id: &ListId,
        title: &str,
        description: &str,
    ) -> BoardGatewayResult<CreatedCard> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.begin(GatewayOperation::CreateCard)?;
        let id = mint_card_id()?;
        let url = Some(format!("https://trello.invalid/c/{id}"));
        state.cards.push(CardSnapshot {
            id: id.clone(),
            list_id: list_id.clone(),
            title: title.to_owned(),
            description: description.to_owned(),
            url: url.clone(),
            label_names: Vec::new(),
            member_ids: Vec::new(),
            completed_at: None,
        });
        Ok(CreatedCard { id, url })
    }

    async fn move_card(&self, card_id: &CardId, list_id: &ListId) -> BoardGatewayResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.begin(GatewayOperation::MoveCard)?;
        let card = state.card_mut(GatewayOperation::MoveCard, card_id)?;
        card.list_id = list_id.clone();
        Ok(())
    }

    async fn add_label(&self, card_id: &CardId, label_id: &LabelId) -> BoardGatewayResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.begin(GatewayOperation::AddLabel)?;
        let name = state
            .labels
            .iter()
            .find(|label| &label.id == label_id)
            .map(|label| label.name.clone())
            .ok_or_else(|| BoardGatewayError::Rejected {
                operation: GatewayOperation::AddLabel.name(),
                status: 404,
                body: format!("label {label_id} not found"),
            })?;
        let card = state.card_mut(GatewayOperation::AddLabel, card_id)?;
        if !card.label_names.contains(&name) {
            card.label_names.push(name);
        }
        Ok(())
    }

    async fn add_member(&self, card_id: &CardId, member_id: &MemberId) -> BoardGatewayResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.begin(GatewayOperation::AddMember)?;
        let card = state.card_mut(GatewayOperation::AddMember, card_id)?;
        if !card.member_ids.contains(member_id) {
            card.member_ids.push(member_id.clone());
        }
        Ok(())
    }

    async fn mark_complete(
        &self,
        card_id: &CardId,
        completed_at: DateTime<Utc>,
    ) -> BoardGatewayResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.begin(GatewayOperation::MarkComplete)?;
        let card = state.card_mut(GatewayOperation::MarkComplete, card_id)?;
        card.completed_at = Some(completed_at);
        Ok(())
    }

    async fn add_comment(&self, card_id: &CardId, text: &str) -> BoardGatewayResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.begin(GatewayOperation::AddComment)?;
        state.card_mut(GatewayOperation::AddComment, card_id)?;
        state
            .comments
            .entry(card_id.clone())
            .or_default()
            .push(text.to_owned());
        Ok(())
    }

    async fn fetch_labels(&self) -> BoardGatewayResult<Vec<BoardLabel>> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.begin(GatewayOperation::FetchLabels)?;
        Ok(state.labels.clone())
    }

    async fn fetch_board_snapshot(&self) -> BoardGatewayResult<Vec<CardSnapshot>> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.begin(GatewayOperation::FetchSnapshot)?;
        Ok(state.cards.clone())
    }
}
