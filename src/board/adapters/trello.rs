//! Trello REST adapter for the remote board port.

use crate::board::{
    domain::{CardId, LabelId, ListId, MemberId, StatusListMap},
    ports::{
        BoardGateway, BoardGatewayError, BoardGatewayResult, BoardLabel, CardSnapshot, CreatedCard,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

/// Public Trello REST endpoint.
pub const DEFAULT_TRELLO_API_BASE: &str = "https://api.trello.com/1";

const CARD_FIELDS: &str = "id,name,desc,shortUrl,labels,due,dueComplete,idMembers,idList";
const ERROR_BODY_CHARS: usize = 512;

/// API key and token pair used for query-string authentication.
#[derive(Clone)]
pub struct TrelloCredentials {
    api_key: String,
    token: String,
}

impl TrelloCredentials {
    /// Creates credentials from an API key and a user token.
    #[must_use]
    pub fn new(api_key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for TrelloCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrelloCredentials")
            .field("api_key", &"<redacted>")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Trello board reached over HTTPS.
///
/// Snapshots cover the lists in the configured [`StatusListMap`]. The board
/// id used for label lookups is either configured or discovered from the
/// TODO list on first use.
pub struct TrelloBoardGateway {
    http: reqwest::Client,
    api_base: String,
    credentials: TrelloCredentials,
    lists: StatusListMap,
    board_id: RwLock<Option<String>>,
}

impl fmt::Debug for TrelloBoardGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrelloBoardGateway")
            .field("api_base", &self.api_base)
            .field("lists", &self.lists)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCard {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    short_url: Option<String>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    due: Option<DateTime<Utc>>,
    #[serde(default)]
    due_complete: bool,
    #[serde(default)]
    id_members: Vec<String>,
    #[serde(default)]
    id_list: Option<String>,
    #[serde(default)]
    id_board: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawList {
    id_board: String,
}

fn decode_error(operation: &'static str, err: impl fmt::Display) -> BoardGatewayError {
    BoardGatewayError::Decode {
        operation,
        reason: err.to_string(),
    }
}

impl TrelloBoardGateway {
    /// Creates a gateway against `api_base`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardGatewayError::Transport`] when the HTTP client cannot
    /// be built.
    pub fn new(
        api_base: &str,
        credentials: TrelloCredentials,
        lists: StatusListMap,
        board_id: Option<String>,
    ) -> BoardGatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(BoardGatewayError::transport)?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_owned(),
            credentials,
            lists,
            board_id: RwLock::new(board_id.filter(|id| !id.trim().is_empty())),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    fn known_board_id(&self) -> Option<String> {
        self.board_id.read().ok().and_then(|guard| guard.clone())
    }

    fn remember_board_id(&self, board_id: &str) {
        if let Ok(mut guard) = self.board_id.write()
            && guard.is_none()
        {
            *guard = Some(board_id.to_owned());
        }
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> BoardGatewayResult<reqwest::Response> {
        let response = request
            .query(&[
                ("key", self.credentials.api_key.as_str()),
                ("token", self.credentials.token.as_str()),
            ])
            .send()
            .await
            .map_err(BoardGatewayError::transport)?;
        let status = response.status();
        debug!(operation, status = status.as_u16(), "trello request finished");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BoardGatewayError::Rejected {
            operation,
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_CHARS).collect(),
        })
    }

    async fn send_json<T>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> BoardGatewayResult<T>
    where
        T: DeserializeOwned,
    {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| decode_error(operation, err))
    }

    async fn board_id(&self) -> BoardGatewayResult<String> {
        if let Some(board_id) = self.known_board_id() {
            return Ok(board_id);
        }
        let operation = "resolve board";
        let list: RawList = self
            .send_json(
                operation,
                self.http
                    .get(self.url(&format!("lists/{}", self.lists.todo())))
                    .query(&[("fields", "idBoard")]),
            )
            .await?;
        self.remember_board_id(&list.id_board);
        Ok(list.id_board)
    }

    fn snapshot_from(card: RawCard, fallback_list: &ListId) -> BoardGatewayResult<CardSnapshot> {
        let operation = "fetch board snapshot";
        let list_id = card
            .id_list
            .map(ListId::new)
            .transpose()
            .map_err(|err| decode_error(operation, err))?
            .unwrap_or_else(|| fallback_list.clone());
        let member_ids = card
            .id_members
            .into_iter()
            .map(MemberId::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| decode_error(operation, err))?;
        Ok(CardSnapshot {
            id: CardId::new(card.id).map_err(|err| decode_error(operation, err))?,
            list_id,
            title: card.name,
            description: card.desc,
            url: card.short_url,
            label_names: card.labels.into_iter().map(|label| label.name).collect(),
            member_ids,
            completed_at: card.due.filter(|_| card.due_complete),
        })
    }
}

#[async_trait]
impl BoardGateway for TrelloBoardGateway {
    async fn create_card(
        &self,
        list_id: &ListId,
        title: &str,
        description: &str,
    ) -> BoardGatewayResult<CreatedCard> {
        let operation = "create card";
        let card: RawCard = self
            .send_json(
                operation,
                self.http.post(self.url("cards")).query(&[
                    ("idList", list_id.as_str()),
                    ("name", title),
                    ("desc", description),
                ]),
            )
            .await?;
        if let Some(board_id) = &card.id_board {
            self.remember_board_id(board_id);
        }
        Ok(CreatedCard {
            id: CardId::new(card.id).map_err(|err| decode_error(operation, err))?,
            url: card.short_url,
        })
    }

    async fn move_card(&self, card_id: &CardId, list_id: &ListId) -> BoardGatewayResult<()> {
        self.send(
            "move card",
            self.http
                .put(self.url(&format!("cards/{card_id}")))
                .query(&[("idList", list_id.as_str())]),
        )
        .await?;
        Ok(())
    }

    async fn add_label(&self, card_id: &CardId, label_id: &LabelId) -> BoardGatewayResult<()> {
        self.send(
            "add label",
            self.http
                .post(self.url(&format!("cards/{card_id}/idLabels")))
                .query(&[("value", label_id.as_str())]),
        )
        .await?;
        Ok(())
    }

    async fn add_member(&self, card_id: &CardId, member_id: &MemberId) -> BoardGatewayResult<()> {
        self.send(
            "add member",
            self.http
                .post(self.url(&format!("cards/{card_id}/idMembers")))
                .query(&[("value", member_id.as_str())]),
        )
        .await?;
        Ok(())
    }

    async fn mark_complete(
        &self,
        card_id: &CardId,
        completed_at: DateTime<Utc>,
    ) -> BoardGatewayResult<()> {
        let due = completed_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.send(
            "mark complete",
            self.http
                .put(self.url(&format!("cards/{card_id}")))
                .query(&[("due", due.as_str()), ("dueComplete", "true")]),
        )
        .await?;
        Ok(())
    }

    async fn add_comment(&self, card_id: &CardId, text: &str) -> BoardGatewayResult<()> {
        self.send(
            "add comment",
            self.http
                .post(self.url(&format!("cards/{card_id}/actions/comments")))
                .query(&[("text", text)]),
        )
        .await?;
        Ok(())
    }

    async fn fetch_labels(&self) -> BoardGatewayResult<Vec<BoardLabel>> {
        let operation = "fetch labels";
        let board_id = self.board_id().await?;
        let labels: Vec<RawLabel> = self
            .send_json(
                operation,
                self.http
                    .get(self.url(&format!("boards/{board_id}/labels")))
                    .query(&[("fields", "id,name")]),
            )
            .await?;
        labels
            .into_iter()
            .map(|label| {
                Ok(BoardLabel {
                    id: LabelId::new(label.id).map_err(|err| decode_error(operation, err))?,
                    name: label.name,
                })
            })
            .collect()
    }

    async fn fetch_board_snapshot(&self) -> BoardGatewayResult<Vec<CardSnapshot>> {
        let operation = "fetch board snapshot";
        let mut snapshot = Vec::new();
        for (_, list_id) in self.lists.lists() {
            let cards: Vec<RawCard> = self
                .send_json(
                    operation,
                    self.http
                        .get(self.url(&format!("lists/{list_id}/cards")))
                        .query(&[("fields", CARD_FIELDS)]),
                )
                .await?;
            for card in cards {
                snapshot.push(Self::snapshot_from(card, list_id)?);
            }
        }
        debug!(cards = snapshot.len(), "trello snapshot fetched");
        Ok(snapshot)
    }
}
