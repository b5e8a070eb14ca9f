//! Per-chat pending command state.

use super::domain::{Awaiting, ChatId, InputError, PendingEntry, PendingPayload};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

/// Errors returned by the session manager.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The chat has no live pending entry.
    #[error("no pending command for chat {0}")]
    NoPendingSession(ChatId),

    /// The input does not fit what the entry awaits; the entry is kept.
    #[error("invalid {awaiting} input: {source}")]
    InvalidInput {
        /// What the entry awaits.
        awaiting: Awaiting,
        /// Why the input was rejected.
        source: InputError,
    },

    /// A previous holder of the session lock panicked.
    #[error("session lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Short-lived, in-memory pending command state keyed by chat.
///
/// At most one entry exists per chat. Entries never persist and count as
/// absent once their time to live has elapsed.
pub struct CommandSessionManager<C>
where
    C: Clock + Send + Sync,
{
    entries: RwLock<HashMap<ChatId, PendingEntry>>,
    clock: Arc<C>,
    ttl: TimeDelta,
}

impl<C> CommandSessionManager<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a manager whose entries live for `ttl`.
    #[must_use]
    pub fn new(clock: Arc<C>, ttl: TimeDelta) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    /// Starts waiting for input in `chat_id`, replacing any prior entry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Poisoned`] when the session lock is poisoned.
    pub fn begin(
        &self,
        chat_id: ChatId,
        awaiting: Awaiting,
        payload: PendingPayload,
    ) -> SessionResult<PendingEntry> {
        let expires_at = self
            .clock
            .utc()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = PendingEntry {
            chat_id,
            awaiting,
            payload,
            expires_at,
        };
        let replaced = self.write()?.insert(chat_id, entry.clone()).is_some();
        debug!(%chat_id, %awaiting, replaced, "pending command started");
        Ok(entry)
    }

    /// Consumes the entry for `chat_id` and merges `input` into its payload.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoPendingSession`] when there is no live
    /// entry, or [`SessionError::InvalidInput`] when the input cannot be
    /// parsed; the entry is kept in that case so the user can try again.
    pub fn resolve(&self, chat_id: ChatId, input: &str) -> SessionResult<PendingPayload> {
        let now = self.clock.utc();
        let mut entries = self.write()?;
        let entry = entries
            .remove(&chat_id)
            .filter(|entry| !entry.is_expired(now))
            .ok_or(SessionError::NoPendingSession(chat_id))?;

        let mut payload = entry.payload.clone();
        if let Err(source) = payload.merge(entry.awaiting, input) {
            let awaiting = entry.awaiting;
            entries.insert(chat_id, entry);
            return Err(SessionError::InvalidInput { awaiting, source });
        }
        debug!(%chat_id, awaiting = %entry.awaiting, "pending command resolved");
        Ok(payload)
    }

    /// Returns the live entry for `chat_id` without consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Poisoned`] when the session lock is poisoned.
    pub fn peek(&self, chat_id: ChatId) -> SessionResult<Option<PendingEntry>> {
        let now = self.clock.utc();
        Ok(self
            .read()?
            .get(&chat_id)
            .filter(|entry| !entry.is_expired(now))
            .cloned())
    }

    /// Drops the entry for `chat_id`. Returns `true` when a live entry was
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Poisoned`] when the session lock is poisoned.
    pub fn cancel(&self, chat_id: ChatId) -> SessionResult<bool> {
        let now = self.clock.utc();
        Ok(self
            .write()?
            .remove(&chat_id)
            .is_some_and(|entry| !entry.is_expired(now)))
    }

    /// Removes every expired entry and returns how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Poisoned`] when the session lock is poisoned.
    pub fn prune_expired(&self) -> SessionResult<usize> {
        let now = self.clock.utc();
        let mut entries = self.write()?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }

    fn read(&self) -> SessionResult<RwLockReadGuard<'_, HashMap<ChatId, PendingEntry>>> {
        self.entries
            .read()
            .map_err(|err| SessionError::Poisoned(err.to_string()))
    }

    fn write(&self) -> SessionResult<RwLockWriteGuard<'_, HashMap<ChatId, PendingEntry>>> {
        self.entries
            .write()
            .map_err(|err| SessionError::Poisoned(err.to_string()))
    }
}
