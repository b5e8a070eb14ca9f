//! Command sessions for multi-step chat interactions.
//!
//! A chat command that needs more input (a title, a description, a priority,
//! or a task pick) leaves a pending entry here. The next message in that chat
//! resolves it. Entries live in memory only and expire after a configured
//! time to live.

mod domain;
mod manager;

pub use domain::{Awaiting, ChatId, InputError, PendingEntry, PendingPayload};
pub use manager::{CommandSessionManager, SessionError, SessionResult};
