//! Boardkeeper: task lifecycle and local cache sync for a chat-driven board.
//!
//! A single user drives a personal Trello board from a chat interface. This
//! crate keeps a durable local mirror of the board, enforces the fixed task
//! workflow, tracks day and week work periods, and builds completion
//! reports. The chat transport itself lives elsewhere.
//!
//! # Architecture
//!
//! Boardkeeper follows hexagonal architecture principles:
//!
//! - **Domain**: Pure values and rules with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for the remote board, cache
//!   storage, and title inference
//! - **Adapters**: Concrete implementations of ports (Trello, Gemini, files,
//!   in-memory)
//!
//! # Modules
//!
//! - [`board`]: Tasks, periods, reports, and the cache store
//! - [`session`]: Pending multi-step chat commands
//! - [`config`]: Deployment configuration
//! - [`app`]: Live service wiring

pub mod app;
pub mod board;
pub mod clock;
pub mod config;
pub mod session;
