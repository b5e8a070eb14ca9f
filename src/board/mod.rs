//! Board mirror: tasks, periods, and reports for a single user's board.
//!
//! The remote board is the ground truth. This module keeps a durable local
//! cache of it, enforces the fixed TODO, DOING, REVIEW, DONE workflow, and
//! tracks day and week periods. It follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The cache store in [`cache`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod cache;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
