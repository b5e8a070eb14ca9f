//! In-memory adapters for tests and local deterministic flows.

mod gateway;
mod storage;

pub use gateway::{GatewayOperation, InMemoryBoardGateway};
pub use storage::InMemoryCacheStorage;
