//! Port contracts for the board mirror.
//!
//! Ports define infrastructure-agnostic interfaces used by board services.

pub mod gateway;
pub mod storage;
pub mod title;

pub use gateway::{
    BoardGateway, BoardGatewayError, BoardGatewayResult, BoardLabel, CardSnapshot, CreatedCard,
};
pub use storage::{CacheStorage, CacheStorageError, CacheStorageResult};
pub use title::{TitleInference, TitleInferenceError};

#[cfg(test)]
pub use title::MockTitleInference;
