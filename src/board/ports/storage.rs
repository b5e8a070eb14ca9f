//! Durable storage port for the board cache.

use std::sync::Arc;
use thiserror::Error;

/// Result type for cache storage operations.
pub type CacheStorageResult<T> = Result<T, CacheStorageError>;

/// Whole-document storage for the serialised cache.
///
/// The cache is always read and written in full; there is no append path.
pub trait CacheStorage: Send + Sync {
    /// Reads the stored document, or `None` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`CacheStorageError`] when the backing store cannot be read.
    fn read(&self) -> CacheStorageResult<Option<String>>;

    /// Replaces the stored document so that readers see either the old or the
    /// new contents, never a mixture.
    ///
    /// # Errors
    ///
    /// Returns [`CacheStorageError`] when the document cannot be written.
    fn write_atomic(&self, contents: &str) -> CacheStorageResult<()>;
}

/// Errors returned by cache storage adapters.
#[derive(Debug, Clone, Error)]
pub enum CacheStorageError {
    /// I/O failure in the backing store.
    #[error("cache storage I/O error: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),

    /// The backing store refused the write.
    #[error("cache storage unavailable: {0}")]
    Unavailable(String),
}

impl CacheStorageError {
    /// Wraps an I/O error.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }
}
