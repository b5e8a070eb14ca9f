//! In-memory cache storage.

use crate::board::ports::{CacheStorage, CacheStorageError, CacheStorageResult};
use std::sync::{Arc, RwLock};

/// In-memory cache document holder.
///
/// Clones share the same document, so a test can keep a handle while the
/// cache store owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheStorage {
    state: Arc<RwLock<InMemoryStorageState>>,
}

#[derive(Debug, Default)]
struct InMemoryStorageState {
    contents: Option<String>,
    reject_writes: bool,
}

impl InMemoryCacheStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage pre-loaded with `contents`.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let storage = Self::default();
        if let Ok(mut state) = storage.state.write() {
            state.contents = Some(contents.into());
        }
        storage
    }

    /// Returns the stored document.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.contents.clone())
    }

    /// Makes subsequent writes fail, leaving the stored document untouched.
    ///
    /// # Errors
    ///
    /// Returns storage errors when lock acquisition fails.
    pub fn reject_writes(&self, reject: bool) -> CacheStorageResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| CacheStorageError::io(std::io::Error::other(err.to_string())))?;
        state.reject_writes = reject;
        Ok(())
    }
}

impl CacheStorage for InMemoryCacheStorage {
    fn read(&self) -> CacheStorageResult<Option<String>> {
        let state = self
            .state
            .read()
            .map_err(|err| CacheStorageError::io(std::io::Error::other(err.to_string())))?;
        Ok(state.contents.clone())
    }

    fn write_atomic(&self, contents: &str) -> CacheStorageResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| CacheStorageError::io(std::io::Error::other(err.to_string())))?;
        if state.reject_writes {
            return Err(CacheStorageError::Unavailable(
                "in-memory storage is rejecting writes".to_owned(),
            ));
        }
        state.contents = Some(contents.to_owned());
        Ok(())
    }
}
