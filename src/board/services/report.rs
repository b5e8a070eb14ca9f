//! Read-only report assembly over the cache.

use crate::board::{
    cache::{CacheError, SharedCache, read_cache},
    domain::{CompletionReport, PeriodKind},
    ports::CacheStorage,
};
use chrono::{DateTime, FixedOffset};

/// Builds completion reports from cached tasks.
#[derive(Debug)]
pub struct ReportGenerator<S> {
    cache: SharedCache<S>,
}

impl<S> Clone for ReportGenerator<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

impl<S> ReportGenerator<S>
where
    S: CacheStorage,
{
    /// Creates a generator reading from `cache`.
    #[must_use]
    pub const fn new(cache: SharedCache<S>) -> Self {
        Self { cache }
    }

    /// Reports the tasks completed inside `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] when the cache lock is poisoned.
    pub fn build(
        &self,
        kind: PeriodKind,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<CompletionReport, CacheError> {
        let cache = read_cache(&self.cache)?;
        Ok(CompletionReport::from_completed(
            kind,
            start,
            end,
            cache.completed_between(start.to_utc(), end.to_utc()),
        ))
    }
}
