//! Day and week period tracking.

use super::ReportGenerator;
use crate::board::{
    cache::{CacheError, SharedCache, read_cache, write_cache},
    domain::{BoardDomainError, CompletionReport, Period, PeriodKind},
    ports::CacheStorage,
};
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Service-level errors for period tracking.
#[derive(Debug, Clone, Error)]
pub enum PeriodTrackerError {
    /// The period is not open.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),

    /// The cache could not be read or written.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type for period tracking operations.
pub type PeriodTrackerResult<T> = Result<T, PeriodTrackerError>;

/// A period that was just closed, with its completion report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedPeriod {
    /// The closed period record.
    pub period: Period,
    /// Tasks completed between opening and closing.
    pub report: CompletionReport,
}

/// Opens and closes day and week periods.
///
/// Each kind is tracked independently. Timestamps are taken in the
/// configured timezone.
pub struct PeriodTracker<S, C>
where
    S: CacheStorage,
    C: Clock + Send + Sync,
{
    cache: SharedCache<S>,
    clock: Arc<C>,
    timezone: Tz,
    reports: ReportGenerator<S>,
}

impl<S, C> PeriodTracker<S, C>
where
    S: CacheStorage,
    C: Clock + Send + Sync,
{
    /// Creates a tracker stamping periods in `timezone`.
    #[must_use]
    pub fn new(cache: SharedCache<S>, clock: Arc<C>, timezone: Tz) -> Self {
        let reports = ReportGenerator::new(Arc::clone(&cache));
        Self {
            cache,
            clock,
            timezone,
            reports,
        }
    }

    /// Opens a period of `kind`.
    ///
    /// Opening a period that is already open returns the stored record
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodTrackerError::Cache`] when the cache lock is poisoned.
    pub fn open(&self, kind: PeriodKind) -> PeriodTrackerResult<Period> {
        let mut cache = write_cache(&self.cache)?;
        if let Some(existing) = cache.period(kind).filter(|period| period.is_open()) {
            debug!(%kind, "period already open");
            return Ok(existing.clone());
        }
        let period = Period::open(kind, self.now());
        cache.put_period(period.clone());
        cache.save_or_warn();
        info!(%kind, opened_at = ?period.opened_at(), "period opened");
        Ok(period)
    }

    /// Closes the open period of `kind` and reports what was completed.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodTrackerError::Domain`] with
    /// [`BoardDomainError::PeriodNotOpen`] when no period of `kind` is open,
    /// or [`PeriodTrackerError::Cache`] when the cache lock is poisoned.
    pub fn close(&self, kind: PeriodKind) -> PeriodTrackerResult<ClosedPeriod> {
        let (period, (start, end)) = {
            let mut cache = write_cache(&self.cache)?;
            let mut period = cache
                .period(kind)
                .cloned()
                .ok_or(BoardDomainError::PeriodNotOpen(kind))?;
            period.close(self.now())?;
            let window = period
                .window()
                .ok_or(BoardDomainError::MalformedPeriod(kind))?;
            cache.put_period(period.clone());
            cache.save_or_warn();
            (period, window)
        };
        let report = self.reports.build(kind, start, end)?;
        info!(
            %kind,
            completed = report.entries().len(),
            "period closed"
        );
        Ok(ClosedPeriod { period, report })
    }

    /// Returns the stored period of `kind`, open or closed.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodTrackerError::Cache`] when the cache lock is poisoned.
    pub fn current(&self, kind: PeriodKind) -> PeriodTrackerResult<Option<Period>> {
        Ok(read_cache(&self.cache)?.period(kind).cloned())
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.clock.utc().with_timezone(&self.timezone).fixed_offset()
    }
}
