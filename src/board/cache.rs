//! Local mirror of the remote board.
//!
//! The [`CacheStore`] owns every cached [`Task`] and [`Period`] record. It
//! knows nothing about transitions or reports; services decide what to write
//! and the store keeps it ordered and durable.

use crate::board::domain::{CardId, Period, PeriodKind, Priority, StatusListMap, Task, TaskStatus};
use crate::board::ports::{CacheStorage, CacheStorageError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::warn;

/// Version tag written into every saved cache document.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Cache store shared between the services that read and write it.
pub type SharedCache<S> = Arc<RwLock<CacheStore<S>>>;

/// Errors returned by cache operations.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The backing storage failed.
    #[error(transparent)]
    Storage(#[from] CacheStorageError),

    /// The cache could not be serialised.
    #[error("failed to encode board cache: {0}")]
    Encode(String),

    /// A previous holder of the cache lock panicked.
    #[error("board cache lock poisoned: {0}")]
    Poisoned(String),
}

/// The stored cache document could not be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("board cache is corrupt: {reason}")]
pub struct CacheCorrupt {
    /// Why the document was rejected.
    pub reason: String,
}

/// What [`CacheStore::load`] found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLoadOutcome {
    /// Records were restored.
    Restored {
        /// Restored task count.
        tasks: usize,
        /// Restored period count.
        periods: usize,
    },
    /// Nothing had been saved yet.
    Missing,
    /// The document was unreadable; the store starts empty.
    Corrupt(CacheCorrupt),
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    schema_version: u32,
    #[serde(default)]
    tasks: Map<String, Value>,
    #[serde(default)]
    periods: BTreeMap<PeriodKind, Period>,
}

/// Durable local mirror of task and period records.
#[derive(Debug)]
pub struct CacheStore<S> {
    storage: S,
    tasks: Vec<Task>,
    index: HashMap<CardId, usize>,
    periods: BTreeMap<PeriodKind, Period>,
}

impl<S> CacheStore<S>
where
    S: CacheStorage,
{
    /// Creates an empty store over `storage` without reading it.
    #[must_use]
    pub fn empty(storage: S) -> Self {
        Self {
            storage,
            tasks: Vec::new(),
            index: HashMap::new(),
            periods: BTreeMap::new(),
        }
    }

    /// Restores the store from `storage`.
    ///
    /// A missing document yields an empty store. An unreadable or corrupt
    /// document also yields an empty store and is reported through
    /// [`CacheLoadOutcome::Corrupt`]; loading never fails. A document is
    /// corrupt when a task sits in a list other than the one `lists` maps
    /// its status to, or a period is filed under another kind's key.
    #[must_use]
    pub fn load(storage: S, lists: &StatusListMap) -> (Self, CacheLoadOutcome) {
        let raw = match storage.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return (Self::empty(storage), CacheLoadOutcome::Missing),
            Err(err) => return Self::recover(storage, err.to_string()),
        };

        match decode_document(&raw, lists) {
            Ok((tasks, periods)) => {
                let mut store = Self::empty(storage);
                for task in tasks {
                    store.upsert(task);
                }
                store.periods = periods;
                let outcome = CacheLoadOutcome::Restored {
                    tasks: store.tasks.len(),
                    periods: store.periods.len(),
                };
                (store, outcome)
            }
            Err(reason) => Self::recover(storage, reason),
        }
    }

    fn recover(storage: S, reason: String) -> (Self, CacheLoadOutcome) {
        warn!(%reason, "board cache unreadable, starting from an empty cache");
        (
            Self::empty(storage),
            CacheLoadOutcome::Corrupt(CacheCorrupt { reason }),
        )
    }

    /// Inserts a task, or replaces the record with the same id in place.
    pub fn upsert(&mut self, task: Task) {
        if let Some(slot) = self
            .index
            .get(task.id())
            .and_then(|position| self.tasks.get_mut(*position))
        {
            *slot = task;
            return;
        }
        self.index.insert(task.id().clone(), self.tasks.len());
        self.tasks.push(task);
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&Task> {
        self.index
            .get(id)
            .and_then(|position| self.tasks.get(*position))
    }

    /// Iterates over all tasks in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> + Clone + '_ {
        self.tasks.iter()
    }

    /// Returns the number of cached tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` when no task is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Lazily yields tasks with `status`, high priority first, then in
    /// insertion order. Clone the iterator to restart it.
    #[must_use]
    pub fn list_by_status(&self, status: TaskStatus) -> TasksByStatus<'_> {
        TasksByStatus {
            tasks: &self.tasks,
            status,
            priority_index: 0,
            position: 0,
        }
    }

    /// Yields done tasks completed inside `[start, end]`, in insertion order.
    pub fn completed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = &Task> + Clone + '_ {
        self.tasks.iter().filter(move |task| {
            task.status() == TaskStatus::Done
                && task
                    .completed_at()
                    .is_some_and(|completed_at| start <= completed_at && completed_at <= end)
        })
    }

    /// Returns the stored period of `kind`.
    #[must_use]
    pub fn period(&self, kind: PeriodKind) -> Option<&Period> {
        self.periods.get(&kind)
    }

    /// Stores a period, replacing the previous record of the same kind.
    pub fn put_period(&mut self, period: Period) {
        self.periods.insert(period.kind(), period);
    }

    /// Iterates over stored periods.
    pub fn periods(&self) -> impl Iterator<Item = &Period> + '_ {
        self.periods.values()
    }

    /// Replaces every cached task with `snapshot`; periods are kept.
    ///
    /// Returns the number of tasks now cached.
    pub fn reconcile(&mut self, snapshot: impl IntoIterator<Item = Task>) -> usize {
        self.tasks.clear();
        self.index.clear();
        for task in snapshot {
            self.upsert(task);
        }
        self.tasks.len()
    }

    /// Writes the full cache to storage atomically.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Encode`] when serialisation fails or
    /// [`CacheError::Storage`] when the write fails. A failed write leaves
    /// the previous document in place.
    pub fn save(&self) -> Result<(), CacheError> {
        let mut tasks = Map::new();
        for task in &self.tasks {
            let value =
                serde_json::to_value(task).map_err(|err| CacheError::Encode(err.to_string()))?;
            tasks.insert(task.id().to_string(), value);
        }
        let document = CacheDocument {
            schema_version: CACHE_SCHEMA_VERSION,
            tasks,
            periods: self.periods.clone(),
        };
        let mut payload = serde_json::to_string_pretty(&document)
            .map_err(|err| CacheError::Encode(err.to_string()))?;
        payload.push('\n');
        self.storage.write_atomic(&payload)?;
        Ok(())
    }

    /// Saves the cache, logging instead of failing.
    ///
    /// Used after the remote board has already accepted a change: the
    /// in-memory mirror is correct and the next save or reconcile repairs the
    /// file.
    pub fn save_or_warn(&self) {
        if let Err(err) = self.save() {
            warn!(error = %err, "failed to persist board cache");
        }
    }
}

fn decode_document(
    raw: &str,
    lists: &StatusListMap,
) -> Result<(Vec<Task>, BTreeMap<PeriodKind, Period>), String> {
    let document: CacheDocument = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    if document.schema_version != CACHE_SCHEMA_VERSION {
        return Err(format!(
            "unsupported schema version {}, expected {CACHE_SCHEMA_VERSION}",
            document.schema_version
        ));
    }
    let tasks = document
        .tasks
        .into_iter()
        .map(|(key, value)| {
            serde_json::from_value::<Task>(value).map_err(|err| format!("task {key}: {err}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(task) = tasks
        .iter()
        .find(|task| lists.list_for(task.status()) != Some(task.list_id()))
    {
        return Err(format!(
            "task {} is {} but sits in list {}",
            task.id(),
            task.status(),
            task.list_id()
        ));
    }
    if let Some((key, period)) = document
        .periods
        .iter()
        .find(|(kind, stored)| **kind != stored.kind())
    {
        return Err(format!(
            "period stored under {key} is a {} period",
            period.kind()
        ));
    }
    Ok((tasks, document.periods))
}

/// Lazy iterator over tasks of one status, ordered by priority then
/// insertion.
#[derive(Debug, Clone)]
pub struct TasksByStatus<'a> {
    tasks: &'a [Task],
    status: TaskStatus,
    priority_index: usize,
    position: usize,
}

impl<'a> Iterator for TasksByStatus<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let priority: Priority = *Priority::ALL.get(self.priority_index)?;
            while let Some(task) = self.tasks.get(self.position) {
                self.position += 1;
                if task.status() == self.status && task.priority() == priority {
                    return Some(task);
                }
            }
            self.priority_index += 1;
            self.position = 0;
        }
    }
}

/// Wraps a store for sharing between services.
#[must_use]
pub fn shared<S>(store: CacheStore<S>) -> SharedCache<S> {
    Arc::new(RwLock::new(store))
}

pub(crate) fn read_cache<S>(
    cache: &SharedCache<S>,
) -> Result<RwLockReadGuard<'_, CacheStore<S>>, CacheError> {
    cache
        .read()
        .map_err(|err| CacheError::Poisoned(err.to_string()))
}

pub(crate) fn write_cache<S>(
    cache: &SharedCache<S>,
) -> Result<RwLockWriteGuard<'_, CacheStore<S>>, CacheError> {
    cache
        .write()
        .map_err(|err| CacheError::Poisoned(err.to_string()))
}
