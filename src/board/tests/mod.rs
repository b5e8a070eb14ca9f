//! Unit tests for the board mirror.

mod cache_tests;

use crate::board::{
    adapters::memory::{InMemoryBoardGateway, InMemoryCacheStorage},
    cache::{self, CacheStore, SharedCache},
    domain::{
        CardId, ListId, MemberId, PersistedTaskData, Priority, StatusListMap, Task, TaskStatus,
    },
    services::{PeriodTracker, RetryPolicy, TaskLifecycleService},
};
use crate::clock::ManualClock;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

pub(super) const TODO: &str = "list-todo";
pub(super) const DOING: &str = "list-doing";
pub(super) const REVIEW: &str = "list-review";
pub(super) const DONE: &str = "list-done";
pub(super) const ME: &str = "member-me";

pub(super) type TestLifecycle =
    TaskLifecycleService<InMemoryBoardGateway, InMemoryCacheStorage, ManualClock>;

pub(super) fn list(id: &str) -> ListId {
    ListId::new(id).expect("valid list id")
}

pub(super) fn card(id: &str) -> CardId {
    CardId::new(id).expect("valid card id")
}

pub(super) fn me() -> MemberId {
    MemberId::new(ME).expect("valid member id")
}

pub(super) fn lists_with_review() -> StatusListMap {
    StatusListMap::new(list(TODO), list(DOING), list(DONE))
        .and_then(|lists| lists.with_under_review(list(REVIEW)))
        .expect("distinct lists")
}

pub(super) fn lists_without_review() -> StatusListMap {
    StatusListMap::new(list(TODO), list(DOING), list(DONE)).expect("distinct lists")
}

pub(super) fn utc(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

/// Builds a cached task directly, bypassing the remote board.
pub(super) fn task(id: &str, priority: Priority, status: TaskStatus) -> Task {
    let lists = lists_with_review();
    Task::from_persisted(PersistedTaskData {
        id: card(id),
        title: format!("Task {id}"),
        description: String::new(),
        priority,
        status,
        list_id: lists.list_for(status).cloned().expect("mapped status"),
        assignees: BTreeSet::from([me()]),
        completed_at: None,
        url: None,
    })
}

/// Builds a done task completed at `completed_at`.
pub(super) fn done_task(id: &str, priority: Priority, completed_at: DateTime<Utc>) -> Task {
    Task::from_persisted(PersistedTaskData {
        id: card(id),
        title: format!("Task {id}"),
        description: String::new(),
        priority,
        status: TaskStatus::Done,
        list_id: list(DONE),
        assignees: BTreeSet::from([me()]),
        completed_at: Some(completed_at),
        url: None,
    })
}

/// Services wired over in-memory adapters and a manual clock.
pub(super) struct Harness {
    pub gateway: InMemoryBoardGateway,
    pub storage: InMemoryCacheStorage,
    pub cache: SharedCache<InMemoryCacheStorage>,
    pub clock: Arc<ManualClock>,
    pub lifecycle: TestLifecycle,
    pub periods: PeriodTracker<InMemoryCacheStorage, ManualClock>,
}

impl Harness {
    pub fn new(lists: StatusListMap) -> Self {
        Self::with_gateway(InMemoryBoardGateway::with_priority_labels(), lists)
    }

    pub fn with_gateway(gateway: InMemoryBoardGateway, lists: StatusListMap) -> Self {
        let storage = InMemoryCacheStorage::new();
        let cache = cache::shared(CacheStore::empty(storage.clone()));
        let clock = Arc::new(ManualClock::new(utc(2, 9, 0)));
        let lifecycle = TaskLifecycleService::new(
            Arc::new(gateway.clone()),
            Arc::clone(&cache),
            Arc::clone(&clock),
            lists,
            me(),
        )
        .with_retry(RetryPolicy::new(2, Duration::ZERO, Duration::ZERO));
        let periods = PeriodTracker::new(
            Arc::clone(&cache),
            Arc::clone(&clock),
            chrono_tz::Europe::Berlin,
        );
        Self {
            gateway,
            storage,
            cache,
            clock,
            lifecycle,
            periods,
        }
    }

    /// Places a task in the cache without touching the remote board.
    pub fn seed(&self, task: Task) {
        self.cache.write().expect("cache lock").upsert(task);
    }

    pub fn cached(&self, id: &str) -> Option<Task> {
        self.cache.read().expect("cache lock").get(&card(id)).cloned()
    }
}
