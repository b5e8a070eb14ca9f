//! Shared world state for board workflow BDD scenarios.

use std::sync::Arc;

use boardkeeper::board::{
    adapters::memory::{InMemoryBoardGateway, InMemoryCacheStorage},
    cache::{self, CacheLoadOutcome, CacheStore},
    domain::{ListId, MemberId, StatusListMap, Task},
    services::{
        ClosedPeriod, PeriodTracker, RetryPolicy, TaskLifecycleError, TaskLifecycleService,
    },
};
use boardkeeper::clock::ManualClock;
use chrono::{TimeZone, Utc};
use rstest::fixture;
use std::time::Duration;

/// Lifecycle service type used by the BDD world.
pub type WorldLifecycle =
    TaskLifecycleService<InMemoryBoardGateway, InMemoryCacheStorage, ManualClock>;

/// Period tracker type used by the BDD world.
pub type WorldPeriods = PeriodTracker<InMemoryCacheStorage, ManualClock>;

pub const TODO_LIST: &str = "list-todo";
pub const DOING_LIST: &str = "list-doing";
pub const REVIEW_LIST: &str = "list-review";
pub const DONE_LIST: &str = "list-done";
pub const MEMBER: &str = "member-me";

/// Scenario world for board workflow behaviour tests.
pub struct BoardWorld {
    pub gateway: InMemoryBoardGateway,
    pub storage: InMemoryCacheStorage,
    pub clock: Arc<ManualClock>,
    pub lists: StatusListMap,
    pub lifecycle: WorldLifecycle,
    pub periods: WorldPeriods,
    pub last_task: Option<Task>,
    pub last_advance: Option<Result<Task, TaskLifecycleError>>,
    pub last_closed: Option<ClosedPeriod>,
    pub load_outcome: Option<CacheLoadOutcome>,
}

impl BoardWorld {
    /// Creates a world over an empty board and an empty cache.
    #[must_use]
    pub fn new() -> Self {
        let gateway = InMemoryBoardGateway::with_priority_labels();
        let storage = InMemoryCacheStorage::new();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
                .single()
                .expect("valid start time"),
        ));
        let lists = StatusListMap::new(list(TODO_LIST), list(DOING_LIST), list(DONE_LIST))
            .and_then(|lists| lists.with_under_review(list(REVIEW_LIST)))
            .expect("distinct lists");
        let (lifecycle, periods) = wire(
            &gateway,
            CacheStore::empty(storage.clone()),
            &clock,
            &lists,
        );

        Self {
            gateway,
            storage,
            clock,
            lists,
            lifecycle,
            periods,
            last_task: None,
            last_advance: None,
            last_closed: None,
            load_outcome: None,
        }
    }

    /// Reloads the cache from storage and rewires the services over it.
    pub fn reload(&mut self) {
        let (store, outcome) = CacheStore::load(self.storage.clone(), &self.lists);
        let (lifecycle, periods) = wire(&self.gateway, store, &self.clock, &self.lists);
        self.lifecycle = lifecycle;
        self.periods = periods;
        self.load_outcome = Some(outcome);
    }
}

impl Default for BoardWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn wire(
    gateway: &InMemoryBoardGateway,
    store: CacheStore<InMemoryCacheStorage>,
    clock: &Arc<ManualClock>,
    lists: &StatusListMap,
) -> (WorldLifecycle, WorldPeriods) {
    let shared = cache::shared(store);
    let lifecycle = TaskLifecycleService::new(
        Arc::new(gateway.clone()),
        Arc::clone(&shared),
        Arc::clone(clock),
        lists.clone(),
        member(),
    )
    .with_retry(RetryPolicy::new(2, Duration::ZERO, Duration::ZERO));
    let periods = PeriodTracker::new(shared, Arc::clone(clock), chrono_tz::Europe::Berlin);
    (lifecycle, periods)
}

/// Builds a list identifier used by the scenarios.
pub fn list(id: &str) -> ListId {
    ListId::new(id).expect("valid list id")
}

/// Returns the member acting in every scenario.
pub fn member() -> MemberId {
    MemberId::new(MEMBER).expect("valid member id")
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BoardWorld {
    BoardWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
