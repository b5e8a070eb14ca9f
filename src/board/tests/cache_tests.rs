//! Cache store ordering, persistence, and recovery.

use super::{card, done_task, lists_with_review, task, utc};
use crate::board::{
    adapters::memory::InMemoryCacheStorage,
    cache::{CACHE_SCHEMA_VERSION, CacheError, CacheLoadOutcome, CacheStore},
    domain::{Period, PeriodKind, Priority, TaskStatus},
};
use rstest::{fixture, rstest};
use serde_json::Value;

#[fixture]
fn store() -> CacheStore<InMemoryCacheStorage> {
    CacheStore::empty(InMemoryCacheStorage::new())
}

fn ids<'a>(tasks: impl Iterator<Item = &'a crate::board::domain::Task>) -> Vec<String> {
    tasks.map(|task| task.id().to_string()).collect()
}

#[rstest]
fn upsert_replaces_in_place(mut store: CacheStore<InMemoryCacheStorage>) {
    store.upsert(task("a", Priority::Low, TaskStatus::Todo));
    store.upsert(task("b", Priority::Low, TaskStatus::Todo));
    store.upsert(task("a", Priority::High, TaskStatus::Doing));

    assert_eq!(store.len(), 2);
    assert_eq!(ids(store.tasks()), ["a", "b"]);
    assert_eq!(
        store.get(&card("a")).map(crate::board::domain::Task::status),
        Some(TaskStatus::Doing)
    );
}

#[rstest]
fn list_by_status_orders_by_priority_then_insertion(mut store: CacheStore<InMemoryCacheStorage>) {
    store.upsert(task("low-1", Priority::Low, TaskStatus::Todo));
    store.upsert(task("high-1", Priority::High, TaskStatus::Todo));
    store.upsert(task("doing", Priority::High, TaskStatus::Doing));
    store.upsert(task("medium-1", Priority::Medium, TaskStatus::Todo));
    store.upsert(task("high-2", Priority::High, TaskStatus::Todo));

    let todo = store.list_by_status(TaskStatus::Todo);
    let restarted = todo.clone();

    assert_eq!(ids(todo), ["high-1", "high-2", "medium-1", "low-1"]);
    assert_eq!(ids(restarted), ["high-1", "high-2", "medium-1", "low-1"]);
    assert_eq!(store.list_by_status(TaskStatus::Done).count(), 0);
}

#[rstest]
fn completed_between_is_inclusive(mut store: CacheStore<InMemoryCacheStorage>) {
    store.upsert(done_task("before", Priority::High, utc(2, 8, 59)));
    store.upsert(done_task("start", Priority::High, utc(2, 9, 0)));
    store.upsert(done_task("end", Priority::High, utc(2, 17, 0)));
    store.upsert(done_task("after", Priority::High, utc(2, 17, 1)));
    store.upsert(task("open", Priority::High, TaskStatus::Doing));

    assert_eq!(
        ids(store.completed_between(utc(2, 9, 0), utc(2, 17, 0))),
        ["start", "end"]
    );
}

#[rstest]
fn save_then_load_round_trips() {
    let storage = InMemoryCacheStorage::new();
    let mut store = CacheStore::empty(storage.clone());
    store.upsert(task("z", Priority::Low, TaskStatus::Todo));
    store.upsert(done_task("a", Priority::High, utc(3, 12, 0)));
    let opened = utc(2, 9, 0).fixed_offset();
    store.put_period(Period::open(PeriodKind::Week, opened));
    store.save().expect("save cache");

    let (restored, outcome) = CacheStore::load(storage.clone(), &lists_with_review());

    assert_eq!(
        outcome,
        CacheLoadOutcome::Restored {
            tasks: 2,
            periods: 1
        }
    );
    assert_eq!(
        restored.tasks().cloned().collect::<Vec<_>>(),
        store.tasks().cloned().collect::<Vec<_>>()
    );
    assert_eq!(restored.period(PeriodKind::Week), store.period(PeriodKind::Week));
    restored.save().expect("save again");
    let first = storage.contents();
    restored.save().expect("save twice");
    assert_eq!(storage.contents(), first);
}

#[rstest]
fn saved_layout_is_keyed_in_insertion_order() {
    let storage = InMemoryCacheStorage::new();
    let mut store = CacheStore::empty(storage.clone());
    store.upsert(task("z", Priority::Low, TaskStatus::Todo));
    store.upsert(task("a", Priority::High, TaskStatus::Todo));
    store.save().expect("save cache");

    let raw = storage.contents().expect("document written");
    let document: Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(
        document.get("schema_version").and_then(Value::as_u64),
        Some(u64::from(CACHE_SCHEMA_VERSION))
    );
    let keys: Vec<&str> = document
        .get("tasks")
        .and_then(Value::as_object)
        .map(|tasks| tasks.keys().map(String::as_str).collect())
        .unwrap_or_default();
    assert_eq!(keys, ["z", "a"]);
    assert!(raw.ends_with('\n'));
}

#[rstest]
fn missing_document_yields_empty_store() {
    let (store, outcome) = CacheStore::load(InMemoryCacheStorage::new(), &lists_with_review());
    assert!(store.is_empty());
    assert_eq!(outcome, CacheLoadOutcome::Missing);
}

#[rstest]
#[case("{ not json")]
#[case(r#"{"schema_version": 99, "tasks": {}}"#)]
#[case(r#"{"schema_version": 1, "tasks": {"x": {"id": "x"}}}"#)]
#[case::task_in_foreign_list(
    r#"{"schema_version": 1, "tasks": {"x": {"id": "x", "title": "Ship", "status": "todo", "list_id": "list-done"}}}"#
)]
#[case::open_period_without_start(
    r#"{"schema_version": 1, "periods": {"day": {"kind": "day", "state": "open", "opened_at": null}}}"#
)]
#[case::closed_period_without_end(
    r#"{"schema_version": 1, "periods": {"day": {"kind": "day", "state": "closed", "opened_at": "2026-03-02T10:00:00+01:00"}}}"#
)]
#[case::closed_before_opened(
    r#"{"schema_version": 1, "periods": {"day": {"kind": "day", "state": "closed", "opened_at": "2026-03-02T10:00:00+01:00", "closed_at": "2026-03-02T09:00:00+01:00"}}}"#
)]
#[case::period_under_wrong_key(
    r#"{"schema_version": 1, "periods": {"day": {"kind": "week", "state": "open", "opened_at": "2026-03-02T10:00:00+01:00"}}}"#
)]
fn corrupt_document_yields_empty_store(#[case] raw: &str) {
    let (store, outcome) =
        CacheStore::load(InMemoryCacheStorage::with_contents(raw), &lists_with_review());
    assert!(store.is_empty());
    assert!(store.period(PeriodKind::Day).is_none());
    assert!(store.period(PeriodKind::Week).is_none());
    assert!(matches!(outcome, CacheLoadOutcome::Corrupt(_)));
}

#[rstest]
fn task_in_its_mapped_list_loads() {
    let raw = r#"{"schema_version": 1, "tasks": {"x": {"id": "x", "title": "Ship", "status": "doing", "list_id": "list-doing"}}}"#;
    let (store, outcome) =
        CacheStore::load(InMemoryCacheStorage::with_contents(raw), &lists_with_review());
    assert_eq!(
        outcome,
        CacheLoadOutcome::Restored {
            tasks: 1,
            periods: 0
        }
    );
    assert_eq!(
        store.get(&card("x")).map(crate::board::domain::Task::status),
        Some(TaskStatus::Doing)
    );
}

#[rstest]
fn failed_write_keeps_previous_document() {
    let storage = InMemoryCacheStorage::new();
    let mut store = CacheStore::empty(storage.clone());
    store.upsert(task("a", Priority::High, TaskStatus::Todo));
    store.save().expect("first save");
    let before = storage.contents();

    storage.reject_writes(true).expect("toggle writes");
    store.upsert(task("b", Priority::High, TaskStatus::Todo));

    assert!(matches!(store.save(), Err(CacheError::Storage(_))));
    assert_eq!(storage.contents(), before);
}

#[rstest]
fn reconcile_replaces_tasks_and_keeps_periods(mut store: CacheStore<InMemoryCacheStorage>) {
    store.upsert(task("stale", Priority::High, TaskStatus::Doing));
    store.put_period(Period::open(PeriodKind::Day, utc(2, 9, 0).fixed_offset()));

    let count = store.reconcile([
        task("fresh-1", Priority::Low, TaskStatus::Todo),
        task("fresh-2", Priority::High, TaskStatus::Todo),
    ]);

    assert_eq!(count, 2);
    assert!(store.get(&card("stale")).is_none());
    assert_eq!(ids(store.tasks()), ["fresh-1", "fresh-2"]);
    assert!(store.period(PeriodKind::Day).is_some_and(Period::is_open));
}
