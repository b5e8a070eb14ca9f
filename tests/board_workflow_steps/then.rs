//! Then steps for board workflow BDD scenarios.

use super::world::BoardWorld;
use boardkeeper::board::{
    adapters::render_report,
    cache::CacheLoadOutcome,
    domain::{BoardDomainError, Priority, Task, TaskStatus},
    services::TaskLifecycleError,
};
use boardkeeper::clock::ManualClock;
use mockable::Clock;
use rstest_bdd_macros::then;
use serde_json::Value;

fn cached_task(world: &BoardWorld) -> Result<Task, eyre::Report> {
    let task = world
        .last_task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing created task"))?;
    world
        .lifecycle
        .get(task.id())?
        .ok_or_else(|| eyre::eyre!("task {} missing from cache", task.id()))
}

fn advance_result(world: &BoardWorld) -> Result<&Result<Task, TaskLifecycleError>, eyre::Report> {
    world
        .last_advance
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing advance result"))
}

fn rendered_report(world: &BoardWorld) -> Result<String, eyre::Report> {
    let closed = world
        .last_closed
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing closed period"))?;
    Ok(render_report(&closed.report)?)
}

#[then(r#"the task is in "{status}" with priority "{priority}""#)]
fn task_is_in(world: &BoardWorld, status: String, priority: String) -> Result<(), eyre::Report> {
    let expected_status = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let expected_priority = Priority::try_from(priority.as_str())
        .map_err(|err| eyre::eyre!("invalid expected priority in scenario: {err}"))?;
    let task = cached_task(world)?;

    if task.status() != expected_status || task.priority() != expected_priority {
        return Err(eyre::eyre!(
            "expected {expected_status}/{expected_priority}, found {}/{}",
            task.status(),
            task.priority()
        ));
    }
    if world.lists.list_for(expected_status) != Some(task.list_id()) {
        return Err(eyre::eyre!("task sits in list {}", task.list_id()));
    }
    Ok(())
}

#[then("the task records its completion time")]
fn task_records_completion(world: &BoardWorld) -> Result<(), eyre::Report> {
    let task = cached_task(world)?;
    let now = <ManualClock as Clock>::utc(&world.clock);
    if task.completed_at() != Some(now) {
        return Err(eyre::eyre!(
            "expected completion at {now}, found {:?}",
            task.completed_at()
        ));
    }
    let remote = world
        .gateway
        .card(task.id())?
        .ok_or_else(|| eyre::eyre!("card missing from board"))?;
    if remote.completed_at != Some(now) {
        return Err(eyre::eyre!("board card was not marked complete"));
    }
    Ok(())
}

#[then(r#"the saved cache lists the task as "{status}""#)]
fn saved_cache_lists_task(world: &BoardWorld, status: String) -> Result<(), eyre::Report> {
    let task = cached_task(world)?;
    let raw = world
        .storage
        .contents()
        .ok_or_else(|| eyre::eyre!("cache was never saved"))?;
    let document: Value = serde_json::from_str(&raw)?;
    let saved_status = document
        .pointer(&format!("/tasks/{}/status", task.id()))
        .and_then(Value::as_str);
    if saved_status != Some(status.as_str()) {
        return Err(eyre::eyre!("saved status is {saved_status:?}"));
    }
    Ok(())
}

#[then("the advance fails with an invalid transition")]
fn advance_fails_with_invalid_transition(world: &BoardWorld) -> Result<(), eyre::Report> {
    let result = advance_result(world)?;
    if !matches!(
        result,
        Err(TaskLifecycleError::Domain(
            BoardDomainError::InvalidTransition { .. }
        ))
    ) {
        return Err(eyre::eyre!("expected InvalidTransition error, got {result:?}"));
    }
    Ok(())
}

#[then("the advance fails because the board is unavailable")]
fn advance_fails_with_gateway_error(world: &BoardWorld) -> Result<(), eyre::Report> {
    let result = advance_result(world)?;
    if !matches!(result, Err(TaskLifecycleError::GatewayUnavailable(_))) {
        return Err(eyre::eyre!("expected GatewayUnavailable error, got {result:?}"));
    }
    Ok(())
}

#[then("the report lists {count:usize} completed task")]
fn report_lists(world: &BoardWorld, count: usize) -> Result<(), eyre::Report> {
    let closed = world
        .last_closed
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing closed period"))?;
    let listed = closed.report.entries().len();
    if listed != count {
        return Err(eyre::eyre!("expected {count} report entries, found {listed}"));
    }
    Ok(())
}

#[then(r#"the rendered report mentions "{text}""#)]
fn rendered_report_mentions(world: &BoardWorld, text: String) -> Result<(), eyre::Report> {
    let rendered = rendered_report(world)?;
    if !rendered.contains(&text) {
        return Err(eyre::eyre!("report does not mention {text:?}:\n{rendered}"));
    }
    Ok(())
}

#[then("the load reports a corrupt cache")]
fn load_reports_corrupt(world: &BoardWorld) -> Result<(), eyre::Report> {
    match &world.load_outcome {
        Some(CacheLoadOutcome::Corrupt(_)) => Ok(()),
        other => Err(eyre::eyre!("expected corrupt load outcome, got {other:?}")),
    }
}

#[then("the cache holds {count:usize} task")]
fn cache_holds(world: &BoardWorld, count: usize) -> Result<(), eyre::Report> {
    let held: usize = [
        TaskStatus::Todo,
        TaskStatus::Doing,
        TaskStatus::UnderReview,
        TaskStatus::Done,
    ]
    .into_iter()
    .map(|status| world.lifecycle.tasks_by_status(status).map(|tasks| tasks.len()))
    .sum::<Result<usize, _>>()?;
    if held != count {
        return Err(eyre::eyre!("expected {count} cached tasks, found {held}"));
    }
    Ok(())
}
