//! When steps for board workflow BDD scenarios.

use super::world::{BoardWorld, run_async};
use boardkeeper::board::{
    adapters::memory::GatewayOperation,
    domain::{PeriodKind, Priority, TaskStatus},
    services::CreateTaskRequest,
};
use chrono::TimeDelta;
use eyre::WrapErr;
use rstest_bdd_macros::when;

fn parse_kind(kind: &str) -> Result<PeriodKind, eyre::Report> {
    PeriodKind::try_from(kind).map_err(|err| eyre::eyre!("invalid period kind in scenario: {err}"))
}

#[when(r#"I create the task "{title}" with priority "{priority}""#)]
fn create_task(
    world: &mut BoardWorld,
    title: String,
    priority: String,
) -> Result<(), eyre::Report> {
    let level = Priority::try_from(priority.as_str())
        .map_err(|err| eyre::eyre!("invalid priority in scenario: {err}"))?;
    let created = run_async(
        world
            .lifecycle
            .create(CreateTaskRequest::new(title).with_priority(level)),
    )
    .wrap_err("create task in scenario")?;
    world.last_task = Some(created);
    Ok(())
}

#[when("the clock moves forward {hours:u32} hours")]
fn clock_moves_forward(world: &mut BoardWorld, hours: u32) {
    world.clock.advance(TimeDelta::hours(i64::from(hours)));
}

#[when(r#"the task is advanced to "{status}""#)]
fn advance_task(world: &mut BoardWorld, status: String) -> Result<(), eyre::Report> {
    let target = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let task_id = world
        .last_task
        .as_ref()
        .map(|task| task.id().clone())
        .ok_or_else(|| eyre::eyre!("missing created task in scenario world"))?;

    let result = run_async(world.lifecycle.advance(&task_id, target));
    if let Ok(ref updated) = result {
        world.last_task = Some(updated.clone());
    }
    world.last_advance = Some(result);
    Ok(())
}

#[when("the board stops accepting card moves")]
fn board_rejects_moves(world: &mut BoardWorld) -> Result<(), eyre::Report> {
    world
        .gateway
        .fail_always(GatewayOperation::MoveCard)
        .wrap_err("inject board outage")?;
    Ok(())
}

#[when(r#"the "{kind}" period is opened again"#)]
fn period_opened_again(world: &mut BoardWorld, kind: String) -> Result<(), eyre::Report> {
    world
        .periods
        .open(parse_kind(&kind)?)
        .wrap_err("reopen period")?;
    Ok(())
}

#[when(r#"the "{kind}" period is closed"#)]
fn period_closed(world: &mut BoardWorld, kind: String) -> Result<(), eyre::Report> {
    let closed = world
        .periods
        .close(parse_kind(&kind)?)
        .wrap_err("close period")?;
    world.last_closed = Some(closed);
    Ok(())
}

#[when("the cache is loaded")]
fn cache_is_loaded(world: &mut BoardWorld) {
    world.reload();
}

#[when("the cache is reconciled with the board")]
fn cache_is_reconciled(world: &mut BoardWorld) -> Result<(), eyre::Report> {
    run_async(world.lifecycle.reconcile()).wrap_err("reconcile cache with board")?;
    Ok(())
}
