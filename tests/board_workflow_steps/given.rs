//! Given steps for board workflow BDD scenarios.

use super::world::{BoardWorld, TODO_LIST, list};
use boardkeeper::board::{
    adapters::memory::InMemoryCacheStorage,
    domain::{CardId, PeriodKind, TaskStatus},
    ports::CardSnapshot,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("a board with todo, doing, review, and done lists")]
fn board_with_lists(world: &BoardWorld) -> Result<(), eyre::Report> {
    if world.lists.list_for(TaskStatus::UnderReview).is_none() {
        return Err(eyre::eyre!("scenario board is missing its review list"));
    }
    Ok(())
}

#[given(r#"the "{kind}" period is open"#)]
fn period_is_open(world: &mut BoardWorld, kind: String) -> Result<(), eyre::Report> {
    let period_kind = PeriodKind::try_from(kind.as_str())
        .map_err(|err| eyre::eyre!("invalid period kind in scenario: {err}"))?;
    world
        .periods
        .open(period_kind)
        .wrap_err("open period in scenario setup")?;
    Ok(())
}

#[given(r#"the board already holds the card "{title}" in the todo list"#)]
fn board_holds_card(world: &mut BoardWorld, title: String) -> Result<(), eyre::Report> {
    world
        .gateway
        .insert_card(CardSnapshot {
            id: CardId::new("existing-card")?,
            list_id: list(TODO_LIST),
            title,
            description: String::new(),
            url: None,
            label_names: vec!["Low Priority".to_owned()],
            member_ids: Vec::new(),
            completed_at: None,
        })
        .wrap_err("seed remote board")?;
    Ok(())
}

#[given("the saved cache is corrupt")]
fn saved_cache_is_corrupt(world: &mut BoardWorld) {
    world.storage = InMemoryCacheStorage::with_contents("{ \"schema_version\": 1, \"tasks\": [");
}
