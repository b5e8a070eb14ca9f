//! Task creation, transitions, and reconciliation against the remote board.

use super::RetryPolicy;
use crate::board::{
    cache::{CacheError, SharedCache, read_cache, write_cache},
    domain::{
        BoardDomainError, CardId, MemberId, PersistedTaskData, Priority, StatusListMap, Task,
        TaskDraft, TaskStatus, resolve_priority_label,
    },
    ports::{BoardGateway, BoardGatewayError, CacheStorage, CardSnapshot, TitleInference},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Title used when none is given and none can be inferred.
pub const PLACEHOLDER_TITLE: &str = "New Task";

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: String,
    priority: Priority,
}

impl CreateTaskRequest {
    /// Creates a request with a title, an empty description, and medium
    /// priority.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
        }
    }

    /// Sets the card description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the requested priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Request payload for moving a task to another status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceTaskRequest {
    task_id: CardId,
    target: TaskStatus,
    comment: Option<String>,
}

impl AdvanceTaskRequest {
    /// Creates a request to move `task_id` to `target`.
    #[must_use]
    pub const fn new(task_id: CardId, target: TaskStatus) -> Self {
        Self {
            task_id,
            target,
            comment: None,
        }
    }

    /// Posts `comment` on the card after the move. Blank comments are
    /// ignored.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let text = comment.into();
        self.comment = (!text.trim().is_empty()).then_some(text);
        self
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum TaskLifecycleError {
    /// The move is not allowed, or the board has no list for the target.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),

    /// No cached task has this id.
    #[error("task {0} not found")]
    TaskNotFound(CardId),

    /// The remote board failed after retries; the cache was not changed.
    #[error("remote board unavailable: {0}")]
    GatewayUnavailable(#[from] BoardGatewayError),

    /// The cache could not be read or written.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type for task lifecycle operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
///
/// Every mutation is sent to the remote board first; the cache is updated
/// only after the board has acknowledged it.
#[derive(Clone)]
pub struct TaskLifecycleService<G, S, C>
where
    G: BoardGateway,
    S: CacheStorage,
    C: Clock + Send + Sync,
{
    gateway: Arc<G>,
    cache: SharedCache<S>,
    clock: Arc<C>,
    lists: StatusListMap,
    member: MemberId,
    retry: RetryPolicy,
    titles: Option<Arc<dyn TitleInference>>,
}

impl<G, S, C> TaskLifecycleService<G, S, C>
where
    G: BoardGateway,
    S: CacheStorage,
    C: Clock + Send + Sync,
{
    /// Creates a service acting on behalf of `member`.
    #[must_use]
    pub fn new(
        gateway: Arc<G>,
        cache: SharedCache<S>,
        clock: Arc<C>,
        lists: StatusListMap,
        member: MemberId,
    ) -> Self {
        Self {
            gateway,
            cache,
            clock,
            lists,
            member,
            retry: RetryPolicy::default(),
            titles: None,
        }
    }

    /// Replaces the retry policy for remote calls.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enables title inference for requests with a blank title.
    #[must_use]
    pub fn with_title_inference(mut self, titles: Arc<dyn TitleInference>) -> Self {
        self.titles = Some(titles);
        self
    }

    /// Returns the status-to-list mapping in use.
    #[must_use]
    pub const fn lists(&self) -> &StatusListMap {
        &self.lists
    }

    /// Creates a card in the TODO list and caches it.
    ///
    /// The priority label is attached when the board defines one; the cached
    /// priority reflects the label actually attached. Card creation is only
    /// repeated when the board refused it outright (429 or 503).
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::GatewayUnavailable`] when any remote
    /// call fails after retries. No task is cached in that case.
    pub async fn create(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let title = self.resolve_title(&request.title, &request.description).await;
        let todo = self.lists.todo();
        let created = self
            .retry
            .run_when("create card", BoardGatewayError::is_unprocessed, || {
                self.gateway.create_card(todo, &title, &request.description)
            })
            .await?;

        let priority = self.attach_priority_label(&created.id, request.priority).await?;
        self.retry
            .run("add member", || {
                self.gateway.add_member(&created.id, &self.member)
            })
            .await?;

        let task = Task::from_created(
            TaskDraft {
                id: created.id,
                title,
                description: request.description,
                priority,
                url: created.url,
            },
            &self.lists,
            self.member.clone(),
        );
        self.store(task.clone())?;
        info!(task_id = %task.id(), priority = %task.priority(), "task created");
        Ok(task)
    }

    /// Moves a cached task to `target`.
    ///
    /// Shorthand for [`Self::advance_with`] without a comment.
    ///
    /// # Errors
    ///
    /// See [`Self::advance_with`].
    pub async fn advance(&self, task_id: &CardId, target: TaskStatus) -> TaskLifecycleResult<Task> {
        self.advance_with(AdvanceTaskRequest::new(task_id.clone(), target))
            .await
    }

    /// Moves a cached task and updates the cache once the board agrees.
    ///
    /// Entering DOING adds the configured member when the card lacks it;
    /// entering DONE marks the card's due date complete.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for unknown ids,
    /// [`TaskLifecycleError::Domain`] for illegal or unavailable targets, and
    /// [`TaskLifecycleError::GatewayUnavailable`] when the board fails. The
    /// cached record is unchanged on every error.
    pub async fn advance_with(&self, request: AdvanceTaskRequest) -> TaskLifecycleResult<Task> {
        let current = self
            .get(&request.task_id)?
            .ok_or_else(|| TaskLifecycleError::TaskNotFound(request.task_id.clone()))?;
        let now = self.clock.utc();
        let mut updated = current.clone();
        updated.transition_to(request.target, &self.lists, &self.member, now)?;

        let task_id = updated.id();
        let list_id = updated.list_id();
        self.retry
            .run("move card", || self.gateway.move_card(task_id, list_id))
            .await?;
        if request.target == TaskStatus::Doing && !current.assignees().contains(&self.member) {
            self.retry
                .run("add member", || self.gateway.add_member(task_id, &self.member))
                .await?;
        }
        if request.target == TaskStatus::Done {
            self.retry
                .run("mark complete", || self.gateway.mark_complete(task_id, now))
                .await?;
        }
        if let Some(comment) = &request.comment {
            self.post_comment(task_id, comment).await;
        }

        self.store(updated.clone())?;
        info!(
            task_id = %updated.id(),
            from = %current.status(),
            to = %updated.status(),
            "task advanced"
        );
        Ok(updated)
    }

    /// Replaces the cached tasks with the remote board's current cards.
    ///
    /// Cards in unmapped lists are skipped, and cards past TODO are kept only
    /// when the configured member is assigned. Periods are left untouched.
    /// Returns the number of tasks cached.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::GatewayUnavailable`] when the snapshot
    /// cannot be fetched (the cache is left as it was), or
    /// [`TaskLifecycleError::Cache`] when the result cannot be saved.
    pub async fn reconcile(&self) -> TaskLifecycleResult<usize> {
        let cards = self
            .retry
            .run("fetch board snapshot", || self.gateway.fetch_board_snapshot())
            .await?;
        let fetched = cards.len();
        let tasks: Vec<Task> = cards
            .into_iter()
            .filter_map(|card| self.task_from_card(card))
            .collect();

        let count = {
            let mut cache = write_cache(&self.cache)?;
            let count = cache.reconcile(tasks);
            cache.save()?;
            count
        };
        info!(fetched, cached = count, "board cache reconciled");
        Ok(count)
    }

    /// Looks up a cached task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Cache`] when the cache lock is poisoned.
    pub fn get(&self, task_id: &CardId) -> TaskLifecycleResult<Option<Task>> {
        Ok(read_cache(&self.cache)?.get(task_id).cloned())
    }

    /// Returns cached tasks with `status`, high priority first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Cache`] when the cache lock is poisoned.
    pub fn tasks_by_status(&self, status: TaskStatus) -> TaskLifecycleResult<Vec<Task>> {
        Ok(read_cache(&self.cache)?
            .list_by_status(status)
            .cloned()
            .collect())
    }

    async fn resolve_title(&self, title: &str, description: &str) -> String {
        let trimmed = title.trim();
        if !trimmed.is_empty() {
            return trimmed.to_owned();
        }
        let Some(titles) = &self.titles else {
            return PLACEHOLDER_TITLE.to_owned();
        };
        match titles.infer_title(description).await {
            Ok(inferred) if !inferred.trim().is_empty() => inferred.trim().to_owned(),
            Ok(_) => PLACEHOLDER_TITLE.to_owned(),
            Err(err) => {
                warn!(error = %err, "falling back to placeholder title");
                PLACEHOLDER_TITLE.to_owned()
            }
        }
    }

    async fn attach_priority_label(
        &self,
        card_id: &CardId,
        priority: Priority,
    ) -> TaskLifecycleResult<Priority> {
        let labels = self
            .retry
            .run("fetch labels", || self.gateway.fetch_labels())
            .await?;
        let Some(label) = labels
            .iter()
            .find(|label| Priority::from_label(&label.name) == Some(priority))
        else {
            warn!(%priority, "board has no matching priority label");
            return Ok(Priority::default());
        };
        self.retry
            .run("add label", || self.gateway.add_label(card_id, &label.id))
            .await?;
        Ok(resolve_priority_label([label.name.as_str()]))
    }

    async fn post_comment(&self, card_id: &CardId, text: &str) {
        if let Err(err) = self
            .retry
            .run("add comment", || self.gateway.add_comment(card_id, text))
            .await
        {
            warn!(task_id = %card_id, error = %err, "transition comment not posted");
        }
    }

    fn task_from_card(&self, card: CardSnapshot) -> Option<Task> {
        let status = self.lists.status_for(&card.list_id)?;
        if status != TaskStatus::Todo && !card.member_ids.contains(&self.member) {
            return None;
        }
        Some(Task::from_persisted(PersistedTaskData {
            id: card.id,
            title: card.title,
            description: card.description,
            priority: resolve_priority_label(&card.label_names),
            status,
            list_id: card.list_id,
            assignees: card.member_ids.into_iter().collect(),
            completed_at: card.completed_at,
            url: card.url,
        }))
    }

    fn store(&self, task: Task) -> TaskLifecycleResult<()> {
        let mut cache = write_cache(&self.cache)?;
        cache.upsert(task);
        cache.save_or_warn();
        Ok(())
    }
}
