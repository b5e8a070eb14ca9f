//! Wiring of the live services from configuration.

use crate::board::{
    adapters::{
        FileCacheStorage, GeminiTitleInference, TrelloBoardGateway, TrelloCredentials,
        trello::DEFAULT_TRELLO_API_BASE,
    },
    cache::{self, CacheLoadOutcome, CacheStore},
    ports::{BoardGatewayError, CacheStorageError, TitleInferenceError},
    services::{PeriodTracker, TaskLifecycleService},
};
use crate::config::{BoardConfig, ConfigError};
use crate::session::CommandSessionManager;
use mockable::DefaultClock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Lifecycle service over the Trello board and the cache file.
pub type LiveLifecycle = TaskLifecycleService<TrelloBoardGateway, FileCacheStorage, DefaultClock>;

/// Period tracker over the cache file.
pub type LivePeriods = PeriodTracker<FileCacheStorage, DefaultClock>;

/// Errors raised while assembling the services.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The cache file location is unusable.
    #[error(transparent)]
    Storage(#[from] CacheStorageError),

    /// The Trello client could not be built.
    #[error(transparent)]
    Gateway(#[from] BoardGatewayError),

    /// The title inference client could not be built.
    #[error(transparent)]
    TitleInference(#[from] TitleInferenceError),
}

/// Services a chat transport drives, sharing one cache.
pub struct BoardApp {
    /// Task creation, transitions, and reconciliation.
    pub lifecycle: LiveLifecycle,
    /// Day and week periods.
    pub periods: LivePeriods,
    /// Pending multi-step commands.
    pub sessions: CommandSessionManager<DefaultClock>,
    /// What was found in the cache file at start-up.
    pub load_outcome: CacheLoadOutcome,
}

impl BoardApp {
    /// Builds the services described by `config` and loads the cache.
    ///
    /// A corrupt cache file is not an error; it is reported through
    /// [`Self::load_outcome`] and the services start from an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] when configuration values are invalid or a
    /// client cannot be built.
    pub fn from_config(config: &BoardConfig) -> Result<Self, AppError> {
        let lists = config.status_lists()?;
        let member = config.member_id()?;
        let timezone = config.timezone()?;
        let clock = Arc::new(DefaultClock);

        let storage = FileCacheStorage::open(&config.cache_path)?;
        let (store, load_outcome) = CacheStore::load(storage, &lists);
        if !matches!(load_outcome, CacheLoadOutcome::Corrupt(_)) {
            info!(outcome = ?load_outcome, path = %config.cache_path, "board cache loaded");
        }
        let shared = cache::shared(store);

        let gateway = TrelloBoardGateway::new(
            config
                .trello
                .api_base
                .as_deref()
                .unwrap_or(DEFAULT_TRELLO_API_BASE),
            TrelloCredentials::new(config.trello.api_key.as_str(), config.trello.token.as_str()),
            lists.clone(),
            config.trello.board_id.clone(),
        )?;
        let mut lifecycle = TaskLifecycleService::new(
            Arc::new(gateway),
            Arc::clone(&shared),
            Arc::clone(&clock),
            lists,
            member,
        )
        .with_retry(config.retry_policy());
        if let Some(api_key) = config.gemini_api_key() {
            let titles = GeminiTitleInference::new(api_key, config.gemini.model.clone())?;
            lifecycle = lifecycle.with_title_inference(Arc::new(titles));
        }

        Ok(Self {
            lifecycle,
            periods: PeriodTracker::new(shared, Arc::clone(&clock), timezone),
            sessions: CommandSessionManager::new(clock, config.session_ttl()),
            load_outcome,
        })
    }
}
