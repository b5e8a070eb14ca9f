//! Rebuilds the local board cache from the remote Trello board.
//!
//! Usage:
//!
//! ```text
//! board-sync [config-path]
//! ```
//!
//! `config-path` defaults to `config.json` in the working directory. The
//! cache file is loaded first (a corrupt file is reported and replaced),
//! then every card on the configured lists is fetched and the cache is
//! rewritten. Period records are kept. Log verbosity follows `RUST_LOG`
//! and defaults to warnings.

use boardkeeper::app::{AppError, BoardApp};
use boardkeeper::board::services::TaskLifecycleError;
use boardkeeper::config::{BoardConfig, ConfigError};
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that stop a sync run.
#[derive(Debug, Error)]
enum SyncError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Lifecycle(#[from] TaskLifecycleError),
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

fn main() -> Result<(), BoxError> {
    init_tracing();
    let config_path = parse_args(env::args_os().skip(1))?;
    run(&config_path).map_err(Into::into)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_args(
    mut args: impl Iterator<Item = std::ffi::OsString>,
) -> Result<Utf8PathBuf, SyncError> {
    let path = args
        .next()
        .map(|arg| {
            Utf8PathBuf::from_path_buf(arg.into()).map_err(|path| {
                SyncError::InvalidArgs(format!("config path {} is not UTF-8", path.display()))
            })
        })
        .transpose()?
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CONFIG_PATH));
    if let Some(extra) = args.next() {
        return Err(SyncError::InvalidArgs(format!(
            "unexpected argument {}",
            extra.to_string_lossy()
        )));
    }
    Ok(path)
}

fn run(config_path: &Utf8Path) -> Result<(), SyncError> {
    let config = BoardConfig::load(config_path)?;
    let app = BoardApp::from_config(&config)?;

    let runtime = Builder::new_current_thread().enable_all().build()?;
    let cached = runtime.block_on(app.lifecycle.reconcile())?;
    info!(cached, path = %config.cache_path, "board sync finished");
    Ok(())
}
