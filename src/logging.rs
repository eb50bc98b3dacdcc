//! Tracing setup. The terminal belongs to the UI, so logs go to a file in the
//! user's data directory.

use std::{fs, path::PathBuf, sync::OnceLock};

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_NAME: &str = "checkcat.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("No suitable data directory available for logs")]
    NoDataDir,
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid log filter {filter:?}: {source}")]
    Filter {
        filter: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the file subscriber. `RUST_LOG` wins over `level`. Repeated
/// calls are no-ops.
pub fn init(level: &str) -> Result<PathBuf, LoggingError> {
    let dir = log_directory_in(dirs::data_local_dir())?;
    let path = dir.join(LOG_FILE_NAME);
    if LOG_GUARD.get().is_some() {
        return Ok(path);
    }

    let env_filter = build_filter(level, std::env::var("RUST_LOG").ok())?;

    let appender = rolling::never(&dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;
    let _ = LOG_GUARD.set(guard);
    Ok(path)
}

/// Parses `env` (the `RUST_LOG` value) if set and non-empty, else `level`.
fn build_filter(level: &str, env: Option<String>) -> Result<EnvFilter, LoggingError> {
    let filter = match env {
        Some(env) if !env.is_empty() => env,
        _ => level.to_string(),
    };
    EnvFilter::try_new(&filter).map_err(|source| LoggingError::Filter { filter, source })
}

fn log_directory_in(base: Option<PathBuf>) -> Result<PathBuf, LoggingError> {
    let dir = base.ok_or(LoggingError::NoDataDir)?.join("checkcat");
    fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
