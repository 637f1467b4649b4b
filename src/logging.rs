//! Tracing setup shared by `booking-train` and `booking-predict`.
//!
//! Events go to stderr, so `booking-predict` keeps stdout for its JSON output, and to a
//! per-launch file `booking_forecast_<component>_<timestamp>.log` in the app log directory.
//! Only the newest [`MAX_LOG_FILES`] of our own log files are kept.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling,
};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

pub const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "booking_forecast";

static LOG_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error(transparent)]
    LogDir(#[from] AppDirError),
    #[error("Log file I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format log file timestamp: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Where this process is logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSession {
    /// Log file for this launch; `None` when only stderr is available.
    pub file: Option<PathBuf>,
}

/// Install the global subscriber for `component` (e.g. `"train"`).
///
/// File logging is best effort: if the log directory cannot be prepared the subscriber writes
/// to stderr only and a warning is logged. Calls after the first are no-ops.
pub fn init(component: &str) -> LogSession {
    if LOG_GUARD.get().is_some() {
        return LogSession { file: None };
    }
    match init_with_file(component) {
        Ok(session) => session,
        Err(file_err) => {
            let installed = install(None).is_ok();
            let _ = LOG_GUARD.set(None);
            if installed {
                tracing::warn!("File logging disabled: {file_err}");
            }
            LogSession { file: None }
        }
    }
}

fn init_with_file(component: &str) -> Result<LogSession, LoggingError> {
    let dir = app_dirs::logs_dir()?;
    let (path, writer, guard) = open_log_file(&dir, component, now_local_or_utc())?;
    install(Some(writer))?;
    let _ = LOG_GUARD.set(Some(guard));
    if let Err(err) = prune_old_logs(&dir, MAX_LOG_FILES) {
        tracing::warn!("Log pruning failed: {err}");
    }
    tracing::info!("Logging to {}", path.display());
    Ok(LogSession { file: Some(path) })
}

fn install(file_writer: Option<NonBlocking>) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_timer(timer())
        .with_writer(std::io::stderr);
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_ansi(false)
            .with_timer(timer())
            .with_writer(writer)
    });
    let subscriber = Registry::default()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn open_log_file(
    dir: &Path,
    component: &str,
    now: OffsetDateTime,
) -> Result<(PathBuf, NonBlocking, WorkerGuard), LoggingError> {
    let name = log_file_name(component, now)?;
    let path = dir.join(&name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::Io {
            path: path.clone(),
            source,
        })?;
    let (writer, guard) = tracing_appender::non_blocking(rolling::never(dir, name));
    Ok((path, writer, guard))
}

fn log_file_name(component: &str, now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    Ok(format!(
        "{LOG_FILE_PREFIX}_{component}_{}.log",
        now.format(NAME_FORMAT)?
    ))
}

fn is_own_log(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "log")
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
}

/// Delete our oldest log files until at most `keep` remain; other files are left alone.
fn prune_old_logs(dir: &Path, keep: usize) -> Result<(), LoggingError> {
    let io_err = |path: &Path, source| LoggingError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut logs: Vec<(SystemTime, PathBuf)> = fs::read_dir(dir)
        .map_err(|source| io_err(dir, source))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_own_log(path))
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();
    logs.sort();
    let excess = logs.len().saturating_sub(keep);
    for (_, path) in logs.into_iter().take(excess) {
        fs::remove_file(&path).map_err(|source| io_err(&path, source))?;
    }
    Ok(())
}

fn timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
