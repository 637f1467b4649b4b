//! Per-user directory for files the binaries keep between runs (currently only logs).
//!
//! Defaults to the platform's local data directory for `booking-forecast`. Setting
//! `BOOKING_FORECAST_HOME` relocates it, which tests and portable installs use.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

pub const HOME_ENV_VAR: &str = "BOOKING_FORECAST_HOME";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No home directory found; set {HOME_ENV_VAR} to choose where logs go")]
    NoHome,
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Application home directory, created if missing.
pub fn app_home() -> Result<PathBuf, AppDirError> {
    let default = ProjectDirs::from("", "", "booking-forecast")
        .map(|dirs| dirs.data_local_dir().to_path_buf());
    let home = resolve_home(std::env::var_os(HOME_ENV_VAR), default)?;
    ensure_dir(&home)?;
    Ok(home)
}

/// `logs/` under [`app_home`], created if missing.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    let path = app_home()?.join("logs");
    ensure_dir(&path)?;
    Ok(path)
}

fn resolve_home(
    override_dir: Option<OsString>,
    default: Option<PathBuf>,
) -> Result<PathBuf, AppDirError> {
    override_dir
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or(default)
        .ok_or(AppDirError::NoHome)
}

fn ensure_dir(path: &Path) -> Result<(), AppDirError> {
    std::fs::create_dir_all(path).map_err(|source| AppDirError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
