// src/core/paths.rs

use crate::constants::{ALI_DIR, LOG_FILENAME};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures locating or creating `~/.ali`.
#[derive(Error, Debug)]
pub enum PathError {
    /// `$HOME` (or its platform equivalent) is not set.
    #[error("Could not find the user's home directory.")]
    HomeDirNotFound,
    /// The directory could not be created.
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        /// The directory that was requested.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Returns the `~/.ali` directory without touching the filesystem.
pub fn ali_dir() -> Result<PathBuf, PathError> {
    dirs::home_dir()
        .map(|home| home.join(ALI_DIR))
        .ok_or(PathError::HomeDirNotFound)
}

/// Returns the `~/.ali` directory, creating it if it doesn't exist.
pub fn ensure_ali_dir() -> Result<PathBuf, PathError> {
    let dir = ali_dir()?;
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| PathError::ConfigDirCreation {
            path: dir.display().to_string(),
            source: e,
        })?;
    }
    Ok(dir)
}

/// Path of the debug log file (`~/.ali/ali.log`).
pub fn log_file_path() -> Result<PathBuf, PathError> {
    ali_dir().map(|dir| dir.join(LOG_FILENAME))
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Resolves a configured working directory.
/// Empty and `.` mean "inherit the caller's directory" and yield `None`.
pub fn resolve_working_dir(raw: Option<&str>) -> Option<PathBuf> {
    let raw = raw.map(str::trim).filter(|d| !d.is_empty() && *d != ".")?;
    let expanded = expand_tilde(raw);
    Some(dunce::simplified(Path::new(&expanded)).to_path_buf())
}
