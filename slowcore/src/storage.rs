//! Storage utilities for Slow Computer apps
//!
//! Handles per-app config and cache directories and JSON preference files.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("File not found: {0}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, StorageError>;

fn project_dirs(app_name: &str) -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("co", "slowcomputer", app_name)
}

/// Get the config directory for a Slow Computer app
pub fn config_dir(app_name: &str) -> PathBuf {
    project_dirs(app_name)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the cache directory for a Slow Computer app
pub fn cache_dir(app_name: &str) -> PathBuf {
    project_dirs(app_name)
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(app_name))
}

/// Read a JSON file into `T`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        count: u32,
        name: String,
    }

    #[test]
    fn test_json_roundtrip_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let prefs = Prefs { count: 3, name: "eyes".into() };

        save_json(&path, &prefs).unwrap();
        let loaded: Prefs = load_json(&path).unwrap();
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = load_json::<Prefs>(&path).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(p) if p == path));
    }

    #[test]
    fn test_bad_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_json::<Prefs>(&path), Err(StorageError::Json(_))));
    }
}
