//! Flat-file JSON key-value store under the app data directory.
//!
//! This is the guest-mode persistence layer and the read fallback when the
//! database is unavailable. One file per key, named `<key>.json`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::errors::AppError;

pub const SEARCH_HISTORY_KEY: &str = "mytube_search_history";
pub const SKIPPED_VIDEOS_KEY: &str = "mytube_skipped_videos";

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read a value. Missing files and unreadable JSON both come back as
    /// `None` so a damaged cache never takes the app down.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let path = self.path_for(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Ignoring unreadable local store entry '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string(value)?;
        std::fs::write(self.path_for(key), content)?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), AppError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let queries = vec!["cats".to_string(), "dogs".to_string()];
        store.set(SEARCH_HISTORY_KEY, &queries).unwrap();

        let loaded: Option<Vec<String>> = store.get(SEARCH_HISTORY_KEY).unwrap();
        assert_eq!(loaded, Some(queries));
    }

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let loaded: Option<Vec<String>> = store.get(SKIPPED_VIDEOS_KEY).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn corrupt_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mytube_search_history.json"), "not json").unwrap();

        let store = LocalStore::new(dir.path());
        let loaded: Option<Vec<String>> = store.get(SEARCH_HISTORY_KEY).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store.set(SKIPPED_VIDEOS_KEY, &vec!["abc".to_string()]).unwrap();
        store.remove(SKIPPED_VIDEOS_KEY).unwrap();
        store.remove(SKIPPED_VIDEOS_KEY).unwrap();

        let loaded: Option<Vec<String>> = store.get(SKIPPED_VIDEOS_KEY).unwrap();
        assert_eq!(loaded, None);
    }
}
