use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

use crate::error::StorageError;

/// Durable string values addressed by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write-then-rename so a crash never leaves a half written file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        debug!("Stored {} bytes under {}", value.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("chart-signal-agent-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = FileStore::new(temp_dir());
        assert_eq!(store.get("nothing_here").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let dir = temp_dir();
        let store = FileStore::new(&dir);

        store.set("trading_analysis_history", "[]").unwrap();
        store.set("trading_analysis_history", "[1]").unwrap();

        assert_eq!(store.get("trading_analysis_history").unwrap().as_deref(), Some("[1]"));
        assert!(dir.join("trading_analysis_history.json").exists());
        assert!(!dir.join("trading_analysis_history.json.tmp").exists());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let store = FileStore::new(temp_dir());
        assert!(matches!(store.get("../etc/passwd"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(store.set("", "x"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(store.set(".hidden", "x"), Err(StorageError::InvalidKey(_))));
    }
}
