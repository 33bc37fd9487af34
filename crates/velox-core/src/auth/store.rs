use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use tracing::debug;

/// Namespace all token keys live under
pub const PREFS_NAMESPACE: &str = "velox_prefs";

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Token file name inside the config directory
const PREFS_FILE: &str = "velox_prefs.json";

/// Persistent string key-value store for the two session secrets.
///
/// Writes of several entries go through `set_many` so a store can apply
/// them together.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;
    fn remove_many(&self, keys: &[&str]) -> Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-local store, used for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        {
            let mut values = lock(&store.values);
            values.insert(ACCESS_TOKEN_KEY.to_string(), access.to_string());
            values.insert(REFRESH_TOKEN_KEY.to_string(), refresh.to_string());
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut values = lock(&self.values);
        for (key, value) in entries {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut values = lock(&self.values);
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

/// JSON file backed store at `<config dir>/velox/velox_prefs.json`.
///
/// The file is read once on open and rewritten on every change.
pub struct FileTokenStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileTokenStore {
    pub fn open(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(PREFS_FILE);
        let values = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read token file")?;
            serde_json::from_str(&contents).context("Failed to parse token file")?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), "Opened token file");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if values.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to remove token file")?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, contents).context("Failed to write token file")?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut values = lock(&self.values);
        let mut next = values.clone();
        for (key, value) in entries {
            next.insert(key.to_string(), value.to_string());
        }
        self.save(&next)?;
        *values = next;
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut values = lock(&self.values);
        let mut next = values.clone();
        for key in keys {
            next.remove(*key);
        }
        self.save(&next)?;
        *values = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);

        store
            .set_many(&[(ACCESS_TOKEN_KEY, "a"), (REFRESH_TOKEN_KEY, "r")])
            .unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("a"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("r"));

        store.remove_many(&[ACCESS_TOKEN_KEY]).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("r"));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileTokenStore::open(dir.path()).unwrap();
        store
            .set_many(&[(ACCESS_TOKEN_KEY, "a1"), (REFRESH_TOKEN_KEY, "r1")])
            .unwrap();
        drop(store);

        let reopened = FileTokenStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).as_deref(), Some("a1"));
        assert_eq!(reopened.get(REFRESH_TOKEN_KEY).as_deref(), Some("r1"));
    }

    #[test]
    fn test_file_store_removes_file_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::open(dir.path()).unwrap();
        store.set_many(&[(ACCESS_TOKEN_KEY, "a1")]).unwrap();
        assert!(store.path().exists());

        store.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY]).unwrap();
        assert!(!store.path().exists());

        // Removing again is a no-op
        store.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY]).unwrap();
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PREFS_FILE), "{not json").unwrap();
        assert!(FileTokenStore::open(dir.path()).is_err());
    }
}
