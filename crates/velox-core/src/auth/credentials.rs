use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

use super::store::{TokenStore, PREFS_NAMESPACE};

/// Token store backed by the OS keychain. Each key is its own entry under
/// the `velox_prefs` service.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self {
            service: PREFS_NAMESPACE.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let entry = match self.entry(key) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = key, error = %e, "Keyring unavailable");
                return None;
            }
        };
        match entry.get_password() {
            Ok(value) if !value.trim().is_empty() => Some(value),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read token from keychain");
                None
            }
        }
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.entry(key)?
                .set_password(value)
                .with_context(|| format!("Failed to store {} in keychain", key))?;
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            match self.entry(key)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to delete {} from keychain", key))
                }
            }
        }
        Ok(())
    }
}
