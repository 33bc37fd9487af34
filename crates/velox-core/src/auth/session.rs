use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::store::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::api::{Result, SessionError};

/// Access/refresh token pair as issued by the token endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

// Tokens are secrets; keep them out of Debug output and logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Typed view over a `TokenStore` holding the session's token pair
#[derive(Clone)]
pub struct Tokens {
    store: Arc<dyn TokenStore>,
}

impl Tokens {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Stored value for `key`; blank values count as absent
    fn token(&self, key: &str) -> Option<String> {
        self.store.get(key).filter(|value| !value.trim().is_empty())
    }

    pub fn access(&self) -> Option<String> {
        self.token(ACCESS_TOKEN_KEY)
    }

    pub fn refresh(&self) -> Option<String> {
        self.token(REFRESH_TOKEN_KEY)
    }

    /// Both halves, or None if either is missing
    pub fn pair(&self) -> Option<TokenPair> {
        Some(TokenPair {
            access: self.access()?,
            refresh: self.refresh()?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.pair().is_some()
    }

    pub fn store_pair(&self, pair: &TokenPair) -> Result<()> {
        self.store
            .set_many(&[
                (ACCESS_TOKEN_KEY, pair.access.as_str()),
                (REFRESH_TOKEN_KEY, pair.refresh.as_str()),
            ])
            .map_err(|e| SessionError::Storage(format!("{:#}", e)))
    }

    pub fn store_access(&self, access: &str) -> Result<()> {
        self.store
            .set_many(&[(ACCESS_TOKEN_KEY, access)])
            .map_err(|e| SessionError::Storage(format!("{:#}", e)))
    }

    /// Remove both tokens. Failures are logged, never returned.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY]) {
            warn!(error = %format!("{:#}", e), "Failed to clear stored tokens");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    #[test]
    fn test_pair_requires_both_halves() {
        let store = Arc::new(MemoryTokenStore::new());
        let tokens = Tokens::new(store.clone());
        assert!(!tokens.is_complete());

        tokens.store_access("a").unwrap();
        assert!(tokens.pair().is_none());

        tokens
            .store_pair(&TokenPair {
                access: "a2".to_string(),
                refresh: "r2".to_string(),
            })
            .unwrap();
        let pair = tokens.pair().expect("pair should be complete");
        assert_eq!(pair.access, "a2");
        assert_eq!(pair.refresh, "r2");
    }

    #[test]
    fn test_blank_tokens_are_absent() {
        let tokens = Tokens::new(Arc::new(MemoryTokenStore::with_tokens("", "  ")));
        assert!(tokens.access().is_none());
        assert!(tokens.refresh().is_none());
        assert!(!tokens.is_complete());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let tokens = Tokens::new(Arc::new(MemoryTokenStore::with_tokens("a", "r")));
        tokens.clear();
        assert!(tokens.access().is_none());
        assert!(tokens.refresh().is_none());
        tokens.clear();
        assert!(tokens.access().is_none());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let pair = TokenPair {
            access: "secret-access".to_string(),
            refresh: "secret-refresh".to_string(),
        };
        let printed = format!("{:?}", pair);
        assert!(!printed.contains("secret"));
    }
}
