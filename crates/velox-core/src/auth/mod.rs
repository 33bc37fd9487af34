//! Token persistence for the signed-in session.
//!
//! This module provides:
//! - `TokenStore`: string key-value storage for `access_token` and `refresh_token`
//! - `MemoryTokenStore`, `FileTokenStore`: process-local and JSON file stores
//! - `KeyringTokenStore`: OS-level secure storage via keyring
//! - `Tokens`: typed access to the stored `TokenPair`

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::KeyringTokenStore;
pub use session::{TokenPair, Tokens};
pub use store::{
    FileTokenStore, MemoryTokenStore, TokenStore, ACCESS_TOKEN_KEY, PREFS_NAMESPACE,
    REFRESH_TOKEN_KEY,
};
