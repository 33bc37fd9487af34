//! Core library for the Velox planner client.
//!
//! - `api`: `SessionClient`, the token-refreshing REST client
//! - `auth`: token pair persistence
//! - `models`: tasks and categories
//! - `schedule`, `stats`: views computed from fetched tasks
//! - `config`: base URL, timeout and token store selection

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod schedule;
pub mod stats;

pub use api::{SessionClient, SessionError};
pub use config::Config;
