//! REST API client module for the Velox planner backend.
//!
//! This module provides the `SessionClient` for signing in and out and for
//! the task/category endpoints, plus the `Transport` seam it sends through.
//!
//! The API uses JWT bearer tokens sent as `Authorization: JWT <token>`;
//! expired access tokens are refreshed transparently.

pub mod client;
pub mod error;
pub mod transport;

pub use client::SessionClient;
pub use error::{Result, SessionError};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
