//! HTTP transport abstraction.
//!
//! `SessionClient` never talks to reqwest directly; it hands fully built
//! requests to a `Transport`. Production code uses `ReqwestTransport`,
//! tests plug in a scripted fake.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use tracing::debug;

use super::error::{Result, SessionError};

/// A request ready to be sent, with the URL already resolved against the base.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Full `Authorization` header value, e.g. `JWT abc.def`
    pub authorization: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            authorization: None,
            body: None,
        }
    }

    pub fn with_authorization(mut self, value: String) -> Self {
        self.authorization = Some(value);
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as JSON, mapping failures to `SessionError::Parse`
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| SessionError::Parse(format!("{} (status {})", e, self.status)))
    }
}

/// Sends a single HTTP request. Implementations must not retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .header(header::ACCEPT, "application/json");
        if let Some(auth) = request.authorization {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        if let Some(body) = request.body {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Response received");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_json_parse_error() {
        let response = HttpResponse::new(StatusCode::OK, "not json");
        let parsed: Result<Vec<u8>> = response.json();
        assert!(matches!(parsed, Err(SessionError::Parse(_))));
    }

    #[test]
    fn test_request_builder() {
        let req = HttpRequest::new(Method::POST, "http://localhost/api/tasks/")
            .with_authorization("JWT abc".to_string())
            .with_json(serde_json::json!({"title": "x"}));
        assert_eq!(req.authorization.as_deref(), Some("JWT abc"));
        assert_eq!(req.body.unwrap()["title"], "x");
    }
}
