//! Session-aware client for the Velox planner REST API.
//!
//! `SessionClient` owns the access/refresh token pair and performs every
//! authenticated call. A 401 triggers one refresh of the access token and a
//! single retry of the rejected request; a failed refresh surfaces as
//! `SessionError::SessionExpired`.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{TokenPair, TokenStore, Tokens};
use crate::config::Config;
use crate::models::{Category, Task, TaskDraft, TaskRecord};

use super::error::{Result, SessionError};
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

// ============================================================================
// Constants
// ============================================================================

/// Scheme name the backend expects in the Authorization header
const AUTH_SCHEME: &str = "JWT";

const REGISTER_PATH: &str = "/auth/users/";
const TOKEN_CREATE_PATH: &str = "/auth/jwt/create/";
const TOKEN_REFRESH_PATH: &str = "/auth/jwt/refresh/";
const TASKS_PATH: &str = "/api/tasks/";
const CATEGORIES_PATH: &str = "/api/categories/";
const PROCESS_TEXT_PATH: &str = "/api/process-text/";

/// Display name sent with registrations; the sign-up form does not ask for one
const DEFAULT_DISPLAY_NAME: &str = "Your Name";

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

pub struct SessionClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    tokens: Tokens,
    /// Serializes token refreshes so concurrent 401s share one refresh call
    refresh_gate: Mutex<()>,
}

impl SessionClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            tokens: Tokens::new(store),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Build a client with the reqwest transport and the configured token store
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        let store = config.open_token_store()?;
        Ok(Self::new(config.base_url.clone(), Arc::new(transport), store))
    }

    pub fn tokens(&self) -> &Tokens {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(token: &str) -> String {
        format!("{} {}", AUTH_SCHEME, token)
    }

    /// Check if response is successful, returning a typed error if not
    fn check_response(response: HttpResponse) -> Result<HttpResponse> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(SessionError::from_status(response.status, &response.body))
        }
    }

    // ===== Account Methods =====

    /// Register a new account. The backend emails an activation link on success.
    pub async fn sign_up(&self, email: &str, password: &str, password_confirm: &str) -> Result<()> {
        let body = json!({
            "email": email,
            "password": password,
            "re_password": password_confirm,
            "name": DEFAULT_DISPLAY_NAME,
        });
        let request = HttpRequest::new(Method::POST, self.url(REGISTER_PATH)).with_json(body);
        let response = self.transport.send(request).await?;

        if response.is_success() {
            info!("Registration accepted, activation email sent");
            Ok(())
        } else {
            warn!(status = response.status.as_u16(), "Registration rejected");
            Err(SessionError::Validation(SessionError::backend_message(
                &response.body,
            )))
        }
    }

    /// Exchange credentials for a token pair and persist it.
    ///
    /// Existing tokens are only replaced once a valid pair has been received.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let body = json!({
            "email": email,
            "password": password,
        });
        let request = HttpRequest::new(Method::POST, self.url(TOKEN_CREATE_PATH)).with_json(body);
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            warn!(status = response.status.as_u16(), "Sign-in rejected");
            return Err(SessionError::Auth);
        }

        let pair: TokenPair = response.json()?;
        if pair.access.trim().is_empty() || pair.refresh.trim().is_empty() {
            return Err(SessionError::Parse("token response has a blank token".to_string()));
        }
        self.tokens.store_pair(&pair)?;
        info!("Signed in");
        Ok(())
    }

    /// Forget the stored tokens. No network call.
    pub fn sign_out(&self) {
        self.tokens.clear();
        info!("Signed out");
    }

    /// Decide whether the stored tokens still describe a live session.
    ///
    /// Returns false without touching the network when either token is
    /// missing. Otherwise probes the task list, refreshing once on 401.
    pub async fn check_session(&self) -> Result<bool> {
        if !self.tokens.is_complete() {
            debug!("No stored token pair");
            return Ok(false);
        }

        match self.request(Method::GET, TASKS_PATH, None).await {
            Ok(response) => Ok(response.status != StatusCode::UNAUTHORIZED),
            Err(SessionError::SessionExpired) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ===== Authenticated Requests =====

    /// Send an authenticated request, refreshing the access token once on 401.
    ///
    /// Any non-401 response is returned as-is. After a successful refresh the
    /// request is reissued exactly once and that response is final, even if
    /// it is another 401.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        let access = self.tokens.access();
        let response = self
            .send_authorized(method.clone(), path, body.clone(), access.as_deref())
            .await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(path = path, "Access token rejected, refreshing");
        let fresh = self.refresh_access(access.as_deref()).await?;

        let retried = self
            .send_authorized(method, path, body, Some(&fresh))
            .await?;
        if retried.status == StatusCode::UNAUTHORIZED {
            warn!(path = path, "Still unauthorized after token refresh");
        }
        Ok(retried)
    }

    async fn send_authorized(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        access: Option<&str>,
    ) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(method, self.url(path));
        if let Some(token) = access {
            request = request.with_authorization(Self::bearer(token));
        }
        if let Some(body) = body {
            request = request.with_json(body);
        }
        self.transport.send(request).await
    }

    /// Obtain a new access token for a request that was rejected with `rejected`.
    ///
    /// Stored tokens are only written after the refresh endpoint returned a
    /// new access token.
    async fn refresh_access(&self, rejected: Option<&str>) -> Result<String> {
        let _gate = self.refresh_gate.lock().await;

        // Another request refreshed while this one waited for the gate
        if let Some(current) = self.tokens.access() {
            if Some(current.as_str()) != rejected {
                debug!("Access token already refreshed by another request");
                return Ok(current);
            }
        }

        let Some(refresh) = self.tokens.refresh() else {
            warn!("No refresh token stored");
            return Err(SessionError::SessionExpired);
        };

        let request = HttpRequest::new(Method::POST, self.url(TOKEN_REFRESH_PATH))
            .with_json(json!({ "refresh": refresh }));
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token refresh request failed");
                return Err(SessionError::SessionExpired);
            }
        };

        if !response.is_success() {
            warn!(status = response.status.as_u16(), "Refresh token rejected");
            return Err(SessionError::SessionExpired);
        }

        let refreshed: RefreshResponse = match response.json::<RefreshResponse>() {
            Ok(refreshed) if !refreshed.access.trim().is_empty() => refreshed,
            Ok(_) => {
                warn!("Refresh response has a blank access token");
                return Err(SessionError::SessionExpired);
            }
            Err(e) => {
                warn!(error = %e, "Refresh response missing access token");
                return Err(SessionError::SessionExpired);
            }
        };

        self.tokens.store_access(&refreshed.access)?;
        info!("Access token refreshed");
        Ok(refreshed.access)
    }

    // ===== Data Methods =====

    /// Fetch all tasks of the signed-in user
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let response = Self::check_response(self.request(Method::GET, TASKS_PATH, None).await?)?;
        let records: Vec<TaskRecord> = response.json()?;
        let tasks = records
            .into_iter()
            .map(|record| record.into_task().map_err(SessionError::Parse))
            .collect::<Result<Vec<_>>>()?;
        debug!(count = tasks.len(), "Fetched tasks");
        Ok(tasks)
    }

    pub async fn get_task(&self, id: i64) -> Result<Task> {
        let path = format!("{}{}/", TASKS_PATH, id);
        let response = Self::check_response(self.request(Method::GET, &path, None).await?)?;
        let record: TaskRecord = response.json()?;
        record.into_task().map_err(SessionError::Parse)
    }

    /// Create a task and return it as stored by the backend (with its id)
    pub async fn create_task(&self, task: &Task) -> Result<Task> {
        let response = Self::check_response(
            self.request(Method::POST, TASKS_PATH, Some(task.to_payload()))
                .await?,
        )?;
        let record: TaskRecord = response.json()?;
        let created = record.into_task().map_err(SessionError::Parse)?;
        info!(id = ?created.id, "Task created");
        Ok(created)
    }

    pub async fn update_task(&self, task: &Task) -> Result<Task> {
        let id = task
            .id
            .ok_or_else(|| SessionError::Validation("task has not been created yet".to_string()))?;

        // The backend routes PATCH without the trailing slash
        let path = format!("{}{}", TASKS_PATH, id);
        let response = Self::check_response(
            self.request(Method::PATCH, &path, Some(task.to_payload()))
                .await?,
        )?;
        let record: TaskRecord = response.json()?;
        let updated = record.into_task().map_err(SessionError::Parse)?;
        info!(id = id, "Task updated");
        Ok(updated)
    }

    /// Delete a task. Only 200 and 204 count as success.
    pub async fn delete_task(&self, id: i64) -> Result<()> {
        let path = format!("{}{}/", TASKS_PATH, id);
        let response = Self::check_response(self.request(Method::DELETE, &path, None).await?)?;
        match response.status {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                info!(id = id, "Task deleted");
                Ok(())
            }
            status => Err(SessionError::UnexpectedStatus {
                status: status.as_u16(),
                body: response.body,
            }),
        }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let response =
            Self::check_response(self.request(Method::GET, CATEGORIES_PATH, None).await?)?;
        let categories: Vec<Category> = response.json()?;
        debug!(count = categories.len(), "Fetched categories");
        Ok(categories)
    }

    /// Ask the backend to turn free text into a task.
    ///
    /// The result has no id; pass it to `create_task` to keep it.
    pub async fn process_text(&self, text: &str) -> Result<Task> {
        let body = json!({ "text": text });
        let response = Self::check_response(
            self.request(Method::POST, PROCESS_TEXT_PATH, Some(body))
                .await?,
        )?;
        let draft: TaskDraft = response.json()?;
        let task = draft.into_task().map_err(SessionError::Parse)?;
        debug!(date = %task.date, "Text turned into a draft task");
        Ok(task)
    }
}
