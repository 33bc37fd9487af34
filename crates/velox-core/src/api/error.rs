use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    Auth,

    #[error("Session expired - please sign in again")]
    SessionExpired,

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Unauthorized - access token was rejected after refresh")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Token storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl SessionError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Pull a human readable message out of a backend error body.
    ///
    /// The backend answers with either `{"detail": "..."}` or a map of
    /// field name to a list of messages. Anything else is passed through.
    pub fn backend_message(body: &str) -> String {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return Self::truncate_body(body);
        };

        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }

        match value {
            serde_json::Value::Object(fields) if !fields.is_empty() => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(field, messages)| {
                        let text = match messages {
                            serde_json::Value::Array(items) => items
                                .iter()
                                .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                                .collect::<Vec<_>>()
                                .join(" "),
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        format!("{}: {}", field, text)
                    })
                    .collect();
                Self::truncate_body(&parts.join("; "))
            }
            _ => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => SessionError::Unauthorized,
            404 => SessionError::NotFound(Self::truncate_body(body)),
            400..=499 => SessionError::Validation(Self::backend_message(body)),
            500..=599 => SessionError::Server(Self::truncate_body(body)),
            code => SessionError::UnexpectedStatus {
                status: code,
                body: Self::truncate_body(body),
            },
        }
    }

    /// Whether the caller has to go back through sign-in.
    ///
    /// Only a failed refresh qualifies. `Unauthorized` follows a successful
    /// refresh, so the stored refresh token is still good.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, SessionError::SessionExpired)
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            SessionError::from_status(StatusCode::UNAUTHORIZED, ""),
            SessionError::Unauthorized
        ));
        assert!(matches!(
            SessionError::from_status(StatusCode::NOT_FOUND, "gone"),
            SessionError::NotFound(_)
        ));
        assert!(matches!(
            SessionError::from_status(StatusCode::BAD_REQUEST, "{}"),
            SessionError::Validation(_)
        ));
        assert!(matches!(
            SessionError::from_status(StatusCode::BAD_GATEWAY, "oops"),
            SessionError::Server(_)
        ));
        assert!(matches!(
            SessionError::from_status(StatusCode::FOUND, ""),
            SessionError::UnexpectedStatus { status: 302, .. }
        ));
    }

    #[test]
    fn test_backend_message_detail() {
        let body = r#"{"detail": "Category does not belong to the user"}"#;
        assert_eq!(
            SessionError::backend_message(body),
            "Category does not belong to the user"
        );
    }

    #[test]
    fn test_backend_message_field_errors() {
        let body = r#"{"email": ["user account with this email already exists."]}"#;
        assert_eq!(
            SessionError::backend_message(body),
            "email: user account with this email already exists."
        );
    }

    #[test]
    fn test_backend_message_plain_text() {
        assert_eq!(SessionError::backend_message("Bad Request"), "Bad Request");
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let truncated = SessionError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.ends_with("(truncated, 510 total bytes)"));
    }

    #[test]
    fn test_requires_sign_in() {
        assert!(SessionError::SessionExpired.requires_sign_in());
        assert!(!SessionError::Unauthorized.requires_sign_in());
        assert!(!SessionError::Server("down".to_string()).requires_sign_in());
        assert!(!SessionError::Auth.requires_sign_in());
    }
}
