//! # Client Error Types
//!
//! Error types for requests to the back-office API.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Network        │  │  SessionExpired (401)   │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Api { status, msg }    │ │
//! │  │  ConfigLoad/Save│  │                 │  │  Decode                 │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Domain         │   CoreError from souq-core (validation, discount) │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried. The caller shows [`ClientError::user_message`] and
//! keeps its in-memory state.

use souq_core::CoreError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Shown when the backend gives no usable message.
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Shown when the bearer token is rejected.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// The backend rejected the bearer token (HTTP 401).
    #[error("Session expired")]
    SessionExpired,

    /// Non-success status with the backend's `error`/`message` field, if any.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    // =========================================================================
    // Domain / IO
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Text to show the user.
    ///
    /// Backend-provided messages are passed through; everything else gets a
    /// fixed message and is logged.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::SessionExpired => SESSION_EXPIRED_MESSAGE.to_string(),
            ClientError::Core(err) => err.to_string(),
            other => {
                tracing::error!(error = %other, "Request failed");
                GENERIC_MESSAGE.to_string()
            }
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

/// Extracts `error` or `message` from an error response body.
pub(crate) fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use souq_core::Money;

    #[test]
    fn test_user_message_prefers_backend_text() {
        let err = ClientError::Api {
            status: 422,
            message: Some("Invoice number already used".to_string()),
        };
        assert_eq!(err.user_message(), "Invoice number already used");
    }

    #[test]
    fn test_user_message_falls_back_to_generic() {
        let err = ClientError::Api {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(), GENERIC_MESSAGE);
        assert_eq!(ClientError::Timeout.user_message(), GENERIC_MESSAGE);
    }

    #[test]
    fn test_session_expired() {
        let err = ClientError::SessionExpired;
        assert!(err.is_session_expired());
        assert_eq!(err.user_message(), SESSION_EXPIRED_MESSAGE);
    }

    #[test]
    fn test_core_errors_pass_through() {
        let err: ClientError = CoreError::DiscountExceedsTotal {
            discount: Money::from_major(20),
            total: Money::from_major(10),
        }
        .into();
        assert!(err.user_message().contains("cannot be greater"));
    }

    #[test]
    fn test_backend_message() {
        assert_eq!(
            backend_message(r#"{"error": "Duplicate name"}"#),
            Some("Duplicate name".to_string())
        );
        assert_eq!(
            backend_message(r#"{"message": "Not allowed"}"#),
            Some("Not allowed".to_string())
        );
        assert_eq!(
            backend_message(r#"{"error": "", "message": "Fallback"}"#),
            Some("Fallback".to_string())
        );
        assert_eq!(backend_message("<html>502</html>"), None);
    }
}
