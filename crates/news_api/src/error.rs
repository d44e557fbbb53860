//! News API error types.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by news API calls.
///
/// The server does not classify failures beyond an HTTP status and a message,
/// so neither does the client: the message is surfaced as-is.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The credentials or token were rejected, or the username is taken
    /// (HTTP 401, 403 or 409).
    #[error("Authentication failed: {message}")]
    Auth { status: u16, message: String },

    /// The requested user or story does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// The request could not be sent or the connection failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The response body did not match the expected shape.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// The client was misconfigured (bad base URL, TLS setup).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Maps a non-success HTTP status and server message to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 | 409 => ApiError::Auth { status, message },
            404 => ApiError::NotFound(message),
            _ => ApiError::Server { status, message },
        }
    }

    /// Returns true for rejected credentials or tokens.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    /// The message to show to a user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Auth { message, .. } | ApiError::Server { message, .. } => message.clone(),
            ApiError::NotFound(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Deserialization(e.to_string())
        } else if e.is_builder() {
            ApiError::Configuration(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Deserialization(e.to_string())
    }
}

/// Error envelope used by the server: `{"error": {"status", "title", "message"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEnvelope {
    /// Extracts the most useful message from a raw error body.
    pub(crate) fn message_from(body: &[u8]) -> Option<String> {
        let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
        envelope.error.message.or(envelope.error.title)
    }
}

/// Result type for news API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(ApiError::from_status(401, "Invalid token").is_auth());
        assert!(ApiError::from_status(403, "Forbidden").is_auth());
        assert!(ApiError::from_status(409, "Username taken").is_auth());
        assert!(matches!(ApiError::from_status(404, "gone"), ApiError::NotFound(_)));
        assert!(matches!(
            ApiError::from_status(500, "boom"),
            ApiError::Server { status: 500, .. }
        ));
    }

    #[test]
    fn test_message_from_error_envelope() {
        let body = br#"{"error":{"status":409,"title":"Conflict","message":"There is already a user with username 'ada'."}}"#;
        assert_eq!(
            ErrorEnvelope::message_from(body).as_deref(),
            Some("There is already a user with username 'ada'.")
        );

        let title_only = br#"{"error":{"status":401,"title":"Unauthorized"}}"#;
        assert_eq!(
            ErrorEnvelope::message_from(title_only).as_deref(),
            Some("Unauthorized")
        );

        assert!(ErrorEnvelope::message_from(b"<html>").is_none());
    }

    #[test]
    fn test_user_message_is_server_message() {
        let err = ApiError::from_status(401, "Invalid password");
        assert_eq!(err.user_message(), "Invalid password");
    }
}
