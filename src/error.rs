//! Error types for the library client

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body returned by the backend. Older endpoints use `error` instead of `message`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AppError {
    /// Map a non-success HTTP status and its raw body to an error
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    body.trim().to_string()
                }
            });

        match status {
            StatusCode::UNAUTHORIZED => AppError::Authentication(message),
            StatusCode::FORBIDDEN => AppError::Authorization(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                AppError::Validation(message)
            }
            _ => AppError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Message suitable for a user-facing notification
    pub fn user_message(&self) -> String {
        match self {
            AppError::Http(e) if e.is_timeout() => "The server took too long to respond".to_string(),
            AppError::Http(_) => "Could not reach the library server".to_string(),
            AppError::Api { message, .. }
            | AppError::Authentication(message)
            | AppError::Authorization(message)
            | AppError::NotFound(message)
            | AppError::Validation(message) => message.clone(),
            AppError::Storage(_) | AppError::Serialization(_) => {
                "Local data could not be saved".to_string()
            }
            AppError::Config(e) => e.to_string(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Unexpected error".to_string()
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = AppError::from_response(StatusCode::UNAUTHORIZED, r#"{"message":"Token expired"}"#);
        assert!(matches!(err, AppError::Authentication(ref m) if m == "Token expired"));

        let err = AppError::from_response(StatusCode::NOT_FOUND, r#"{"error":"Book not found"}"#);
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Book not found"));

        let err = AppError::from_response(StatusCode::UNPROCESSABLE_ENTITY, "{}");
        assert!(matches!(err, AppError::Validation(ref m) if m == "Unprocessable Entity"));
    }

    #[test]
    fn test_plain_text_body() {
        let err = AppError::from_response(StatusCode::BAD_GATEWAY, "upstream down");
        match err {
            AppError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
