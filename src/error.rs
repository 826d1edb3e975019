//! Error types for the UnicalRent client

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::validation::ValidationError;

/// Structured error body returned by the rental API on 4xx/5xx responses.
///
/// Booking endpoints answer with `{tipo, messaggio, dettaglio}`; the generic
/// exception handler uses `message` instead of `messaggio`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorPayload {
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default, alias = "message")]
    pub messaggio: Option<String>,
    #[serde(default)]
    pub dettaglio: Option<String>,
}

impl ApiErrorPayload {
    pub fn is_kind(&self, kind: &str) -> bool {
        self.tipo.as_deref() == Some(kind)
    }
}

/// Main client error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status})")]
    Api {
        status: StatusCode,
        payload: Option<ApiErrorPayload>,
    },

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Access forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status associated with the error, if it came from a response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            AppError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            AppError::Forbidden => Some(StatusCode::FORBIDDEN),
            AppError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            AppError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Structured server payload, if any
    pub fn payload(&self) -> Option<&ApiErrorPayload> {
        match self {
            AppError::Api { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accepts_generic_message_field() {
        let payload: ApiErrorPayload =
            serde_json::from_str(r#"{"status":500,"error":"Internal Server Error","message":"boom"}"#)
                .unwrap();
        assert_eq!(payload.messaggio.as_deref(), Some("boom"));
        assert!(payload.tipo.is_none());
    }

    #[test]
    fn test_status_of_api_error() {
        let err = AppError::Api {
            status: StatusCode::CONFLICT,
            payload: None,
        };
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert!(err.payload().is_none());
    }
}
