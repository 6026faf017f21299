use std::sync::Arc;

use entity::ValidationError;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Shared result type for every backend-facing call.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("resource not found")]
    NotFound,
    #[error("bad request: {0}")]
    InvalidInput(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },
    #[error("function {name} failed: {message}")]
    Function { name: String, message: String },
    #[error("transport error: {0}")]
    Transport(Arc<reqwest::Error>),
    #[error("could not decode backend response: {0}")]
    Decode(String),
    #[error("internal error")]
    Internal(Arc<anyhow::Error>),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Backend { .. } => "BACKEND",
            ApiError::Function { .. } => "FUNCTION",
            ApiError::Transport(_) => "TRANSPORT",
            ApiError::Decode(_) => "DECODE",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::Internal(Arc::new(err))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Maps a non-success table or storage response onto the taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body);
        warn!(status, %message, "backend request rejected");
        match status {
            401 | 403 => ApiError::Unauthorized,
            404 => ApiError::NotFound,
            409 => ApiError::Conflict(message),
            400 | 422 => ApiError::InvalidInput(message),
            _ => ApiError::Backend { status, message },
        }
    }

    /// Maps a failed remote function invocation.
    pub fn from_function(name: &str, status: u16, body: &str) -> Self {
        let message = error_message(body);
        warn!(function = name, status, %message, "function invocation failed");
        match status {
            401 | 403 => ApiError::Unauthorized,
            _ => ApiError::Function {
                name: name.to_string(),
                message,
            },
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    msg: Option<String>,
}

fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error).or(b.msg));
    match parsed {
        Some(message) => message,
        None if body.trim().is_empty() => "no response body".to_string(),
        None => body.trim().to_string(),
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::Decode(value.to_string());
        }
        Self::Transport(Arc::new(value))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_masked() {
        let err = ApiError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "internal error");
        assert_eq!(err.code(), "INTERNAL");
    }

    #[test]
    fn status_mapping_uses_backend_message() {
        let err = ApiError::from_status(422, r#"{"message":"email already used"}"#);
        match err {
            ApiError::InvalidInput(message) => assert_eq!(message, "email already used"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(ApiError::from_status(404, ""), ApiError::NotFound));
        assert!(matches!(ApiError::from_status(403, "{}"), ApiError::Unauthorized));
        assert!(matches!(
            ApiError::from_status(503, "unavailable"),
            ApiError::Backend { status: 503, .. }
        ));
    }

    #[test]
    fn function_errors_carry_name() {
        let err = ApiError::from_function("send-sms", 500, r#"{"error":"carrier down"}"#);
        assert_eq!(err.to_string(), "function send-sms failed: carrier down");
    }

    #[test]
    fn validation_errors_become_invalid_input() {
        let err = ApiError::from(ValidationError::new("email", "must be an email address"));
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(err.to_string(), "bad request: email: must be an email address");
    }
}
