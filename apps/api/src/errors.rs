use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::generation::composer::PromptError;
use crate::generation::workflow::WorkflowError;
use crate::llm_client::CompletionError;
use crate::templates::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Completion(e) => AppError::Completion(e),
            WorkflowError::Prompt(e) => AppError::Prompt(e),
        }
    }
}

/// `{"code", "message"}` pair carried in every error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    /// HTTP status and machine-readable body for this error.
    pub fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Store(StoreError::InvalidName(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.to_string())
            }
            AppError::Store(StoreError::Io(e)) => {
                tracing::error!("Template storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A template storage error occurred".to_string(),
                )
            }
            AppError::Completion(e) => {
                let (status, code) = match e {
                    CompletionError::CredentialMissing { .. } => {
                        (StatusCode::SERVICE_UNAVAILABLE, "CREDENTIAL_MISSING")
                    }
                    CompletionError::Backend { .. } => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
                    CompletionError::Timeout { .. } => {
                        (StatusCode::GATEWAY_TIMEOUT, "BACKEND_TIMEOUT")
                    }
                    CompletionError::EmptyResponse { .. } => {
                        (StatusCode::BAD_GATEWAY, "BACKEND_EMPTY_RESPONSE")
                    }
                };
                tracing::error!(backend = %e.backend(), "Completion error: {e}");
                (status, code, e.to_string())
            }
            AppError::Prompt(e) => (StatusCode::BAD_REQUEST, "MISSING_BINDING", e.to_string()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };
        (status, ErrorBody { code, message })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_body();
        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Backend;
    use std::time::Duration;

    #[test]
    fn test_completion_errors_map_to_distinct_codes() {
        let cases = [
            (
                CompletionError::CredentialMissing {
                    backend: Backend::Anthropic,
                    variable: "ANTHROPIC_API_KEY",
                },
                StatusCode::SERVICE_UNAVAILABLE,
                "CREDENTIAL_MISSING",
            ),
            (
                CompletionError::Backend {
                    backend: Backend::OpenAi,
                    message: "quota".to_string(),
                },
                StatusCode::BAD_GATEWAY,
                "BACKEND_ERROR",
            ),
            (
                CompletionError::Timeout {
                    backend: Backend::OpenAi,
                    after: Duration::from_secs(10),
                },
                StatusCode::GATEWAY_TIMEOUT,
                "BACKEND_TIMEOUT",
            ),
            (
                CompletionError::EmptyResponse {
                    backend: Backend::Anthropic,
                },
                StatusCode::BAD_GATEWAY,
                "BACKEND_EMPTY_RESPONSE",
            ),
        ];
        for (err, status, code) in cases {
            let (got_status, body) = AppError::from(err).status_and_body();
            assert_eq!(got_status, status);
            assert_eq!(body.code, code);
        }
    }

    #[test]
    fn test_backend_message_is_surfaced_verbatim() {
        let err = AppError::from(WorkflowError::Completion(CompletionError::Backend {
            backend: Backend::OpenAi,
            message: "You exceeded your current quota".to_string(),
        }));
        let (_, body) = err.status_and_body();
        assert!(body.message.contains("You exceeded your current quota"));
    }

    #[test]
    fn test_missing_binding_is_bad_request() {
        let err = AppError::from(WorkflowError::Prompt(PromptError::MissingBinding {
            slot: "company".to_string(),
        }));
        let (status, body) = err.status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "MISSING_BINDING");
        assert!(body.message.contains("company"));
    }

    #[test]
    fn test_store_io_error_hides_details() {
        let err = AppError::from(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/secret/path",
        )));
        let (status, body) = err.status_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("/secret/path"));
    }
}
