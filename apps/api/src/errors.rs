use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::ProviderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    /// Model output could not be turned into the stage's required shape.
    #[error("Stage '{stage}' returned invalid output: {reason}")]
    ContractViolation { stage: &'static str, reason: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(kind: &str, id: &str) -> Self {
        AppError::NotFound(format!("{kind} not found: {id}"))
    }

    pub fn contract(stage: &'static str, reason: impl Into<String>) -> Self {
        AppError::ContractViolation {
            stage,
            reason: reason.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ContractViolation { .. } => {
                tracing::warn!("{self}");
                (StatusCode::BAD_GATEWAY, "CONTRACT_VIOLATION", self.to_string())
            }
            AppError::Provider(ProviderError::Configuration(msg)) => {
                tracing::error!("Provider configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PROVIDER_CONFIG_ERROR",
                    msg.clone(),
                )
            }
            AppError::Provider(ProviderError::Authentication(msg)) => {
                tracing::error!("Provider authentication error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PROVIDER_AUTH_ERROR",
                    msg.clone(),
                )
            }
            AppError::Provider(e @ ProviderError::Upstream { .. }) => {
                tracing::error!("Upstream LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "The AI provider failed to answer".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
