use crate::core::guild_config::ConfigError;
use crate::core::moderation::ActionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// `axum`-compatible error type for the dashboard API.
///
/// Input problems are echoed back verbatim with the offending field names.
/// Everything else is logged here and reported as a generic failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        fields: Vec<String>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid(field: &str, reason: impl std::fmt::Display) -> Self {
        Self::BadRequest {
            message: format!("Invalid {}: {}", field, reason),
            fields: vec![field.to_string()],
        }
    }

    /// A request whose body or query string couldn't be parsed at all.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(ref issues) => Self::BadRequest {
                fields: issues.iter().map(|i| i.field.to_string()).collect(),
                message: err.to_string(),
            },
            ConfigError::StorageError(_) => Self::Internal(err.into()),
        }
    }
}

impl From<ActionError> for ApiError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Validation { field, .. } => Self::BadRequest {
                fields: vec![field.to_string()],
                message: err.to_string(),
            },
            ActionError::NotFound(message) => Self::NotFound(message),
            ActionError::Config(inner) => inner.into(),
            ActionError::Backup(_) | ActionError::Restore(_) | ActionError::StorageError(_) => {
                Self::Internal(err.into())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest { message, fields } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "fields": fields }),
            ),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized" }),
            ),
            ApiError::Internal(err) => {
                error!("{:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
