//! Error types for model management and API responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the model management core
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by providers, the unified manager and the model store
#[derive(Debug, Error)]
pub enum ModelError {
    /// Generic provider or transport failure
    #[error("{message}")]
    Provider { message: String },

    /// The provider explicitly reported that the model does not exist
    #[error("Model not found: {model_id}")]
    NotFound { model_id: String },

    /// The install action itself failed
    #[error("Failed to install model {model_id}: {reason}")]
    Installation { model_id: String, reason: String },

    /// Identifier is missing the `<source>/<name>` separator or a component is empty
    #[error("Invalid model ID format: {model_id}")]
    InvalidModelId { model_id: String },

    /// Identifier prefix does not name a supported provider
    #[error("Unknown model source: {source_tag}")]
    UnknownSource { source_tag: String },

    /// Default-model target is not installed according to its provider
    #[error("Model not found or not installed: {model_id}")]
    NotInstalled { model_id: String },

    #[error("Metadata not found for model: {model_id}")]
    MetadataNotFound { model_id: String },

    #[error("Failed to load metadata for model {model_id}: {reason}")]
    MetadataLoad { model_id: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    pub fn installation(model_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::Installation {
            model_id: model_id.into(),
            reason: reason.to_string(),
        }
    }

    /// Caller-input errors, validated before any provider is contacted
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidModelId { .. } | Self::UnknownSource { .. } | Self::NotInstalled { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::MetadataNotFound { .. })
    }
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BadGateway(msg) => {
                tracing::warn!(error = %msg, "Provider action failed");
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            timestamp: chrono::Utc::now(),
        });

        (status, body).into_response()
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        if err.is_invalid_input() {
            ApiError::BadRequest(err.to_string())
        } else if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if matches!(err, ModelError::Installation { .. }) {
            ApiError::BadGateway(err.to_string())
        } else {
            ApiError::Internal(err.into())
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_classification() {
        assert!(
            ModelError::InvalidModelId {
                model_id: "x".into()
            }
            .is_invalid_input()
        );
        assert!(
            ModelError::UnknownSource {
                source_tag: "x".into()
            }
            .is_invalid_input()
        );
        assert!(!ModelError::provider("boom").is_invalid_input());
        assert!(!ModelError::installation("x", "boom").is_invalid_input());
    }

    #[test]
    fn test_messages_are_distinguishable() {
        let invalid = ModelError::InvalidModelId {
            model_id: "bad".into(),
        }
        .to_string();
        let missing = ModelError::NotInstalled {
            model_id: "hf/x".into(),
        }
        .to_string();
        assert!(invalid.starts_with("Invalid model ID format"));
        assert!(missing.starts_with("Model not found or not installed"));
    }

    #[test]
    fn test_api_error_status_mapping() {
        let resp = ApiError::from(ModelError::UnknownSource {
            source_tag: "nope".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::from(ModelError::NotFound {
            model_id: "x".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError::from(ModelError::installation("x", "pull failed")).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = ApiError::from(ModelError::provider("timeout")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
