use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::gateway::GatewayError;
use crate::store::StoreError;
use crate::streak::RecordError;

/// Every failure a handler can return, with its HTTP mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}")]
    Validation {
        message: String,
        details: Option<String>,
    },

    /// The store refused a write; the message is passed through.
    #[error("{0}")]
    InsertRejected(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{error}: {source}")]
    Generation {
        error: &'static str,
        source: GatewayError,
    },

    #[error("no transcript available for video {video_id}")]
    TranscriptUnavailable {
        video_id: String,
        attempts: Vec<String>,
    },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Wrap a gateway failure with the user-facing summary for its endpoint.
    pub fn generation(error: &'static str) -> impl FnOnce(GatewayError) -> AppError {
        move |source| AppError::Generation { error, source }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. } | AppError::InsertRejected(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::TranscriptUnavailable { .. } => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Generation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            AppError::Validation {
                message,
                details: Some(details),
            } => json!({ "error": message, "details": details }),
            AppError::Generation { error, source } => {
                json!({ "error": error, "details": source.to_string() })
            }
            AppError::TranscriptUnavailable { video_id, attempts } => json!({
                "error": "Failed to extract transcript from video",
                "details": "All transcript extraction methods failed",
                "videoId": video_id,
                "attemptedMethods": attempts,
            }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Insert(message) => AppError::InsertRejected(message),
            RecordError::Streak(e) => AppError::Store(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation_with("Invalid request body", rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}
