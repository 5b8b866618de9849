//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pushgate_core::ArgumentError;
use pushgate_store::RegistryError;
use serde_json::json;
use tracing::error;

use crate::orchestrator::EnqueueError;

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing request fields (400).
    #[error(transparent)]
    BadRequest(#[from] ArgumentError),

    /// Registry failure; status depends on the variant.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The gateway is shutting down (503).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Unexpected server-side failure (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EnqueueError> for ApiError {
    fn from(err: EnqueueError) -> Self {
        match err {
            EnqueueError::Invalid(e) => Self::BadRequest(e),
            EnqueueError::ShuttingDown => Self::Unavailable(err.to_string()),
        }
    }
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Registry(RegistryError::InvalidArgument(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Registry(RegistryError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Registry(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
