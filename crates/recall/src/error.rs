//! Error types for the Recall gateway
//!
//! Every failure a handler can hit maps onto one of these variants. The
//! `IntoResponse` impl logs the error with its category and renders the
//! flat `{"error": "..."}` body clients expect.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing or invalid fields in a client request
    #[error("{0}")]
    MalformedRequest(String),

    /// Memory backend unreachable or rejected the operation
    #[error("Memory store error: {0}")]
    StoreFailure(String),

    /// Backend LLM unreachable or the transport failed
    #[error("Upstream error: {0}")]
    UpstreamFailure(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            GatewayError::MalformedRequest(_) => "request",
            GatewayError::StoreFailure(_) => "store",
            GatewayError::UpstreamFailure(_) => "upstream",
            GatewayError::Config(_) => "config",
            GatewayError::Io(_) => "io",
        }
    }

    pub(crate) fn log(&self) {
        if self.status().is_client_error() {
            tracing::warn!(
                error_type = self.category(),
                error_message = %self,
                "Rejected request"
            );
        } else {
            tracing::error!(
                error_type = self.category(),
                error_message = %self,
                "Request failed"
            );
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.log();
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
