//! HTTP endpoints.
//!
//! Failures are returned as `{"error": "..."}`. Whether they carry HTTP 200
//! or a real status code is decided per deployment by `ERROR_STATUS_CODES`.

mod health;
mod rag;
mod upload;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docqa_ingest::ExtractionError;
use docqa_llm::LlmError;
use serde::Serialize;

pub use health::health;
pub use rag::rag;
pub use upload::upload;

pub const NOT_LOADED_MESSAGE: &str = "PDF data not loaded. Please upload a PDF or check server logs.";
pub const NOT_PDF_MESSAGE: &str = "Only PDF files are supported.";

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Everything a handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request itself is unusable.
    #[error("{0}")]
    Validation(String),
    /// The service cannot answer yet.
    #[error("{0}")]
    NotLoaded(&'static str),
    #[error("Failed to process PDF: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Failed to generate answer: {0}")]
    Generation(#[from] LlmError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Status used when status-code reporting is switched on.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::NotLoaded(_) | ApiError::Extraction(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Generation(LlmError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Generation(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render for the wire. With `status_codes` off every error is a 200.
    pub fn reply(self, status_codes: bool) -> ErrorReply {
        let status = if status_codes {
            self.status()
        } else {
            StatusCode::OK
        };
        ErrorReply {
            status,
            body: ErrorResponse {
                error: self.to_string(),
            },
        }
    }
}

/// A rendered error, ready to be returned from a handler.
#[derive(Debug)]
pub struct ErrorReply {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ErrorReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ErrorReply>;
