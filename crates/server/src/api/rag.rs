//! `POST /rag`: answer a question from the loaded PDF.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ApiError, ApiResult, NOT_LOADED_MESSAGE};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RagRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct RagResponse {
    pub answer: String,
}

pub async fn rag(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RagRequest>, JsonRejection>,
) -> ApiResult<RagResponse> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
            .reply(state.error_status_codes)
    })?;

    // Snapshot once; a concurrent upload does not change what this question sees.
    let document = state.store.snapshot().await;
    if document.is_empty() {
        warn!("Question received before any PDF was loaded");
        return Err(ApiError::NotLoaded(NOT_LOADED_MESSAGE).reply(state.error_status_codes));
    }

    info!(
        "Question ({} chars) against {} chunks",
        request.query.len(),
        document.chunks.len()
    );

    let answer = state
        .pipeline
        .answer(&request.query, &document.chunks)
        .await
        .map_err(|e| {
            warn!("Generation failed: {}", e);
            ApiError::from(e).reply(state.error_status_codes)
        })?;

    Ok(Json(RagResponse { answer }))
}
