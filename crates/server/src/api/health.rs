//! Liveness plus what document, if any, is loaded.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::{AppState, StorePhase};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub state: StorePhase,
    pub chunks: usize,
    pub source: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let document = state.store.snapshot().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        state: document.phase(),
        chunks: document.chunks.len(),
        source: document.source.clone(),
        loaded_at: document.loaded_at,
    })
}
