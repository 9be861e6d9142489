//! `POST /upload`: replace the loaded PDF.

use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use super::{ApiError, ApiResult, NOT_PDF_MESSAGE};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";
const SUCCESS_MESSAGE: &str = "PDF uploaded and processed successfully.";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub chunks: usize,
}

/// Case-insensitive `.pdf` suffix check on the client-supplied name.
pub fn is_pdf_filename(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf")
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadResponse> {
    let status_codes = state.error_status_codes;
    let (filename, bytes) = read_pdf_field(multipart)
        .await
        .map_err(|e| e.reply(status_codes))?;

    let chunks = store_and_index(&state, &filename, bytes)
        .await
        .map_err(|e| {
            warn!("Upload of '{}' failed: {}", filename, e);
            e.reply(status_codes)
        })?;

    Ok(Json(UploadResponse {
        message: SUCCESS_MESSAGE,
        chunks,
    }))
}

/// Pull the `file` part out of the form and check it names a PDF.
async fn read_pdf_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(String, Vec<u8>), ApiError> {
    let mut multipart =
        multipart.map_err(|e| ApiError::Validation(format!("Multipart error: {}", e.body_text())))?;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(format!("Multipart error: {}", e.body_text())))?
            .ok_or_else(|| ApiError::Validation("No file provided".into()))?;
        if field.name() == Some(UPLOAD_FIELD) {
            return read_file(field).await;
        }
    }
}

async fn read_file(field: Field<'_>) -> Result<(String, Vec<u8>), ApiError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    if !is_pdf_filename(&filename) {
        return Err(ApiError::Validation(NOT_PDF_MESSAGE.into()));
    }
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read file: {}", e.body_text())))?;
    Ok((filename, bytes.to_vec()))
}

/// Extract, then persist to the fixed upload path and swap the store.
///
/// Holds the upload lock throughout so two uploads cannot interleave. A PDF
/// that fails extraction is never written, so the file on disk always
/// matches the chunks being served.
async fn store_and_index(state: &AppState, filename: &str, bytes: Vec<u8>) -> Result<usize, ApiError> {
    let _guard = state.upload_lock.lock().await;

    let chunk_config = state.chunk_config;
    let (bytes, chunks) = tokio::task::spawn_blocking(move || {
        let chunks = docqa_ingest::extract_chunks(&bytes, &chunk_config);
        (bytes, chunks)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Extraction task failed: {}", e)))?;
    let chunks = chunks?;

    if let Some(parent) = state.upload_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to create upload dir: {}", e)))?;
    }
    tokio::fs::write(&state.upload_path, &bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save file: {}", e)))?;
    info!(
        "Saved '{}' ({} bytes) to {}",
        filename,
        bytes.len(),
        state.upload_path.display()
    );

    let count = state.store.replace(chunks, filename).await;
    info!("Loaded '{}': {} chunks", filename, count);
    Ok(count)
}
