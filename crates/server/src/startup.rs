//! Loading a PDF from disk before the server starts accepting requests.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::state::AppState;

/// Extract `path` into the store. Any failure, including a missing file,
/// is returned so the caller can refuse to start.
pub async fn load_startup_pdf(state: &AppState, path: &Path) -> anyhow::Result<usize> {
    info!("Loading startup PDF {}", path.display());

    let chunk_config = state.chunk_config;
    let owned: PathBuf = path.to_path_buf();
    let chunks = tokio::task::spawn_blocking(move || {
        docqa_ingest::extract_chunks_from_path(&owned, &chunk_config)
    })
    .await
    .context("startup extraction task panicked")?
    .with_context(|| format!("failed to load startup PDF {}", path.display()))?;

    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let count = state.store.replace(chunks, source).await;
    info!("Startup PDF ready: {} chunks", count);
    Ok(count)
}
