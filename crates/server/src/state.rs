use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use docqa_core::Config;
use docqa_ingest::{Chunk, ChunkConfig, ExtractionError};
use docqa_llm::RagPipeline;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

/// Chunks of the currently loaded PDF plus where they came from.
#[derive(Debug, Default)]
pub struct LoadedDocument {
    pub chunks: Vec<Chunk>,
    pub source: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl LoadedDocument {
    /// A document that produced no chunks answers nothing, so it counts as empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn phase(&self) -> StorePhase {
        if self.is_empty() {
            StorePhase::Empty
        } else {
            StorePhase::Ready
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorePhase {
    Empty,
    Ready,
}

/// Process-wide chunk store.
///
/// Readers clone an `Arc` snapshot and release the lock immediately, so a
/// question being answered keeps the chunk list it started with even if an
/// upload swaps the document halfway through.
#[derive(Debug, Default)]
pub struct ChunkStore {
    current: RwLock<Arc<LoadedDocument>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Arc<LoadedDocument> {
        self.current.read().await.clone()
    }

    /// Replace the whole chunk list in one step. Returns the new chunk count.
    pub async fn replace(&self, chunks: Vec<Chunk>, source: impl Into<String>) -> usize {
        let count = chunks.len();
        let document = Arc::new(LoadedDocument {
            chunks,
            source: Some(source.into()),
            loaded_at: Some(Utc::now()),
        });
        *self.current.write().await = document;
        count
    }
}

/// Shared state behind every handler.
pub struct AppState {
    pub store: ChunkStore,
    pub pipeline: RagPipeline,
    pub chunk_config: ChunkConfig,
    pub upload_path: PathBuf,
    /// Report failures with 4xx/5xx instead of 200.
    pub error_status_codes: bool,
    /// Serializes uploads so the file on disk and the store never disagree.
    pub upload_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: &Config, pipeline: RagPipeline) -> Result<Self, ExtractionError> {
        let chunk_config =
            ChunkConfig::new(config.document.chunk_size, config.document.chunk_overlap)?;
        Ok(Self {
            store: ChunkStore::new(),
            pipeline,
            chunk_config,
            upload_path: config.document.upload_path.clone(),
            error_status_codes: config.server.error_status_codes,
            upload_lock: Mutex::new(()),
        })
    }
}
