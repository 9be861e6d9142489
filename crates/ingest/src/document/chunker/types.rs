//! Chunk configuration and output types.

use crate::document::ExtractionError;

// ── Configuration ───────────────────────────────────────────────────────────

/// Window parameters. Always satisfies `chunk_size > overlap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkConfig {
    /// Words per chunk and words shared between neighbouring chunks.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ExtractionError> {
        if chunk_size == 0 || chunk_size <= overlap {
            return Err(ExtractionError::InvalidChunkConfig { chunk_size, overlap });
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive window starts. Never zero.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

// ── Chunk output ────────────────────────────────────────────────────────────

/// A window of whitespace-joined words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in document order.
    pub index: usize,
    /// Index of the first word in the document's word sequence.
    pub word_offset: usize,
    /// Up to `chunk_size` words joined by single spaces.
    pub content: String,
}

impl Chunk {
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}
