//! Document ingestion: PDF text extraction and word-window chunking.

pub mod document;

pub use document::chunker::{chunk_words, Chunk, ChunkConfig};
pub use document::{extract_chunks, extract_chunks_from_path, ExtractionError};
