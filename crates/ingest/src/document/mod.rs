pub mod chunker;
mod pdf;

use std::path::Path;

use thiserror::Error;

use chunker::{chunk_words, Chunk, ChunkConfig};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF file not found at {0}")]
    NotFound(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("chunk_size ({chunk_size}) must be greater than overlap ({overlap})")]
    InvalidChunkConfig { chunk_size: usize, overlap: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A page of extracted text.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number.
    pub page_number: usize,
    /// The extracted text content, `None` when the page yielded nothing.
    pub text: Option<String>,
}

/// Result of extracting text from a PDF.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub pages: Vec<PageContent>,
}

impl ExtractedDocument {
    /// All page text, each page followed by a newline. Pages without
    /// extractable text contribute nothing, not even the newline.
    pub fn full_text(&self) -> String {
        pages_to_text(self.pages.iter().map(|p| p.text.as_deref()))
    }

    /// Number of pages that produced text.
    pub fn text_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.text.is_some()).count()
    }
}

/// Concatenate per-page text, skipping empty or absent pages.
pub fn pages_to_text<'a>(pages: impl IntoIterator<Item = Option<&'a str>>) -> String {
    let mut text = String::new();
    for page in pages.into_iter().flatten() {
        if page.is_empty() {
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }
    text
}

/// Parse PDF bytes into pages.
pub fn extract_document(bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
    let pages = pdf::extract_pdf(bytes)?;
    Ok(ExtractedDocument { pages })
}

/// Extract and chunk a PDF held in memory.
pub fn extract_chunks(bytes: &[u8], config: &ChunkConfig) -> Result<Vec<Chunk>, ExtractionError> {
    let doc = extract_document(bytes)?;
    let chunks = chunk_words(&doc.full_text(), config);
    tracing::info!(
        "Extracted {} pages ({} with text) into {} chunks",
        doc.pages.len(),
        doc.text_pages(),
        chunks.len()
    );
    Ok(chunks)
}

/// Extract and chunk a PDF on disk.
pub fn extract_chunks_from_path(
    path: &Path,
    config: &ChunkConfig,
) -> Result<Vec<Chunk>, ExtractionError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractionError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    extract_chunks(&bytes, config)
}
