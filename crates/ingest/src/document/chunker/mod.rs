//! Fixed-size word-window chunking.
//!
//! Splits extracted text on whitespace and slides a `chunk_size` window over
//! the word sequence with stride `chunk_size - overlap`.

mod types;
mod window;

pub use types::{Chunk, ChunkConfig};
pub use window::chunk_words;
