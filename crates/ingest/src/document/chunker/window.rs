use super::types::{Chunk, ChunkConfig};

/// Slide the window over `text`'s words.
///
/// Starts are `0, step, 2*step, ..` for every start below the word count, so
/// the result has `ceil(words / step)` chunks and the tail chunk may be short.
pub fn chunk_words(text: &str, config: &ChunkConfig) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();

    (0..words.len())
        .step_by(config.step())
        .enumerate()
        .map(|(index, start)| {
            let end = (start + config.chunk_size()).min(words.len());
            Chunk {
                index,
                word_offset: start,
                content: words[start..end].join(" "),
            }
        })
        .collect()
}
