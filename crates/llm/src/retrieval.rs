//! Substring retrieval over the loaded chunks.
//!
//! Not a relevance ranking: chunks are split into "contains the query" and
//! "does not", each kept in document order, and the first `top_k` are taken.

use docqa_ingest::Chunk;

pub const DEFAULT_TOP_K: usize = 3;

/// Case-insensitive substring test.
fn matches(query_lower: &str, chunk: &Chunk) -> bool {
    chunk.content.to_lowercase().contains(query_lower)
}

/// Up to `top_k` chunks, matching ones first.
///
/// When fewer than `top_k` chunks match, the result is padded with
/// non-matching chunks in document order, so callers must not assume every
/// returned chunk is relevant. Length is always `min(top_k, chunks.len())`.
pub fn retrieve<'a>(query: &str, chunks: &'a [Chunk], top_k: usize) -> Vec<&'a Chunk> {
    let query_lower = query.to_lowercase();
    let mut ranked: Vec<(bool, &Chunk)> = chunks
        .iter()
        .map(|c| (matches(&query_lower, c), c))
        .collect();
    // stable: ties keep document order
    ranked.sort_by_key(|(hit, _)| !*hit);
    ranked.into_iter().take(top_k).map(|(_, c)| c).collect()
}

/// How many chunks contain the query at all.
pub fn match_count(query: &str, chunks: &[Chunk]) -> usize {
    let query_lower = query.to_lowercase();
    chunks.iter().filter(|c| matches(&query_lower, c)).count()
}
