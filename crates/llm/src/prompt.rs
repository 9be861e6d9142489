//! Prompt assembly.

use docqa_ingest::Chunk;

/// Separator between retrieved chunks in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

const INSTRUCTIONS: &str = "You are an assistant answering questions about a document. \
Use only the context below; if the answer is not in the context, say that the document \
does not cover it. Reply in a warm, conversational human tone without ever saying that \
you are imitating a human, and keep the answer under 200 words.";

/// Wrap the retrieved chunks and the question in the instruction template.
///
/// The result always contains `Question: {query}` and ends with `Answer:`.
pub fn assemble(query: &str, retrieved: &[&Chunk]) -> String {
    let context = retrieved
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    format!("{INSTRUCTIONS}\n\nContext:\n{context}\n\nQuestion: {query}\nAnswer:")
}
