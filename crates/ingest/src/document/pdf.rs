use std::panic;

use super::{ExtractionError, PageContent};

/// Page separator emitted by pdf-extract between pages.
const PAGE_BREAK: char = '\x0C';

pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageContent>, ExtractionError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let text = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|payload| ExtractionError::Pdf(panic_message(payload)))?
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    Ok(split_pages(&text))
}

/// Split pdf-extract output on form feeds. Whitespace-only pages become `None`.
fn split_pages(text: &str) -> Vec<PageContent> {
    text.split(PAGE_BREAK)
        .enumerate()
        .map(|(i, page_text)| {
            let trimmed = page_text.trim();
            PageContent {
                page_number: i + 1,
                text: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            }
        })
        .collect()
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("parser panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("parser panicked: {s}")
    } else {
        "parser panicked".to_string()
    }
}
