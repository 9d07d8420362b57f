//! Plain text rendering for Word documents.

use crate::error::Result;
use crate::model::Document;

/// Convert a document to plain text.
///
/// Paragraphs become lines; table cells are tab-separated, one row per line.
pub fn to_text(doc: &Document) -> Result<String> {
    let output = doc.plain_text();
    Ok(output.trim_end().to_string())
}
