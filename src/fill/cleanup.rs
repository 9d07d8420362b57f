//! Post-passes run after substitution.

use crate::model::{Block, Document, Paragraph};

use super::options::FormatOverride;

/// Apply a font override to every run of every non-empty top-level
/// paragraph after `content_end` (closing line, signature block).
///
/// Returns the number of paragraphs formatted. Running it again changes
/// nothing.
pub fn format_trailing(doc: &mut Document, content_end: usize, format: &FormatOverride) -> usize {
    let mut formatted = 0;
    for block in doc.blocks.iter_mut().skip(content_end + 1) {
        if let Block::Paragraph(p) = block {
            if p.plain_text().trim().is_empty() {
                continue;
            }
            for run in p.runs_mut() {
                format.apply(&mut run.properties);
            }
            formatted += 1;
        }
    }
    formatted
}

/// Collapse consecutive blank paragraphs directly after `index` to one.
///
/// Marker blocks between the paragraphs are skipped and kept. Returns the
/// number of paragraphs removed.
pub fn collapse_blank_after(doc: &mut Document, index: usize) -> usize {
    let mut blanks = Vec::new();
    let mut at = index;
    while let Some(next) = doc.next_paragraph(at) {
        if !doc.blocks[next].as_paragraph().map_or(false, Paragraph::is_blank) {
            break;
        }
        blanks.push(next);
        at = next;
    }
    if blanks.len() <= 1 {
        return 0;
    }

    // Keep the first blank; remove the rest highest first.
    for &extra in blanks[1..].iter().rev() {
        doc.blocks.remove(extra);
    }
    let removed = blanks.len() - 1;
    log::debug!("Collapsed {} blank paragraphs after the date", removed);
    removed
}
