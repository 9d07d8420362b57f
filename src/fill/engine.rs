//! Placeholder substitution over the document model.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Block, Document, InlineContent, Paragraph, RunContent, Table, TextRun, TextStyle};

use super::cleanup;
use super::options::{FillOptions, SubstitutionPolicy};
use super::placeholder::{Placeholder, PlaceholderMap};
use super::report::{FillReport, FillWarning, Location};

/// Separator between paragraphs in a body value.
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Substitute placeholders in a document, in place.
///
/// Top-level paragraphs and table cells are scanned in document order.
/// A paragraph holding `<<Addressee>>` is removed when the addressee is
/// empty, together with the blank paragraph right after it. A body value
/// with blank-line separators is split into consecutive paragraphs with the
/// source paragraph's properties. Inside table cells neither removal nor
/// splitting happens.
///
/// # Example
/// ```
/// use letterfill::fill::{substitute, FillOptions, Placeholder, PlaceholderMap};
/// use letterfill::{Document, Paragraph};
///
/// let mut doc = Document::new();
/// doc.add_paragraph(Paragraph::with_text("<<Salutation>>"));
///
/// let map = PlaceholderMap::new().with(Placeholder::Salutation, "Dear Sir,");
/// let report = substitute(&mut doc, &map, &FillOptions::default());
///
/// assert_eq!(doc.paragraph_texts(), vec!["Dear Sir,"]);
/// assert!(report.is_applied(Placeholder::Salutation));
/// ```
pub fn substitute(
    doc: &mut Document,
    placeholders: &PlaceholderMap,
    options: &FillOptions,
) -> FillReport {
    let mut filler = Filler::new(placeholders, options);
    filler.scan(doc);
    filler.finish(doc)
}

/// Result of visiting one paragraph.
enum Visit {
    /// No placeholder in the paragraph
    Skipped,
    /// Placeholders substituted; `extra` paragraphs go right after it
    Filled {
        placeholders: Vec<Placeholder>,
        extra: Vec<Paragraph>,
    },
    /// The paragraph is to be removed
    Remove,
}

struct Filler<'a> {
    options: &'a FillOptions,
    /// Supplied values with line endings normalised to `\n`
    values: Vec<(Placeholder, String)>,
    drop_addressee: bool,
    report: FillReport,
    marked: BTreeSet<usize>,
    content_end: Option<usize>,
    date_paragraph: Option<usize>,
    found_any: bool,
}

impl<'a> Filler<'a> {
    fn new(placeholders: &PlaceholderMap, options: &'a FillOptions) -> Self {
        let values = placeholders
            .iter()
            .map(|(p, v)| (p, v.replace("\r\n", "\n").replace('\r', "\n")))
            .collect();
        let drop_addressee = placeholders
            .get(Placeholder::Addressee)
            .map_or(false, |v| v.trim().is_empty());

        Self {
            options,
            values,
            drop_addressee,
            report: FillReport::new(placeholders),
            marked: BTreeSet::new(),
            content_end: None,
            date_paragraph: None,
            found_any: false,
        }
    }

    fn value(&self, placeholder: Placeholder) -> &str {
        self.values
            .iter()
            .find(|(p, _)| *p == placeholder)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    fn scan(&mut self, doc: &mut Document) {
        let mut index = 0;
        while index < doc.blocks.len() {
            if self.marked.contains(&index) {
                index += 1;
                continue;
            }

            let visit = match &mut doc.blocks[index] {
                Block::Paragraph(p) => self.visit_paragraph(p, Location::Body { block: index }, true),
                Block::Table(t) => {
                    self.visit_table(t, index);
                    Visit::Skipped
                }
                Block::Other(_) => Visit::Skipped,
            };

            match visit {
                Visit::Skipped => index += 1,
                Visit::Remove => {
                    self.mark_for_removal(doc, index);
                    index += 1;
                }
                Visit::Filled {
                    placeholders,
                    extra,
                } => {
                    let added = extra.len();
                    for (offset, paragraph) in extra.into_iter().enumerate() {
                        doc.insert_block(index + 1 + offset, Block::Paragraph(paragraph));
                    }
                    if added > 0 {
                        self.shift_marks(index, added);
                        self.report.paragraphs_inserted += added;
                        log::debug!("Split letter body into {} paragraphs", added + 1);
                    }

                    if placeholders.contains(&Placeholder::Date) {
                        self.date_paragraph = Some(index);
                    }
                    if placeholders.contains(&Placeholder::Body) {
                        self.content_end = Some(index + added);
                    }
                    index += 1 + added;
                }
            }
        }
    }

    fn visit_table(&mut self, table: &mut Table, block: usize) {
        for (r, row) in table.rows.iter_mut().enumerate() {
            for (c, cell) in row.cells.iter_mut().enumerate() {
                for (k, item) in cell.content.iter_mut().enumerate() {
                    match item {
                        Block::Paragraph(p) => {
                            let location = Location::Cell {
                                block,
                                row: r,
                                cell: c,
                                paragraph: k,
                            };
                            self.visit_paragraph(p, location, false);
                        }
                        Block::Table(nested) => self.visit_table(nested, block),
                        Block::Other(_) => {}
                    }
                }
            }
        }
    }

    fn visit_paragraph(&mut self, p: &mut Paragraph, location: Location, top_level: bool) -> Visit {
        let text = p.plain_text();
        let found: Vec<Placeholder> = self
            .values
            .iter()
            .map(|(ph, _)| *ph)
            .filter(|ph| text.contains(ph.token()))
            .collect();
        if found.is_empty() {
            return Visit::Skipped;
        }
        self.found_any = true;

        if top_level && self.drop_addressee && found.contains(&Placeholder::Addressee) {
            for placeholder in &found {
                self.report.record_removed(*placeholder);
            }
            log::debug!("Removing {} (empty addressee)", location);
            return Visit::Remove;
        }

        let expand = top_level
            && found.contains(&Placeholder::Body)
            && self.value(Placeholder::Body).contains(PARAGRAPH_SEPARATOR);

        let extra = match self.options.policy {
            SubstitutionPolicy::PreserveFormatting => self.fill_preserving(p, &text, &found, expand),
            SubstitutionPolicy::InRun => self.fill_in_run(p, &text, &found, expand, location),
        };
        log::debug!("Filled {:?} at {}", found, location);

        Visit::Filled {
            placeholders: found,
            extra,
        }
    }

    /// Rebuild the paragraph as one run styled like the run holding the token.
    fn fill_preserving(
        &mut self,
        p: &mut Paragraph,
        text: &str,
        found: &[Placeholder],
        expand: bool,
    ) -> Vec<Paragraph> {
        let style = capture_style(p, text, found);
        let (replaced, counts) = self.replace_tokens(text, found);
        for (placeholder, n) in counts {
            self.report.record_replaced(placeholder, n);
        }

        let chunks = if expand {
            split_paragraphs(&replaced)
        } else {
            vec![replaced.as_str()]
        };

        rebuild_paragraph(p, self.styled_run(chunks[0], &style));
        chunks[1..]
            .iter()
            .map(|chunk| {
                let mut paragraph = p.sibling();
                paragraph.add_run(self.styled_run(chunk, &style));
                paragraph
            })
            .collect()
    }

    /// Replace inside each text item of each run; formatting is untouched.
    fn fill_in_run(
        &mut self,
        p: &mut Paragraph,
        text: &str,
        found: &[Placeholder],
        expand: bool,
        location: Location,
    ) -> Vec<Paragraph> {
        let mut totals: BTreeMap<Placeholder, usize> = BTreeMap::new();
        let mut body_run = None;

        for (i, item) in p.content.iter_mut().enumerate() {
            let run = match item {
                InlineContent::Run(run) => run,
                InlineContent::Other(_) => continue,
            };

            let mut touched = false;
            let mut content = Vec::with_capacity(run.content.len());
            for piece in run.content.drain(..) {
                match piece {
                    RunContent::Text(s) if found.iter().any(|ph| s.contains(ph.token())) => {
                        let (new_text, counts) = self.replace_tokens(&s, found);
                        for (placeholder, n) in counts {
                            *totals.entry(placeholder).or_default() += n;
                            if placeholder == Placeholder::Body && n > 0 && body_run.is_none() {
                                body_run = Some(i);
                            }
                        }
                        content.extend(TextRun::new(new_text).content);
                        touched = true;
                    }
                    other => content.push(other),
                }
            }
            run.content = content;

            if touched {
                if let Some(ref format) = self.options.format_override {
                    format.apply(&mut run.properties);
                }
            }
        }

        for &placeholder in found {
            let expected = text.matches(placeholder.token()).count();
            let replaced = totals.get(&placeholder).copied().unwrap_or(0);
            self.report.record_replaced(placeholder, replaced);
            if replaced < expected {
                self.report.warn(FillWarning::SplitToken {
                    placeholder,
                    location,
                });
            }
        }

        match body_run {
            Some(i) if expand => split_at_run(p, i),
            _ => Vec::new(),
        }
    }

    /// Replace every token occurrence in one left-to-right pass, so values
    /// that look like tokens are never substituted again.
    fn replace_tokens(&self, text: &str, found: &[Placeholder]) -> (String, Vec<(Placeholder, usize)>) {
        let mut counts = vec![0usize; found.len()];
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        loop {
            let next = found
                .iter()
                .enumerate()
                .filter_map(|(i, ph)| rest.find(ph.token()).map(|pos| (pos, i)))
                .min();
            match next {
                Some((pos, i)) => {
                    out.push_str(&rest[..pos]);
                    out.push_str(self.value(found[i]));
                    counts[i] += 1;
                    rest = &rest[pos + found[i].token().len()..];
                }
                None => {
                    out.push_str(rest);
                    break;
                }
            }
        }

        (out, found.iter().copied().zip(counts).collect())
    }

    fn styled_run(&self, text: &str, style: &TextStyle) -> TextRun {
        let mut run = TextRun::styled(text, style);
        if let Some(ref format) = self.options.format_override {
            format.apply(&mut run.properties);
        }
        run
    }

    /// Mark a paragraph and, when blank, the paragraph after it. Markers
    /// in between (whitespace, bookmarks) are left in place.
    fn mark_for_removal(&mut self, doc: &Document, index: usize) {
        self.marked.insert(index);
        let blank_next = doc.next_paragraph(index).filter(|&next| {
            doc.blocks[next]
                .as_paragraph()
                .map_or(false, Paragraph::is_blank)
        });
        if let Some(next) = blank_next {
            self.marked.insert(next);
        }
    }

    fn shift_marks(&mut self, after: usize, by: usize) {
        self.marked = self
            .marked
            .iter()
            .map(|&m| if m > after { m + by } else { m })
            .collect();
    }

    fn finish(mut self, doc: &mut Document) -> FillReport {
        // Highest index first so the remaining indices stay valid.
        let marked = std::mem::take(&mut self.marked);
        for &index in marked.iter().rev() {
            if doc.remove_block(index).is_some() {
                self.report.paragraphs_removed += 1;
                shift_after_removal(&mut self.content_end, index);
                shift_after_removal(&mut self.date_paragraph, index);
            } else {
                self.report.warn(FillWarning::RemovalSkipped { block: index });
            }
        }

        if let (Some(format), Some(end)) = (&self.options.format_override, self.content_end) {
            if self.options.format_trailing {
                let formatted = cleanup::format_trailing(doc, end, format);
                log::debug!("Applied font override to {} trailing paragraphs", formatted);
            }
        }

        if self.options.collapse_blank_after_date {
            if let Some(date) = self.date_paragraph {
                self.report.paragraphs_removed += cleanup::collapse_blank_after(doc, date);
            }
        }

        if !self.found_any {
            self.report.warn(FillWarning::NoPlaceholders);
        }

        self.report
    }
}

fn shift_after_removal(marker: &mut Option<usize>, removed: usize) {
    if let Some(m) = marker {
        if *m > removed {
            *m -= 1;
        }
    }
}

/// Formatting of the run that holds a token.
///
/// Prefers the first run containing a whole token; when every token is
/// split across runs, the run where the earliest token starts.
fn capture_style(p: &Paragraph, text: &str, found: &[Placeholder]) -> TextStyle {
    let holder = p.runs().find(|run| {
        let run_text = run.text();
        found.iter().any(|ph| run_text.contains(ph.token()))
    });
    if let Some(run) = holder {
        return run.style();
    }

    if let Some(start) = found.iter().filter_map(|ph| text.find(ph.token())).min() {
        let mut offset = 0;
        for run in p.runs() {
            offset += run.text().len();
            if start < offset {
                return run.style();
            }
        }
    }

    p.runs().next().map(TextRun::style).unwrap_or_default()
}

/// Replace the text runs of a paragraph with a single run.
///
/// The run takes the place of the first run. Non-run content (bookmarks,
/// hyperlinks) stays; runs holding drawings or fields keep those and lose
/// their text.
fn rebuild_paragraph(p: &mut Paragraph, run: TextRun) {
    let mut insert_at = None;
    let mut kept = Vec::with_capacity(p.content.len());

    for item in p.content.drain(..) {
        match item {
            InlineContent::Run(mut old) => {
                if insert_at.is_none() {
                    insert_at = Some(kept.len());
                }
                if old.has_embedded_content() {
                    old.content.retain(|c| matches!(c, RunContent::Other(_)));
                    kept.push(InlineContent::Run(old));
                }
            }
            other => kept.push(other),
        }
    }

    let at = insert_at.unwrap_or(kept.len());
    kept.insert(at, InlineContent::Run(run));
    p.content = kept;
}

/// Split text into paragraph chunks at blank lines, dropping empty chunks.
fn split_paragraphs(text: &str) -> Vec<&str> {
    let chunks: Vec<&str> = text
        .split(PARAGRAPH_SEPARATOR)
        .map(|c| c.trim_matches('\n'))
        .filter(|c| !c.trim().is_empty())
        .collect();
    if chunks.is_empty() {
        vec![""]
    } else {
        chunks
    }
}

/// Split a paragraph at the run holding the body text.
///
/// The run keeps the first chunk; each further chunk becomes a sibling
/// paragraph with a run of the same properties. Content after the run
/// moves to the last new paragraph.
fn split_at_run(p: &mut Paragraph, index: usize) -> Vec<Paragraph> {
    let (properties, chunks) = match p.content.get(index) {
        Some(InlineContent::Run(run)) => {
            let text = run.text();
            let chunks: Vec<String> = split_paragraphs(&text)
                .into_iter()
                .map(str::to_string)
                .collect();
            (run.properties.clone(), chunks)
        }
        _ => return Vec::new(),
    };
    if chunks.len() < 2 {
        return Vec::new();
    }

    let tail = p.content.split_off(index + 1);
    if let Some(InlineContent::Run(run)) = p.content.last_mut() {
        run.set_text(&chunks[0]);
    }

    let mut extra: Vec<Paragraph> = chunks[1..]
        .iter()
        .map(|chunk| {
            let mut run = TextRun {
                properties: properties.clone(),
                ..TextRun::default()
            };
            run.set_text(chunk);
            let mut paragraph = p.sibling();
            paragraph.add_run(run);
            paragraph
        })
        .collect();

    if let Some(last) = extra.last_mut() {
        last.content.extend(tail);
    }
    extra
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::FormatOverride;
    use crate::model::TableCell;
    use crate::model::TableRow;

    fn letter_map() -> PlaceholderMap {
        PlaceholderMap::new()
            .with(Placeholder::Date, "May 1, 2024")
            .with(Placeholder::Addressee, "")
            .with(Placeholder::Salutation, "Dear Sir,")
            .with(Placeholder::Body, "Para one.\n\nPara two.")
    }

    fn doc_with(texts: &[&str]) -> Document {
        let mut doc = Document::new();
        for text in texts {
            doc.add_paragraph(Paragraph::with_text(*text));
        }
        doc
    }

    /// A paragraph whose runs split the text at the given boundaries.
    fn split_paragraph(pieces: &[(&str, TextStyle)]) -> Paragraph {
        let mut p = Paragraph::new();
        for (text, style) in pieces {
            p.add_run(TextRun::styled(*text, style));
        }
        p
    }

    fn bold() -> TextStyle {
        TextStyle {
            bold: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_letter_scenario() {
        let mut doc = doc_with(&[
            "<<Date>>",
            "<<Addressee>>",
            "",
            "<<Salutation>>",
            "<<Enter text here>>",
        ]);
        let report = substitute(&mut doc, &letter_map(), &FillOptions::default());

        assert_eq!(
            doc.paragraph_texts(),
            vec!["May 1, 2024", "Dear Sir,", "Para one.", "Para two."]
        );
        assert_eq!(report.paragraphs_inserted, 1);
        assert_eq!(report.paragraphs_removed, 2);
        assert_eq!(
            report.outcome(Placeholder::Addressee),
            Some(crate::fill::PlaceholderOutcome::Removed)
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_non_empty_addressee_keeps_blank_line() {
        let mut doc = doc_with(&["<<Addressee>>", "", "<<Salutation>>"]);
        let map = letter_map().with(Placeholder::Addressee, "Admissions Committee");
        substitute(&mut doc, &map, &FillOptions::default());

        assert_eq!(
            doc.paragraph_texts(),
            vec!["Admissions Committee", "", "Dear Sir,"]
        );
    }

    #[test]
    fn test_addressee_removal_skips_markers() {
        use crate::xml::{XmlElement, XmlNode};

        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("<<Addressee>>"));
        doc.add_block(Block::Other(XmlNode::text("\n    ")));
        doc.add_block(Block::Other(XmlNode::Element(XmlElement::new("w:bookmarkStart"))));
        doc.add_paragraph(Paragraph::new());
        doc.add_block(Block::Other(XmlNode::text("\n    ")));
        doc.add_paragraph(Paragraph::with_text("<<Salutation>>"));
        let report = substitute(&mut doc, &letter_map(), &FillOptions::default());

        assert_eq!(doc.paragraph_texts(), vec!["Dear Sir,"]);
        assert_eq!(report.paragraphs_removed, 2);
        assert_eq!(doc.blocks.iter().filter(|b| b.is_marker()).count(), 3);
    }

    #[test]
    fn test_whitespace_addressee_counts_as_empty() {
        let mut doc = doc_with(&["<<Addressee>>", "   ", "Body"]);
        let map = PlaceholderMap::new().with(Placeholder::Addressee, "  ");
        substitute(&mut doc, &map, &FillOptions::default());

        assert_eq!(doc.paragraph_texts(), vec!["Body"]);
    }

    #[test]
    fn test_addressee_removal_keeps_non_blank_next() {
        let mut doc = doc_with(&["", "<<Addressee>>", "Street 1"]);
        let map = PlaceholderMap::new().with(Placeholder::Addressee, "");
        substitute(&mut doc, &map, &FillOptions::default());

        // Forward only: the blank line before the addressee stays.
        assert_eq!(doc.paragraph_texts(), vec!["", "Street 1"]);
    }

    #[test]
    fn test_split_keeps_following_content_after() {
        let mut doc = doc_with(&["<<Enter text here>>", "Sincerely,", "Jane Doe"]);
        let map = PlaceholderMap::new().with(Placeholder::Body, "One.\n\nTwo.\n\n\n\nThree.");
        substitute(&mut doc, &map, &FillOptions::default());

        assert_eq!(
            doc.paragraph_texts(),
            vec!["One.", "Two.", "Three.", "Sincerely,", "Jane Doe"]
        );
    }

    #[test]
    fn test_split_paragraphs_share_style() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("<<Enter text here>>").with_style_id("LetterBody"));
        let map = PlaceholderMap::new().with(Placeholder::Body, "A\r\n\r\nB");
        substitute(&mut doc, &map, &FillOptions::default());

        let styles: Vec<Option<&str>> = doc.paragraphs().map(Paragraph::style_id).collect();
        assert_eq!(styles, vec![Some("LetterBody"), Some("LetterBody")]);
        assert_eq!(doc.paragraph_texts(), vec!["A", "B"]);
    }

    #[test]
    fn test_single_line_breaks_stay_in_paragraph() {
        let mut doc = doc_with(&["<<Enter text here>>"]);
        let map = PlaceholderMap::new().with(Placeholder::Body, "Line one\nLine two");
        substitute(&mut doc, &map, &FillOptions::default());

        assert_eq!(doc.paragraph_texts(), vec!["Line one\nLine two"]);
    }

    #[test]
    fn test_split_token_preserving_policy() {
        let mut doc = Document::new();
        doc.add_paragraph(split_paragraph(&[
            ("Dear ", TextStyle::default()),
            ("<<Salu", bold()),
            ("tation>>!", TextStyle::default()),
        ]));
        let map = PlaceholderMap::new().with(Placeholder::Salutation, "Dr. Smith");
        let report = substitute(&mut doc, &map, &FillOptions::default());

        assert_eq!(doc.paragraph_texts(), vec!["Dear Dr. Smith!"]);
        let p = doc.blocks[0].as_paragraph().unwrap();
        assert_eq!(p.runs().count(), 1);
        // The run where the token starts supplies the formatting.
        assert_eq!(p.runs().next().unwrap().style().bold, Some(true));
        assert!(report.is_applied(Placeholder::Salutation));
    }

    #[test]
    fn test_preserving_policy_copies_token_run_style() {
        let style = TextStyle {
            font_name: Some("Georgia".into()),
            font_size: Some(11.0),
            italic: Some(true),
            color: Some("1F3864".into()),
            ..Default::default()
        };
        let mut doc = Document::new();
        doc.add_paragraph(split_paragraph(&[
            ("On ", TextStyle::default()),
            ("<<Date>>", style.clone()),
        ]));
        let map = PlaceholderMap::new().with(Placeholder::Date, "May 1, 2024");
        substitute(&mut doc, &map, &FillOptions::default());

        let p = doc.blocks[0].as_paragraph().unwrap();
        assert_eq!(p.plain_text(), "On May 1, 2024");
        assert_eq!(p.runs().next().unwrap().style(), style);
    }

    #[test]
    fn test_multiple_occurrences_replaced() {
        let mut doc = doc_with(&["<<Date>> and <<Date>>"]);
        let map = PlaceholderMap::new().with(Placeholder::Date, "today");
        let report = substitute(&mut doc, &map, &FillOptions::default());

        assert_eq!(doc.paragraph_texts(), vec!["today and today"]);
        assert_eq!(
            report.outcome(Placeholder::Date),
            Some(crate::fill::PlaceholderOutcome::Replaced { occurrences: 2 })
        );
    }

    #[test]
    fn test_value_that_looks_like_token_is_literal() {
        let mut doc = doc_with(&["<<Salutation>> <<Date>>"]);
        let map = PlaceholderMap::new()
            .with(Placeholder::Salutation, "<<Date>> & <b>")
            .with(Placeholder::Date, "x");
        substitute(&mut doc, &map, &FillOptions::default());

        assert_eq!(doc.paragraph_texts(), vec!["<<Date>> & <b> x"]);
    }

    #[test]
    fn test_in_run_policy_keeps_runs() {
        let mut doc = Document::new();
        doc.add_paragraph(split_paragraph(&[
            ("Dear ", TextStyle::default()),
            ("<<Salutation>>", bold()),
            (",", TextStyle::default()),
        ]));
        let map = PlaceholderMap::new().with(Placeholder::Salutation, "Dr. Smith");
        let report = substitute(&mut doc, &map, &FillOptions::new().in_run());

        let p = doc.blocks[0].as_paragraph().unwrap();
        assert_eq!(p.plain_text(), "Dear Dr. Smith,");
        assert_eq!(p.runs().count(), 3);
        assert_eq!(p.runs().nth(1).unwrap().style().bold, Some(true));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_in_run_policy_reports_split_token() {
        let mut doc = Document::new();
        doc.add_paragraph(split_paragraph(&[
            ("<<Sal", TextStyle::default()),
            ("utation>>", TextStyle::default()),
        ]));
        let map = PlaceholderMap::new().with(Placeholder::Salutation, "Dear Sir,");
        let report = substitute(&mut doc, &map, &FillOptions::new().in_run());

        assert_eq!(doc.paragraph_texts(), vec!["<<Salutation>>"]);
        assert!(!report.is_applied(Placeholder::Salutation));
        assert!(matches!(
            report.warnings[0],
            FillWarning::SplitToken {
                placeholder: Placeholder::Salutation,
                location: Location::Body { block: 0 }
            }
        ));
    }

    #[test]
    fn test_in_run_policy_splits_body() {
        let mut doc = Document::new();
        doc.add_paragraph(split_paragraph(&[
            ("<<Enter text here>>", bold()),
            (" (end)", TextStyle::default()),
        ]));
        doc.add_paragraph(Paragraph::with_text("Sincerely,"));
        let map = PlaceholderMap::new().with(Placeholder::Body, "First.\n\nSecond.");
        let report = substitute(&mut doc, &map, &FillOptions::new().in_run());

        assert_eq!(
            doc.paragraph_texts(),
            vec!["First.", "Second. (end)", "Sincerely,"]
        );
        assert_eq!(report.paragraphs_inserted, 1);
        let second = doc.blocks[1].as_paragraph().unwrap();
        assert_eq!(second.runs().next().unwrap().style().bold, Some(true));
    }

    #[test]
    fn test_table_cells_no_removal_or_split() {
        let mut table = Table::new();
        table.add_row(TableRow::new(vec![
            TableCell::text("<<Addressee>>"),
            TableCell::text("<<Enter text here>>"),
        ]));
        let mut doc = Document::new();
        doc.add_table(table);
        let map = PlaceholderMap::new()
            .with(Placeholder::Addressee, "")
            .with(Placeholder::Body, "A\n\nB");
        let report = substitute(&mut doc, &map, &FillOptions::default());

        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.plain_text(), "\tA\n\nB");
        assert_eq!(report.paragraphs_removed, 0);
        assert_eq!(report.paragraphs_inserted, 0);
        assert!(report.is_applied(Placeholder::Body));
    }

    #[test]
    fn test_no_placeholders_warns() {
        let mut doc = doc_with(&["Plain letter", "No tokens"]);
        let report = substitute(&mut doc, &letter_map(), &FillOptions::default());

        assert!(report.is_empty());
        assert_eq!(report.warnings, vec![FillWarning::NoPlaceholders]);
        assert_eq!(doc.paragraph_texts(), vec!["Plain letter", "No tokens"]);
        assert_eq!(report.not_found().count(), 4);
    }

    #[test]
    fn test_override_applies_to_inserted_and_trailing_text() {
        let mut doc = doc_with(&["<<Enter text here>>", "", "Sincerely,", "Jane Doe"]);
        let map = PlaceholderMap::new().with(Placeholder::Body, "One.\n\nTwo.");
        let options =
            FillOptions::new().with_format_override(FormatOverride::new("Aptos", 11.5).unwrap());
        substitute(&mut doc, &map, &options);

        for p in doc.paragraphs().filter(|p| !p.is_blank()) {
            let style = p.runs().next().unwrap().style();
            assert_eq!(style.font_name.as_deref(), Some("Aptos"));
            assert_eq!(style.font_size, Some(11.5));
        }
        // Blank paragraphs are not touched.
        assert!(doc.blocks[2].as_paragraph().unwrap().runs().next().unwrap().properties.is_empty());
    }

    #[test]
    fn test_trailing_pass_disabled() {
        let mut doc = doc_with(&["<<Enter text here>>", "Sincerely,"]);
        let map = PlaceholderMap::new().with(Placeholder::Body, "Text");
        let options = FillOptions::new()
            .with_format_override(FormatOverride::new("Arial", 10.0).unwrap())
            .with_trailing_format(false);
        substitute(&mut doc, &map, &options);

        let closing = doc.blocks[1].as_paragraph().unwrap();
        assert_eq!(closing.runs().next().unwrap().style().font_name, None);
    }

    #[test]
    fn test_collapse_blank_after_date() {
        let mut doc = doc_with(&["<<Date>>", "", "", "", "<<Salutation>>"]);
        let map = PlaceholderMap::new()
            .with(Placeholder::Date, "May 1, 2024")
            .with(Placeholder::Salutation, "Dear Sir,");
        let options = FillOptions::new().with_collapse_blank_after_date(true);
        let report = substitute(&mut doc, &map, &options);

        assert_eq!(doc.paragraph_texts(), vec!["May 1, 2024", "", "Dear Sir,"]);
        assert_eq!(report.paragraphs_removed, 2);
    }

    #[test]
    fn test_bookmarks_survive_rebuild() {
        let mut p = Paragraph::new();
        p.content.push(InlineContent::Other(crate::xml::XmlNode::Element(
            crate::xml::XmlElement::new("w:bookmarkStart"),
        )));
        p.add_text("<<Date>>");
        let mut doc = Document::new();
        doc.add_paragraph(p);

        let map = PlaceholderMap::new().with(Placeholder::Date, "today");
        substitute(&mut doc, &map, &FillOptions::default());

        let p = doc.blocks[0].as_paragraph().unwrap();
        assert_eq!(p.content.len(), 2);
        assert!(matches!(p.content[0], InlineContent::Other(_)));
        assert_eq!(p.plain_text(), "today");
    }

    #[test]
    fn test_split_paragraphs() {
        assert_eq!(split_paragraphs("a\n\nb"), vec!["a", "b"]);
        assert_eq!(split_paragraphs("a\n\n\nb"), vec!["a", "b"]);
        assert_eq!(split_paragraphs("a\n\n  \n\nb\n\n"), vec!["a", "b"]);
        assert_eq!(split_paragraphs(""), vec![""]);
    }
}
