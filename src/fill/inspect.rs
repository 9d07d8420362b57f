//! Template inspection: which tokens a template carries, and where.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{Block, Document, Paragraph, Table};

use super::placeholder::Placeholder;
use super::report::Location;

/// Anything shaped like a placeholder token.
const TOKEN_PATTERN: &str = r"<<[^<>\n]{1,64}>>";

/// A token found in a template paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOccurrence {
    /// The literal token text, delimiters included
    pub token: String,

    /// The known placeholder, or `None` for an unrecognized token
    pub placeholder: Option<Placeholder>,

    /// Paragraph holding the token
    pub location: Location,

    /// Full text of that paragraph
    pub paragraph_text: String,
}

impl TokenOccurrence {
    /// Check if the token is one the engine fills.
    pub fn is_known(&self) -> bool {
        self.placeholder.is_some()
    }
}

/// Scans paragraph text for placeholder-shaped tokens.
pub struct TokenScanner {
    pattern: Regex,
}

impl TokenScanner {
    /// Create a scanner.
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(TOKEN_PATTERN).unwrap(),
        }
    }

    /// List every token in the document, in document order.
    pub fn scan(&self, doc: &Document) -> Vec<TokenOccurrence> {
        let mut found = Vec::new();
        for (index, block) in doc.blocks.iter().enumerate() {
            match block {
                Block::Paragraph(p) => self.scan_paragraph(p, Location::Body { block: index }, &mut found),
                Block::Table(t) => self.scan_table(t, index, &mut found),
                Block::Other(_) => {}
            }
        }
        found
    }

    fn scan_table(&self, table: &Table, block: usize, found: &mut Vec<TokenOccurrence>) {
        for (r, row) in table.rows.iter().enumerate() {
            for (c, cell) in row.cells.iter().enumerate() {
                for (k, item) in cell.content.iter().enumerate() {
                    match item {
                        Block::Paragraph(p) => {
                            let location = Location::Cell {
                                block,
                                row: r,
                                cell: c,
                                paragraph: k,
                            };
                            self.scan_paragraph(p, location, found);
                        }
                        Block::Table(nested) => self.scan_table(nested, block, found),
                        Block::Other(_) => {}
                    }
                }
            }
        }
    }

    fn scan_paragraph(&self, p: &Paragraph, location: Location, found: &mut Vec<TokenOccurrence>) {
        let text = p.plain_text();
        for m in self.pattern.find_iter(&text) {
            found.push(TokenOccurrence {
                token: m.as_str().to_string(),
                placeholder: Placeholder::from_token(m.as_str()),
                location,
                paragraph_text: text.clone(),
            });
        }
    }
}

impl Default for TokenScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// List every placeholder-shaped token in a document.
pub fn scan_tokens(doc: &Document) -> Vec<TokenOccurrence> {
    TokenScanner::new().scan(doc)
}

/// Known placeholders that do not appear anywhere in the document.
pub fn missing_placeholders(doc: &Document) -> Vec<Placeholder> {
    let tokens = scan_tokens(doc);
    Placeholder::ALL
        .into_iter()
        .filter(|p| !tokens.iter().any(|t| t.placeholder == Some(*p)))
        .collect()
}
