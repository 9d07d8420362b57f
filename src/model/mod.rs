//! Document model types for Word template content.
//!
//! The model mirrors the WordprocessingML body closely enough to be written
//! back: paragraphs and tables are structured, everything the engine does
//! not need to understand is carried as verbatim XML nodes.

mod block;
mod document;
mod paragraph;
mod part;
mod table;

pub use block::Block;
pub use document::{
    Document, Metadata, PackageKind, DEFAULT_MAIN_PART, RELATIONSHIPS_NS, WORDPROCESSINGML_NS,
};
pub(crate) use paragraph::w;
pub use paragraph::{InlineContent, Paragraph, RunContent, RunProperties, TextRun, TextStyle};
pub use part::{PackagePart, PartCompression};
pub use table::{Table, TableCell, TableRow};
