//! Document-level types.

use super::{Block, PackagePart, Paragraph, Table};
use crate::xml::{XmlElement, XmlNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// WordprocessingML main namespace.
pub const WORDPROCESSINGML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Office document relationships namespace.
pub const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Default name of the main document part.
pub const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// A loaded Word document (or template).
///
/// The body is an ordered sequence of blocks; structural edits are index
/// based (`insert_block`, `remove_block`). The package parts and the
/// `w:document` root are kept so the document serializes back to a full
/// `.docx` package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Body content in document order
    pub blocks: Vec<Block>,

    /// `w:document` element with an empty `w:body`; the body is rebuilt
    /// from `blocks` on write
    #[serde(skip)]
    pub(crate) root: XmlElement,

    /// All parts of the package in container order
    #[serde(skip)]
    pub(crate) parts: Vec<PackagePart>,

    /// Name of the main document part
    #[serde(skip)]
    pub(crate) main_part: String,
}

impl Document {
    /// Create a new empty document backed by a minimal package.
    pub fn new() -> Self {
        let root = XmlElement::new("w:document")
            .with_attr("xmlns:w", WORDPROCESSINGML_NS)
            .with_attr("xmlns:r", RELATIONSHIPS_NS)
            .with_child(XmlNode::Element(XmlElement::new("w:body")));

        let parts = vec![
            PackagePart::new("[Content_Types].xml", content_types_xml().into_bytes()),
            PackagePart::new("_rels/.rels", root_rels_xml().into_bytes()),
            PackagePart::new(DEFAULT_MAIN_PART, Vec::new()),
        ];

        Self {
            metadata: Metadata::default(),
            blocks: Vec::new(),
            root,
            parts,
            main_part: DEFAULT_MAIN_PART.to_string(),
        }
    }

    /// Assemble a document from parsed package pieces.
    pub(crate) fn from_package(
        metadata: Metadata,
        blocks: Vec<Block>,
        root: XmlElement,
        parts: Vec<PackagePart>,
        main_part: String,
    ) -> Self {
        Self {
            metadata,
            blocks,
            root,
            parts,
            main_part,
        }
    }

    /// Add a block at the end of the body.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Add a paragraph at the end of the body.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    /// Add a table at the end of the body.
    pub fn add_table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    /// Insert a block at `index`, shifting later blocks down.
    ///
    /// An index past the end appends.
    pub fn insert_block(&mut self, index: usize, block: Block) {
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, block);
    }

    /// Remove the block at `index`.
    ///
    /// Returns `None` if there is no such block, so callers removing a
    /// batch of indices can skip ones that are already gone.
    pub fn remove_block(&mut self, index: usize) -> Option<Block> {
        if index < self.blocks.len() {
            Some(self.blocks.remove(index))
        } else {
            None
        }
    }

    /// Index of the paragraph following the block at `index`.
    ///
    /// Marker blocks in between are skipped. Returns `None` when a table or
    /// other content comes first, or the body ends.
    pub fn next_paragraph(&self, index: usize) -> Option<usize> {
        self.blocks
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, block)| !block.is_marker())
            .filter(|(_, block)| block.is_paragraph())
            .map(|(i, _)| i)
    }

    /// Iterate over the top-level paragraphs (table content excluded).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    /// Texts of the top-level paragraphs, in order.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs().map(Paragraph::plain_text).collect()
    }

    /// Get the number of top-level paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// Get the number of top-level tables.
    pub fn table_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_table()).count()
    }

    /// Check if the body has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Get the package parts in container order.
    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }

    /// Get a package part by name.
    pub fn part(&self, name: &str) -> Option<&PackagePart> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Name of the main document part.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Number of embedded media parts (images).
    pub fn media_count(&self) -> usize {
        self.parts.iter().filter(|p| p.is_media()).count()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn content_types_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#
        .to_string()
}

fn root_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#
        .to_string()
}

/// Kind of Word package, from the main part content type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
    /// Regular document (`.docx`)
    #[default]
    Document,
    /// Template (`.dotx`)
    Template,
    /// Macro-enabled document (`.docm`)
    MacroEnabledDocument,
    /// Macro-enabled template (`.dotm`)
    MacroEnabledTemplate,
}

impl PackageKind {
    /// Content type of the main part for a regular document.
    pub const DOCUMENT_MAIN: &'static str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    /// Content type of the main part for a template.
    pub const TEMPLATE_MAIN: &'static str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";

    /// Determine the kind from a main part content type.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            Self::DOCUMENT_MAIN => Some(PackageKind::Document),
            Self::TEMPLATE_MAIN => Some(PackageKind::Template),
            "application/vnd.ms-word.document.macroEnabled.main+xml" => {
                Some(PackageKind::MacroEnabledDocument)
            }
            "application/vnd.ms-word.template.macroEnabledTemplate.main+xml" => {
                Some(PackageKind::MacroEnabledTemplate)
            }
            _ => None,
        }
    }

    /// Check if this is a template package.
    pub fn is_template(&self) -> bool {
        matches!(
            self,
            PackageKind::Template | PackageKind::MacroEnabledTemplate
        )
    }

    /// Human-readable format name.
    pub fn label(&self) -> &'static str {
        match self {
            PackageKind::Document => "Word document (.docx)",
            PackageKind::Template => "Word template (.dotx)",
            PackageKind::MacroEnabledDocument => "Macro-enabled document (.docm)",
            PackageKind::MacroEnabledTemplate => "Macro-enabled template (.dotm)",
        }
    }
}

/// Document metadata from the core properties part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Author
    pub creator: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Description / comments
    pub description: Option<String>,

    /// Last person to save the document
    pub last_modified_by: Option<String>,

    /// Revision number
    pub revision: Option<u32>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// Package kind
    pub kind: PackageKind,
}
