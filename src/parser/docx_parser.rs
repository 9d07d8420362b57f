//! Word package parser using zip and quick-xml.

use std::io::{Cursor, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use zip::{CompressionMethod, ZipArchive};

use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, Result};
use crate::model::{
    Block, Document, InlineContent, Metadata, PackageKind, PackagePart, Paragraph,
    PartCompression, RunContent, RunProperties, Table, TableCell, TableRow, TextRun,
    DEFAULT_MAIN_PART,
};
use crate::xml::{self, XmlElement, XmlNode};

use super::options::{ErrorMode, ParseOptions};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const ROOT_RELS_PART: &str = "_rels/.rels";
const DEFAULT_CORE_PART: &str = "docProps/core.xml";

const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const CORE_PROPERTIES_REL: &str = "/core-properties";

/// Word package parser.
///
/// Reading the container happens on construction; [`DocxParser::parse`]
/// builds the document model from the loaded parts.
pub struct DocxParser {
    parts: Vec<PackagePart>,
    options: ParseOptions,
}

impl DocxParser {
    /// Open a Word file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a Word file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();

        // Verify it's a zip container
        detect_format_from_path(path)?;

        let data = std::fs::read(path)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Load a Word package from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Load a Word package from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        detect_format_from_bytes(data)?;
        let parts = read_parts(data, &options)?;
        log::debug!("Loaded package with {} parts", parts.len());
        Ok(Self { parts, options })
    }

    /// Load a Word package from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Load a Word package from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Get the loaded package parts.
    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }

    /// Parse the package and return a structured Document.
    pub fn parse(&self) -> Result<Document> {
        let rels = self.read_root_relationships()?;
        let main_part = rels
            .as_ref()
            .and_then(|r| relationship_target(r, OFFICE_DOCUMENT_REL))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        let main_data = &self
            .part(&main_part)
            .ok_or_else(|| Error::MissingPart(main_part.clone()))?
            .data;

        let mut root = xml::parse(main_data)?;
        let body = root
            .child_mut("body")
            .ok_or_else(|| Error::Xml(format!("{} has no w:body element", main_part)))?;
        let blocks: Vec<Block> = std::mem::take(&mut body.children)
            .into_iter()
            .map(block_from_node)
            .collect();

        let mut metadata = if self.options.read_metadata {
            let core_part = rels
                .as_ref()
                .and_then(|r| relationship_target(r, CORE_PROPERTIES_REL))
                .unwrap_or_else(|| DEFAULT_CORE_PART.to_string());
            self.read_core_properties(&core_part)?
        } else {
            Metadata::default()
        };
        metadata.kind = self.read_package_kind(&main_part)?;

        // The body is rebuilt from the blocks on write; drop the stale bytes.
        let parts = self
            .parts
            .iter()
            .map(|p| {
                if p.name == main_part {
                    PackagePart {
                        data: Vec::new(),
                        ..p.clone()
                    }
                } else {
                    p.clone()
                }
            })
            .collect();

        log::debug!(
            "Parsed {} with {} body blocks ({})",
            main_part,
            blocks.len(),
            metadata.kind.label()
        );

        Ok(Document::from_package(metadata, blocks, root, parts, main_part))
    }

    fn part(&self, name: &str) -> Option<&PackagePart> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Apply the error mode to a failure in a secondary part.
    fn tolerate<T>(&self, result: Result<T>, what: &str) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                log::warn!("Failed to read {}: {}", what, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn read_root_relationships(&self) -> Result<Option<XmlElement>> {
        match self.part(ROOT_RELS_PART) {
            Some(part) => Ok(self.tolerate(xml::parse(&part.data), ROOT_RELS_PART)?),
            None => Ok(None),
        }
    }

    fn read_package_kind(&self, main_part: &str) -> Result<PackageKind> {
        let part = match self.part(CONTENT_TYPES_PART) {
            Some(part) => part,
            None => {
                let missing = Err(Error::MissingPart(CONTENT_TYPES_PART.to_string()));
                self.tolerate::<()>(missing, CONTENT_TYPES_PART)?;
                return Ok(PackageKind::Document);
            }
        };

        let types = match self.tolerate(xml::parse(&part.data), CONTENT_TYPES_PART)? {
            Some(types) => types,
            None => return Ok(PackageKind::Document),
        };

        let part_name = format!("/{}", main_part);
        let content_type = types
            .elements()
            .filter(|e| e.local_name() == "Override")
            .find(|e| {
                e.attr("PartName")
                    .map_or(false, |n| n.eq_ignore_ascii_case(&part_name))
            })
            .and_then(|e| e.attr("ContentType"));

        match content_type.and_then(PackageKind::from_content_type) {
            Some(kind) => Ok(kind),
            None if self.options.error_mode == ErrorMode::Lenient => {
                log::warn!(
                    "Unrecognized content type for {}: {:?}",
                    main_part,
                    content_type
                );
                Ok(PackageKind::Document)
            }
            None => Err(Error::UnknownFormat),
        }
    }

    fn read_core_properties(&self, name: &str) -> Result<Metadata> {
        let part = match self.part(name) {
            Some(part) => part,
            None => return Ok(Metadata::default()),
        };
        let core = self.tolerate(xml::parse(&part.data), name)?;
        Ok(core.map(|c| metadata_from_core(&c)).unwrap_or_default())
    }
}

/// Read every entry of the container, enforcing the part size limit.
fn read_parts(data: &[u8], options: &ParseOptions) -> Result<Vec<PackagePart>> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let limit = options.part_limit();
    let mut parts = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        let compression = match file.compression() {
            CompressionMethod::Stored => PartCompression::Stored,
            _ => PartCompression::Deflated,
        };

        let declared = file.size();
        let mut buf = Vec::new();
        match limit {
            Some(limit) => {
                if declared > limit {
                    return Err(Error::PartTooLarge {
                        name,
                        size: declared,
                        limit,
                    });
                }
                // The declared size can lie; cap the actual read as well.
                (&mut file).take(limit + 1).read_to_end(&mut buf)?;
                if buf.len() as u64 > limit {
                    return Err(Error::PartTooLarge {
                        name,
                        size: buf.len() as u64,
                        limit,
                    });
                }
            }
            None => {
                file.read_to_end(&mut buf)?;
            }
        }

        parts.push(PackagePart::new(name, buf).with_compression(compression));
    }

    Ok(parts)
}

/// Find the target of the first relationship whose type ends with `suffix`.
fn relationship_target(rels: &XmlElement, suffix: &str) -> Option<String> {
    rels.elements()
        .filter(|e| e.local_name() == "Relationship")
        .find(|e| e.attr("Type").map_or(false, |t| t.ends_with(suffix)))
        .and_then(|e| e.attr("Target"))
        .map(|t| t.trim_start_matches('/').to_string())
}

fn metadata_from_core(core: &XmlElement) -> Metadata {
    let text = |local: &str| {
        core.child(local)
            .map(|e| e.text_content().trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let date = |local: &str| {
        text(local)
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|d| d.with_timezone(&Utc))
    };

    Metadata {
        title: text("title"),
        subject: text("subject"),
        creator: text("creator"),
        keywords: text("keywords"),
        description: text("description"),
        last_modified_by: text("lastModifiedBy"),
        revision: text("revision").and_then(|s| s.parse().ok()),
        created: date("created"),
        modified: date("modified"),
        kind: PackageKind::Document,
    }
}

/// Convert a body or cell child into a block.
fn block_from_node(node: XmlNode) -> Block {
    match node {
        XmlNode::Element(e) if e.local_name() == "p" => Block::Paragraph(paragraph_from_element(e)),
        XmlNode::Element(e) if e.local_name() == "tbl" => Block::Table(table_from_element(e)),
        other => Block::Other(other),
    }
}

fn paragraph_from_element(element: XmlElement) -> Paragraph {
    let mut paragraph = Paragraph {
        attributes: element.attributes,
        ..Paragraph::default()
    };

    for child in element.children {
        match child {
            XmlNode::Element(e) if e.local_name() == "pPr" && paragraph.properties.is_none() => {
                paragraph.properties = Some(e);
            }
            XmlNode::Element(e) if e.local_name() == "r" => {
                paragraph.content.push(InlineContent::Run(run_from_element(e)));
            }
            other => paragraph.content.push(InlineContent::Other(other)),
        }
    }

    paragraph
}

fn run_from_element(element: XmlElement) -> TextRun {
    let mut run = TextRun {
        attributes: element.attributes,
        ..TextRun::default()
    };

    for child in element.children {
        let e = match child {
            XmlNode::Element(e) => e,
            // Whitespace between run children carries no text.
            XmlNode::Text { .. } => continue,
        };
        match e.local_name() {
            "rPr" => {
                run.properties = RunProperties {
                    children: e.children,
                }
            }
            "t" => {
                let text = e.text_content();
                if !text.is_empty() {
                    run.content.push(RunContent::Text(text));
                }
            }
            "tab" => run.content.push(RunContent::Tab),
            "cr" => run.content.push(RunContent::Break),
            "br" if is_line_break(&e) => run.content.push(RunContent::Break),
            _ => run.content.push(RunContent::Other(XmlNode::Element(e))),
        }
    }

    run
}

/// Page and column breaks are kept verbatim; only line breaks become text.
fn is_line_break(br: &XmlElement) -> bool {
    match br.attributes.iter().find(|(k, _)| xml::local_name(k) == "type") {
        None => true,
        Some((_, kind)) => kind == "textWrapping",
    }
}

fn table_from_element(element: XmlElement) -> Table {
    let mut table = Table::new();

    for child in element.children {
        match child {
            XmlNode::Element(e) if e.local_name() == "tr" => table.add_row(row_from_element(e)),
            other => match table.rows.last_mut() {
                Some(row) => row.following.push(other),
                None => table.properties.push(other),
            },
        }
    }

    table
}

fn row_from_element(element: XmlElement) -> TableRow {
    let mut row = TableRow::new(Vec::new());

    for child in element.children {
        match child {
            XmlNode::Element(e) if e.local_name() == "tc" => row.cells.push(cell_from_element(e)),
            other => row.properties.push(other),
        }
    }

    row
}

fn cell_from_element(element: XmlElement) -> TableCell {
    let mut cell = TableCell::with_content(Vec::new());

    for child in element.children {
        match child {
            XmlNode::Element(e) if e.local_name() == "tcPr" => {
                cell.properties.push(XmlNode::Element(e))
            }
            other => cell.content.push(block_from_node(other)),
        }
    }

    cell
}
