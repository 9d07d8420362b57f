//! Word package writer.
//!
//! Writes every part back in container order with its original compression.
//! The main part is regenerated from the block model; all other parts are
//! copied unchanged, except the content types of a template package, which
//! are rewritten so the output opens as a regular document.

use std::io::{Cursor, Seek, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::model::{
    w, Block, Document, InlineContent, PackageKind, PartCompression, Paragraph, RunContent,
    Table, TableCell, TableRow, TextRun, WORDPROCESSINGML_NS,
};
use crate::xml::{self, XmlElement, XmlNode};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const MACRO_DOCUMENT_MAIN: &str = "application/vnd.ms-word.document.macroEnabled.main+xml";

/// Serialize a document to `.docx` bytes.
pub fn to_docx(doc: &Document) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_docx(doc, &mut cursor)?;
    Ok(cursor.into_inner())
}

/// Write a document as a `.docx` package to a seekable writer.
pub fn write_docx<W: Write + Seek>(doc: &Document, writer: W) -> Result<()> {
    let main_part = main_part_bytes(doc)?;
    let content_types = if doc.metadata.kind.is_template() {
        Some(document_content_types(doc)?)
    } else {
        None
    };

    let mut zip = ZipWriter::new(writer);
    let mut wrote_main = false;

    for part in doc.parts() {
        let data: &[u8] = match content_types {
            _ if part.name == doc.main_part() => {
                wrote_main = true;
                &main_part
            }
            Some(ref types) if part.name == CONTENT_TYPES_PART => types,
            _ => &part.data,
        };

        let method = match part.compression {
            PartCompression::Stored => CompressionMethod::Stored,
            PartCompression::Deflated => CompressionMethod::Deflated,
        };
        zip.start_file(part.name.as_str(), FileOptions::<()>::default().compression_method(method))?;
        zip.write_all(data)?;
    }

    if !wrote_main {
        return Err(Error::MissingPart(doc.main_part().to_string()));
    }

    zip.finish()?;
    Ok(())
}

/// Rebuild the main part from the block model.
fn main_part_bytes(doc: &Document) -> Result<Vec<u8>> {
    let mut root = doc.root.clone();
    // New elements are written with the `w` prefix.
    if root.attr("xmlns:w").is_none() {
        root.set_attr("xmlns:w", WORDPROCESSINGML_NS);
    }

    let body = root
        .child_mut("body")
        .ok_or_else(|| Error::Render("document root has no w:body element".to_string()))?;
    body.children = doc.blocks.iter().map(block_to_node).collect();

    root.to_part_bytes()
}

/// Point the main part override at the document content type.
fn document_content_types(doc: &Document) -> Result<Vec<u8>> {
    let part = doc
        .part(CONTENT_TYPES_PART)
        .ok_or_else(|| Error::MissingPart(CONTENT_TYPES_PART.to_string()))?;
    let mut types = xml::parse(&part.data)?;

    let content_type = match doc.metadata.kind {
        PackageKind::MacroEnabledTemplate => MACRO_DOCUMENT_MAIN,
        _ => PackageKind::DOCUMENT_MAIN,
    };
    let part_name = format!("/{}", doc.main_part());

    for node in types.children.iter_mut() {
        if let XmlNode::Element(e) = node {
            let is_main = e.local_name() == "Override"
                && e.attr("PartName")
                    .map_or(false, |n| n.eq_ignore_ascii_case(&part_name));
            if is_main {
                e.set_attr("ContentType", content_type);
            }
        }
    }

    types.to_part_bytes()
}

fn block_to_node(block: &Block) -> XmlNode {
    match block {
        Block::Paragraph(p) => XmlNode::Element(paragraph_to_element(p)),
        Block::Table(t) => XmlNode::Element(table_to_element(t)),
        Block::Other(node) => node.clone(),
    }
}

fn paragraph_to_element(paragraph: &Paragraph) -> XmlElement {
    let mut element = XmlElement::new(w("p"));
    element.attributes = paragraph.attributes.clone();

    if let Some(ref properties) = paragraph.properties {
        element.children.push(XmlNode::Element(properties.clone()));
    }
    for item in &paragraph.content {
        element.children.push(match item {
            InlineContent::Run(run) => XmlNode::Element(run_to_element(run)),
            InlineContent::Other(node) => node.clone(),
        });
    }

    element
}

fn run_to_element(run: &TextRun) -> XmlElement {
    let mut element = XmlElement::new(w("r"));
    element.attributes = run.attributes.clone();

    if !run.properties.is_empty() {
        let mut rpr = XmlElement::new(w("rPr"));
        rpr.children = run.properties.children.clone();
        element.children.push(XmlNode::Element(rpr));
    }

    for item in &run.content {
        let child = match item {
            RunContent::Text(text) => XmlNode::Element(
                XmlElement::new(w("t"))
                    .with_attr("xml:space", "preserve")
                    .with_child(XmlNode::text(text.as_str())),
            ),
            RunContent::Tab => XmlNode::Element(XmlElement::new(w("tab"))),
            RunContent::Break => XmlNode::Element(XmlElement::new(w("br"))),
            RunContent::Other(node) => node.clone(),
        };
        element.children.push(child);
    }

    element
}

fn table_to_element(table: &Table) -> XmlElement {
    let mut element = XmlElement::new(w("tbl"));
    element.children.extend(table.properties.iter().cloned());

    for row in &table.rows {
        element.children.push(XmlNode::Element(row_to_element(row)));
        element.children.extend(row.following.iter().cloned());
    }

    element
}

fn row_to_element(row: &TableRow) -> XmlElement {
    let mut element = XmlElement::new(w("tr"));
    element.children.extend(row.properties.iter().cloned());
    element
        .children
        .extend(row.cells.iter().map(|c| XmlNode::Element(cell_to_element(c))));
    element
}

fn cell_to_element(cell: &TableCell) -> XmlElement {
    let mut element = XmlElement::new(w("tc"));
    element.children.extend(cell.properties.iter().cloned());
    element.children.extend(cell.content.iter().map(block_to_node));
    // A cell must end with a paragraph.
    if !matches!(cell.content.last(), Some(Block::Paragraph(_))) {
        element
            .children
            .push(XmlNode::Element(XmlElement::new(w("p"))));
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PackagePart, TextStyle};
    use crate::parser::DocxParser;

    fn reparse(doc: &Document) -> Document {
        let bytes = to_docx(doc).unwrap();
        DocxParser::from_bytes(&bytes).unwrap().parse().unwrap()
    }

    #[test]
    fn test_round_trip_paragraphs() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("May 1, 2024"));
        doc.add_paragraph(Paragraph::new());
        doc.add_paragraph(Paragraph::with_text("Dear Sir,").with_style_id("Salutation"));

        let back = reparse(&doc);
        assert_eq!(back.paragraph_texts(), vec!["May 1, 2024", "", "Dear Sir,"]);
        assert_eq!(back.blocks[2].as_paragraph().unwrap().style_id(), Some("Salutation"));
    }

    #[test]
    fn test_reserved_characters_stay_text() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("R&D <w:b/> \"quoted\" </w:t>"));

        let back = reparse(&doc);
        assert_eq!(back.paragraph_texts(), vec!["R&D <w:b/> \"quoted\" </w:t>"]);
        assert_eq!(back.paragraph_count(), 1);
    }

    #[test]
    fn test_whitespace_and_breaks_preserved() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("  leading\tand\ntrailing  "));

        let back = reparse(&doc);
        assert_eq!(back.paragraph_texts(), vec!["  leading\tand\ntrailing  "]);
    }

    #[test]
    fn test_run_formatting_round_trip() {
        let style = TextStyle {
            font_name: Some("Times New Roman".into()),
            font_size: Some(11.5),
            italic: Some(true),
            ..Default::default()
        };
        let mut p = Paragraph::new();
        p.add_run(TextRun::styled("Sincerely,", &style));
        let mut doc = Document::new();
        doc.add_paragraph(p);

        let back = reparse(&doc);
        let run = back.blocks[0].as_paragraph().unwrap().runs().next().unwrap().clone();
        assert_eq!(run.style(), style);
    }

    #[test]
    fn test_other_parts_copied_unchanged() {
        let mut doc = Document::new();
        let image = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
        doc.parts.push(
            PackagePart::new("word/media/image1.png", image.clone())
                .with_compression(PartCompression::Stored),
        );
        doc.add_paragraph(Paragraph::with_text("x"));

        let back = reparse(&doc);
        let part = back.part("word/media/image1.png").unwrap();
        assert_eq!(part.data, image);
        assert_eq!(part.compression, PartCompression::Stored);
        assert_eq!(back.media_count(), 1);
    }

    #[test]
    fn test_template_written_as_document() {
        let mut doc = Document::new();
        let types = doc
            .parts
            .iter_mut()
            .find(|p| p.name == CONTENT_TYPES_PART)
            .unwrap();
        types.data = String::from_utf8(types.data.clone())
            .unwrap()
            .replace(PackageKind::DOCUMENT_MAIN, PackageKind::TEMPLATE_MAIN)
            .into_bytes();
        doc.metadata.kind = PackageKind::Template;
        doc.add_paragraph(Paragraph::with_text("x"));

        let bytes = to_docx(&doc).unwrap();
        let parser = DocxParser::from_bytes(&bytes).unwrap();
        let written = String::from_utf8(parser.parts()[0].data.clone()).unwrap();
        assert!(written.contains(PackageKind::DOCUMENT_MAIN));
        assert!(!written.contains(PackageKind::TEMPLATE_MAIN));

        let back = reparse(&doc);
        assert_eq!(back.metadata.kind, PackageKind::Document);
    }

    #[test]
    fn test_table_cell_gets_paragraph() {
        let mut table = Table::new();
        table.add_row(TableRow::new(vec![TableCell::with_content(Vec::new())]));
        let mut doc = Document::new();
        doc.add_table(table);

        let back = reparse(&doc);
        match &back.blocks[0] {
            Block::Table(t) => assert_eq!(t.rows[0].cells[0].paragraphs().count(), 1),
            other => panic!("expected table, got {:?}", other),
        }
    }
}
