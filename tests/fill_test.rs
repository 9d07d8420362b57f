//! Integration tests for filling real `.docx` packages.

use std::io::{Cursor, Write};

use letterfill::fill::{format_trailing, FormatOverride};
use letterfill::{
    fill_bytes, fill_letter, parse_bytes, Block, FillOptions, LetterFill, LetterRecord,
    Placeholder, PlaceholderMap, PlaceholderOutcome,
};
use zip::write::FileOptions;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

/// Build a `.docx` whose body holds the given paragraph XML.
fn template(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        body
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn para(text: &str) -> String {
    if text.is_empty() {
        return "<w:p/>".to_string();
    }
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape(text)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn letter_map() -> PlaceholderMap {
    PlaceholderMap::new()
        .with(Placeholder::Date, "May 1, 2024")
        .with(Placeholder::Addressee, "")
        .with(Placeholder::Salutation, "Dear Sir,")
        .with(Placeholder::Body, "Para one.\n\nPara two.")
}

#[test]
fn test_letter_scenario() {
    let body: String = ["<<Date>>", "<<Addressee>>", "", "<<Salutation>>", "<<Enter text here>>"]
        .iter()
        .map(|t| para(t))
        .collect();
    let filled = fill_bytes(&template(&body), &letter_map(), &FillOptions::default()).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    assert_eq!(
        doc.paragraph_texts(),
        vec!["May 1, 2024", "Dear Sir,", "Para one.", "Para two."]
    );
    assert_eq!(
        filled.report.outcome(Placeholder::Addressee),
        Some(PlaceholderOutcome::Removed)
    );
    assert_eq!(filled.report.paragraphs_inserted, 1);
}

/// Paragraphs laid out one per line, the way Word and most tools indent.
fn pretty_body(texts: &[&str]) -> String {
    let paras: Vec<String> = texts.iter().map(|t| para(t)).collect();
    format!("\n    {}\n    ", paras.join("\n    "))
}

#[test]
fn test_letter_scenario_pretty_printed() {
    let body = pretty_body(&["<<Date>>", "<<Addressee>>", "", "<<Salutation>>", "<<Enter text here>>"]);
    let filled = fill_bytes(&template(&body), &letter_map(), &FillOptions::default()).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    assert_eq!(
        doc.paragraph_texts(),
        vec!["May 1, 2024", "Dear Sir,", "Para one.", "Para two."]
    );
    assert_eq!(filled.report.paragraphs_removed, 2);
}

#[test]
fn test_addressee_removal_across_bookmark() {
    let body = format!(
        r#"{}<w:bookmarkStart w:id="0" w:name="recipient"/>{}<w:bookmarkEnd w:id="0"/>{}"#,
        para("<<Addressee>>"),
        para(""),
        para("<<Salutation>>")
    );
    let filled = fill_bytes(&template(&body), &letter_map(), &FillOptions::default()).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["Dear Sir,"]);
    // The bookmark pair stays in the body.
    assert_eq!(doc.blocks.iter().filter(|b| b.is_marker()).count(), 2);
}

#[test]
fn test_collapse_date_blanks_pretty_printed() {
    let body = pretty_body(&["<<Date>>", "", "", "", "<<Salutation>>"]);
    let options = FillOptions::new().with_collapse_blank_after_date(true);
    let filled = fill_bytes(&template(&body), &letter_map(), &options).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["May 1, 2024", "", "Dear Sir,"]);
}

#[test]
fn test_only_token_paragraphs_change() {
    let body: String = [
        "<<Date>>",
        "Reference letter",
        "To: <<Addressee>>",
        "<<Salutation>>",
        "<<Enter text here>>",
        "Sincerely,",
    ]
    .iter()
    .map(|t| para(t))
    .collect();
    let map = PlaceholderMap::new()
        .with(Placeholder::Date, "May 1, 2024")
        .with(Placeholder::Addressee, "Admissions Committee")
        .with(Placeholder::Salutation, "Dear Committee,")
        .with(Placeholder::Body, "It is my pleasure.");
    let filled = fill_bytes(&template(&body), &map, &FillOptions::default()).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    assert_eq!(
        doc.paragraph_texts(),
        vec![
            "May 1, 2024",
            "Reference letter",
            "To: Admissions Committee",
            "Dear Committee,",
            "It is my pleasure.",
            "Sincerely,",
        ]
    );
    assert_eq!(filled.report.applied().count(), 4);
}

#[test]
fn test_addressee_and_blank_line_kept_when_given() {
    let body: String = ["<<Addressee>>", "", "<<Salutation>>"]
        .iter()
        .map(|t| para(t))
        .collect();
    let map = letter_map().with(Placeholder::Addressee, "Dr. Smith");
    let filled = fill_bytes(&template(&body), &map, &FillOptions::default()).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["Dr. Smith", "", "Dear Sir,"]);
}

#[test]
fn test_body_split_inherits_style_and_keeps_followers() {
    let body = format!(
        r#"<w:p><w:pPr><w:pStyle w:val="BodyText"/><w:jc w:val="both"/></w:pPr><w:r><w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman"/><w:i/><w:sz w:val="24"/></w:rPr><w:t>&lt;&lt;Enter text here&gt;&gt;</w:t></w:r></w:p>{}"#,
        para("Sincerely,")
    );
    let map = PlaceholderMap::new().with(Placeholder::Body, "First.\n\nSecond.");
    let filled = fill_bytes(&template(&body), &map, &FillOptions::default()).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["First.", "Second.", "Sincerely,"]);

    for p in doc.paragraphs().take(2) {
        assert_eq!(p.style_id(), Some("BodyText"));
        let style = p.runs().next().unwrap().style();
        assert_eq!(style.font_name.as_deref(), Some("Times New Roman"));
        assert_eq!(style.font_size, Some(12.0));
        assert_eq!(style.italic, Some(true));
    }
}

#[test]
fn test_token_split_across_runs() {
    let body = r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>&lt;&lt;Da</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>te&gt;&gt;</w:t></w:r></w:p>"#;
    let map = PlaceholderMap::new().with(Placeholder::Date, "May 1, 2024");
    let filled = fill_bytes(&template(body), &map, &FillOptions::default()).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    let p = doc.paragraphs().next().unwrap();
    assert_eq!(p.plain_text(), "May 1, 2024");
    assert_eq!(p.runs().next().unwrap().style().bold, Some(true));
    assert!(filled.report.is_applied(Placeholder::Date));
}

#[test]
fn test_token_split_across_runs_in_run_policy() {
    let body = r#"<w:p><w:r><w:t>&lt;&lt;Da</w:t></w:r><w:r><w:t>te&gt;&gt;</w:t></w:r></w:p>"#;
    let map = PlaceholderMap::new().with(Placeholder::Date, "May 1, 2024");
    let filled = fill_bytes(&template(body), &map, &FillOptions::new().in_run()).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["<<Date>>"]);
    assert!(!filled.report.is_applied(Placeholder::Date));
    assert!(filled.report.has_warnings());
}

#[test]
fn test_token_inside_hyperlink_is_left_alone() {
    let body = r#"<w:p><w:r><w:t xml:space="preserve">See </w:t></w:r><w:hyperlink w:anchor="top"><w:r><w:t>&lt;&lt;Date&gt;&gt;</w:t></w:r></w:hyperlink></w:p>"#;
    let map = PlaceholderMap::new().with(Placeholder::Date, "May 1, 2024");
    let filled = fill_bytes(&template(body), &map, &FillOptions::default()).unwrap();

    assert_eq!(
        filled.report.outcome(Placeholder::Date),
        Some(PlaceholderOutcome::NotFound)
    );
    let doc = parse_bytes(&filled.bytes).unwrap();
    let p = doc.paragraphs().next().unwrap();
    assert_eq!(p.plain_text(), "See ");
    assert_eq!(p.content.len(), 2);
}

#[test]
fn test_template_without_tokens_round_trips_text() {
    let body: String = ["Dear reader,", "", "Nothing to fill & nothing <to> change."]
        .iter()
        .map(|t| para(t))
        .collect();
    let data = template(&body);
    let before = parse_bytes(&data).unwrap().paragraph_texts();

    let filled = fill_bytes(&data, &letter_map(), &FillOptions::default()).unwrap();
    let after = parse_bytes(&filled.bytes).unwrap().paragraph_texts();

    assert_eq!(before, after);
    assert!(filled.report.is_empty());
}

#[test]
fn test_trailing_format_is_idempotent() {
    let body: String = ["<<Enter text here>>", "Sincerely,", "", "Jane Doe"]
        .iter()
        .map(|t| para(t))
        .collect();
    let format = FormatOverride::new("Calibri", 10.5).unwrap();
    let options = FillOptions::new().with_format_override(format.clone());
    let map = PlaceholderMap::new().with(Placeholder::Body, "Body");
    let filled = fill_bytes(&template(&body), &map, &options).unwrap();

    let mut doc = parse_bytes(&filled.bytes).unwrap();
    let once = serde_json::to_string(&doc.blocks).unwrap();
    format_trailing(&mut doc, 0, &format);
    let twice = serde_json::to_string(&doc.blocks).unwrap();
    assert_eq!(once, twice);

    let signature = doc.paragraphs().nth(3).unwrap();
    let style = signature.runs().next().unwrap().style();
    assert_eq!(style.font_name.as_deref(), Some("Calibri"));
    assert_eq!(style.font_size, Some(10.5));
}

#[test]
fn test_tokens_in_table_cells() {
    let body = format!(
        r#"<w:tbl><w:tblPr/><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>"#,
        para("<<Date>>"),
        para("<<Salutation>>")
    );
    let filled = fill_bytes(&template(&body), &letter_map(), &FillOptions::default()).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    let table = match &doc.blocks[0] {
        Block::Table(t) => t,
        other => panic!("expected table, got {:?}", other),
    };
    assert_eq!(table.rows[0].cells[0].plain_text(), "May 1, 2024");
    assert_eq!(table.rows[0].cells[1].plain_text(), "Dear Sir,");
}

#[test]
fn test_fill_letter_with_builder() {
    let body: String = ["<<Date>>", "<<Salutation>>", "<<Enter text here>>"]
        .iter()
        .map(|t| para(t))
        .collect();
    let letter = LetterRecord::new("Body text.", "Dear Committee,").with_date("June 2, 2025");

    let filled = LetterFill::new()
        .with_font("Aptos", 12.0)
        .unwrap()
        .fill_bytes(&template(&body), &letter)
        .unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    assert_eq!(
        doc.paragraph_texts(),
        vec!["June 2, 2025", "Dear Committee,", "Body text."]
    );
    let body_run = doc.paragraphs().nth(2).unwrap().runs().next().unwrap().style();
    assert_eq!(body_run.font_name.as_deref(), Some("Aptos"));
}

#[test]
fn test_fill_letter_defaults_date_to_today() {
    let letter = LetterRecord::new("Body", "Dear Sir,");
    let filled = fill_letter(&template(&para("<<Date>>")), &letter, &FillOptions::default()).unwrap();

    let doc = parse_bytes(&filled.bytes).unwrap();
    let today = chrono::Local::now().date_naive();
    let texts = doc.paragraph_texts();
    // The fill may straddle midnight.
    let accepted = [
        today.format("%B %d, %Y").to_string(),
        today.pred_opt().unwrap().format("%B %d, %Y").to_string(),
    ];
    assert!(accepted.contains(&texts[0]), "{}", texts[0]);
}
