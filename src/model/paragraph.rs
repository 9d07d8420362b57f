//! Paragraph and text-level types.

use serde::{Deserialize, Serialize};

use super::block::MARKER_ELEMENTS;
use crate::xml::{XmlElement, XmlNode};

/// Prefix used for elements created by this crate.
pub(crate) const W: &str = "w";

pub(crate) fn w(local: &str) -> String {
    format!("{W}:{local}")
}

/// A paragraph (`w:p`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Attributes of the `w:p` element (revision ids, paragraph id)
    #[serde(default)]
    pub attributes: Vec<(String, String)>,

    /// Paragraph properties (`w:pPr`), kept verbatim
    pub properties: Option<XmlElement>,

    /// Runs and other inline content in the paragraph
    pub content: Vec<InlineContent>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_text(text);
        p
    }

    /// Create an empty paragraph sharing this paragraph's properties.
    ///
    /// Element attributes are not copied: paragraph ids must stay unique.
    pub fn sibling(&self) -> Self {
        Self {
            attributes: Vec::new(),
            properties: self.properties.clone(),
            content: Vec::new(),
        }
    }

    /// Set the paragraph style id (`w:pStyle`) and return self.
    pub fn with_style_id(mut self, style_id: impl Into<String>) -> Self {
        let properties = self.properties.get_or_insert_with(|| XmlElement::new(w("pPr")));
        let style = XmlElement::new(w("pStyle")).with_attr(w("val"), style_id);
        match properties.child_mut("pStyle") {
            Some(existing) => *existing = style,
            None => properties.children.insert(0, XmlNode::Element(style)),
        }
        self
    }

    /// Get the paragraph style id, if any.
    pub fn style_id(&self) -> Option<&str> {
        self.properties
            .as_ref()?
            .child("pStyle")?
            .attributes
            .iter()
            .find(|(k, _)| crate::xml::local_name(k) == "val")
            .map(|(_, v)| v.as_str())
    }

    /// Add plain text to the paragraph.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.content.push(InlineContent::Run(TextRun::new(text)));
    }

    /// Add a run.
    pub fn add_run(&mut self, run: TextRun) {
        self.content.push(InlineContent::Run(run));
    }

    /// Remove all inline content, keeping the paragraph properties.
    pub fn clear(&mut self) {
        self.content.clear();
    }

    /// Iterate over the runs of the paragraph.
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.content.iter().filter_map(|c| match c {
            InlineContent::Run(run) => Some(run),
            InlineContent::Other(_) => None,
        })
    }

    /// Iterate mutably over the runs of the paragraph.
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut TextRun> {
        self.content.iter_mut().filter_map(|c| match c {
            InlineContent::Run(run) => Some(run),
            InlineContent::Other(_) => None,
        })
    }

    /// Get plain text content of the paragraph (concatenated run text).
    ///
    /// Only direct runs count; text inside hyperlinks and other wrappers
    /// is left out.
    pub fn plain_text(&self) -> String {
        self.runs().map(|r| r.text()).collect()
    }

    /// Check if the paragraph has no content at all.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Check if the paragraph shows nothing: blank text and no drawings,
    /// fields or other embedded content.
    pub fn is_blank(&self) -> bool {
        self.plain_text().trim().is_empty() && !self.has_embedded_content()
    }

    /// Check for inline content other than plain text.
    pub fn has_embedded_content(&self) -> bool {
        self.content.iter().any(|c| match c {
            InlineContent::Run(run) => run.has_embedded_content(),
            InlineContent::Other(XmlNode::Element(e)) => {
                !MARKER_ELEMENTS.contains(&e.local_name())
            }
            InlineContent::Other(XmlNode::Text { .. }) => false,
        })
    }
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InlineContent {
    /// A text run (`w:r`)
    Run(TextRun),

    /// Anything else (hyperlinks, bookmarks, fields), kept verbatim
    Other(XmlNode),
}

/// A run of text with consistent formatting (`w:r`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Attributes of the `w:r` element
    #[serde(default)]
    pub attributes: Vec<(String, String)>,

    /// Run properties (`w:rPr`)
    pub properties: RunProperties,

    /// Run content in source order
    pub content: Vec<RunContent>,
}

impl TextRun {
    /// Create a new run with inherited formatting.
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        let mut run = Self::default();
        run.set_text(&text);
        run
    }

    /// Create a run carrying the given formatting record.
    pub fn styled(text: impl Into<String>, style: &TextStyle) -> Self {
        let mut run = Self::new(text);
        run.properties.apply(style);
        run
    }

    /// Create a bold run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            &TextStyle {
                bold: Some(true),
                ..Default::default()
            },
        )
    }

    /// Get the run text. Tabs map to `\t`, line breaks to `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for item in &self.content {
            match item {
                RunContent::Text(s) => out.push_str(s),
                RunContent::Tab => out.push('\t'),
                RunContent::Break => out.push('\n'),
                RunContent::Other(_) => {}
            }
        }
        out
    }

    /// Replace the run content with the given text.
    ///
    /// `\t` becomes a tab and `\n` a line break; `\r` is dropped. Any
    /// embedded content previously in the run is discarded.
    pub fn set_text(&mut self, text: &str) {
        self.content.clear();
        let mut current = String::new();
        for ch in text.chars() {
            match ch {
                '\t' | '\n' => {
                    if !current.is_empty() {
                        self.content.push(RunContent::Text(std::mem::take(&mut current)));
                    }
                    self.content.push(if ch == '\t' {
                        RunContent::Tab
                    } else {
                        RunContent::Break
                    });
                }
                '\r' => {}
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            self.content.push(RunContent::Text(current));
        }
    }

    /// Check whether the run text contains the given string.
    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }

    /// Check if this run has no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Check for content other than text, tabs and breaks (drawings, fields).
    pub fn has_embedded_content(&self) -> bool {
        self.content.iter().any(|c| {
            matches!(c, RunContent::Other(XmlNode::Element(e))
                if e.local_name() != "lastRenderedPageBreak")
        })
    }

    /// Get the formatting record of this run.
    pub fn style(&self) -> TextStyle {
        self.properties.text_style()
    }
}

/// Content item inside a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RunContent {
    /// Literal text (`w:t`)
    Text(String),

    /// A tab character (`w:tab`)
    Tab,

    /// A line break (`w:br`, `w:cr`)
    Break,

    /// Anything else (drawings, field characters, page breaks), kept verbatim
    Other(XmlNode),
}

/// Schema order of `w:rPr` children; Word rejects out-of-order properties.
const RPR_ORDER: &[&str] = &[
    "rStyle",
    "rFonts",
    "b",
    "bCs",
    "i",
    "iCs",
    "caps",
    "smallCaps",
    "strike",
    "dstrike",
    "outline",
    "shadow",
    "emboss",
    "imprint",
    "noProof",
    "snapToGrid",
    "vanish",
    "webHidden",
    "color",
    "spacing",
    "w",
    "kern",
    "position",
    "sz",
    "szCs",
    "highlight",
    "u",
    "effect",
    "bdr",
    "shd",
    "fitText",
    "vertAlign",
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
];

fn rpr_rank(local: &str) -> usize {
    RPR_ORDER
        .iter()
        .position(|name| *name == local)
        .unwrap_or(usize::MAX)
}

/// Run properties (`w:rPr` children), edited in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunProperties {
    /// Property elements in source order
    pub children: Vec<XmlNode>,
}

impl RunProperties {
    /// Create empty run properties (everything inherited).
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no property is set on the run.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn get(&self, local: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .filter_map(XmlNode::as_element)
            .find(|e| e.local_name() == local)
    }

    fn get_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|n| match n {
            XmlNode::Element(e) if e.local_name() == local => Some(e),
            _ => None,
        })
    }

    /// Insert or replace a property element, keeping schema order.
    fn upsert(&mut self, element: XmlElement) {
        if let Some(existing) = self.get_mut(element.local_name()) {
            *existing = element;
            return;
        }
        let rank = rpr_rank(element.local_name());
        let pos = self
            .children
            .iter()
            .position(|n| n.local_name().map_or(false, |l| rpr_rank(l) > rank))
            .unwrap_or(self.children.len());
        self.children.insert(pos, XmlNode::Element(element));
    }

    fn val(&self, local: &str) -> Option<&str> {
        self.get(local)?.attr("w:val")
    }

    fn toggle(&self, local: &str) -> Option<bool> {
        let element = self.get(local)?;
        Some(!matches!(
            element.attr("w:val"),
            Some("0") | Some("false") | Some("off")
        ))
    }

    /// Get the font family name (`w:rFonts` ascii, falling back to hAnsi).
    pub fn font_name(&self) -> Option<&str> {
        let fonts = self.get("rFonts")?;
        fonts.attr("w:ascii").or_else(|| fonts.attr("w:hAnsi"))
    }

    /// Set the font family for Latin text.
    ///
    /// Theme font attributes are dropped since they take precedence over
    /// explicit names.
    pub fn set_font_name(&mut self, name: &str) {
        let mut fonts = self
            .get("rFonts")
            .cloned()
            .unwrap_or_else(|| XmlElement::new(w("rFonts")));
        fonts.set_attr("w:ascii", name);
        fonts.set_attr("w:hAnsi", name);
        fonts.remove_attr("w:asciiTheme");
        fonts.remove_attr("w:hAnsiTheme");
        self.upsert(fonts);
    }

    /// Set the font family for East Asian text.
    pub fn set_east_asia_font(&mut self, name: &str) {
        let mut fonts = self
            .get("rFonts")
            .cloned()
            .unwrap_or_else(|| XmlElement::new(w("rFonts")));
        fonts.set_attr("w:eastAsia", name);
        fonts.remove_attr("w:eastAsiaTheme");
        self.upsert(fonts);
    }

    /// Get the font size in points.
    pub fn font_size(&self) -> Option<f32> {
        let half_points: f32 = self.val("sz")?.parse().ok()?;
        Some(half_points / 2.0)
    }

    /// Set the font size in points (stored as half-points).
    pub fn set_font_size(&mut self, points: f32) {
        let half_points = (points * 2.0).round().max(1.0) as u32;
        self.upsert(XmlElement::new(w("sz")).with_attr("w:val", half_points.to_string()));
        self.upsert(XmlElement::new(w("szCs")).with_attr("w:val", half_points.to_string()));
    }

    /// Set or clear a toggle property such as bold or italic.
    fn set_toggle(&mut self, local: &str, on: bool) {
        let element = if on {
            XmlElement::new(w(local))
        } else {
            XmlElement::new(w(local)).with_attr("w:val", "0")
        };
        self.upsert(element);
    }

    /// Set bold.
    pub fn set_bold(&mut self, on: bool) {
        self.set_toggle("b", on);
    }

    /// Set italic.
    pub fn set_italic(&mut self, on: bool) {
        self.set_toggle("i", on);
    }

    /// Set the underline style (`single`, `double`, `none`, ...).
    pub fn set_underline(&mut self, style: &str) {
        self.upsert(XmlElement::new(w("u")).with_attr("w:val", style));
    }

    /// Set the text color (hex without `#`, or `auto`).
    pub fn set_color(&mut self, color: &str) {
        let color = color.trim_start_matches('#');
        self.upsert(XmlElement::new(w("color")).with_attr("w:val", color));
    }

    /// Read the formatting record from these properties.
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font_name: self.font_name().map(str::to_string),
            font_size: self.font_size(),
            bold: self.toggle("b"),
            italic: self.toggle("i"),
            underline: self.val("u").map(str::to_string),
            color: self.val("color").map(str::to_string),
        }
    }

    /// Apply a formatting record. Only properties present in the record
    /// are written; absent ones keep inheriting.
    pub fn apply(&mut self, style: &TextStyle) {
        if let Some(ref name) = style.font_name {
            self.set_font_name(name);
        }
        if let Some(size) = style.font_size {
            self.set_font_size(size);
        }
        if let Some(bold) = style.bold {
            self.set_bold(bold);
        }
        if let Some(italic) = style.italic {
            self.set_italic(italic);
        }
        if let Some(ref underline) = style.underline {
            self.set_underline(underline);
        }
        if let Some(ref color) = style.color {
            self.set_color(color);
        }
    }
}

/// Formatting record of a run. `None` means "inherit from style".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font name
    pub font_name: Option<String>,

    /// Font size in points
    pub font_size: Option<f32>,

    /// Bold text
    pub bold: Option<bool>,

    /// Italic text
    pub italic: Option<bool>,

    /// Underline style (e.g., "single")
    pub underline: Option<String>,

    /// Text color (hex without `#`, e.g., "FF0000")
    pub color: Option<String>,
}

impl TextStyle {
    /// Check if every property is inherited.
    pub fn is_inherited(&self) -> bool {
        self == &TextStyle::default()
    }

    /// Check if any emphasis is switched on.
    pub fn has_styling(&self) -> bool {
        self.bold == Some(true)
            || self.italic == Some(true)
            || self.underline.as_deref().map_or(false, |u| u != "none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_plain_text() {
        let mut p = Paragraph::new();
        p.add_text("Hello ");
        p.add_run(TextRun::bold("world"));
        p.add_text("!");

        assert_eq!(p.plain_text(), "Hello world!");
    }

    #[test]
    fn test_run_text_tabs_and_breaks() {
        let run = TextRun::new("a\tb\nc\r\n");
        assert_eq!(
            run.content,
            vec![
                RunContent::Text("a".into()),
                RunContent::Tab,
                RunContent::Text("b".into()),
                RunContent::Break,
                RunContent::Text("c".into()),
                RunContent::Break,
            ]
        );
        assert_eq!(run.text(), "a\tb\nc\n");
    }

    #[test]
    fn test_style_id() {
        let p = Paragraph::with_text("Body").with_style_id("BodyText");
        assert_eq!(p.style_id(), Some("BodyText"));

        let p = p.with_style_id("Signature");
        assert_eq!(p.style_id(), Some("Signature"));
        assert_eq!(Paragraph::new().style_id(), None);
    }

    #[test]
    fn test_sibling_shares_properties() {
        let p = Paragraph::with_text("x").with_style_id("Letter");
        let sibling = p.sibling();
        assert!(sibling.is_empty());
        assert_eq!(sibling.style_id(), Some("Letter"));
    }

    #[test]
    fn test_blank_paragraph() {
        assert!(Paragraph::new().is_blank());
        assert!(Paragraph::with_text("   ").is_blank());
        assert!(!Paragraph::with_text("x").is_blank());

        let mut with_drawing = Paragraph::new();
        let mut run = TextRun::default();
        run.content.push(RunContent::Other(XmlNode::Element(XmlElement::new(
            "w:drawing",
        ))));
        with_drawing.add_run(run);
        assert!(!with_drawing.is_blank());

        let mut with_bookmark = Paragraph::new();
        with_bookmark.content.push(InlineContent::Other(XmlNode::Element(
            XmlElement::new("w:bookmarkStart"),
        )));
        assert!(with_bookmark.is_blank());
    }

    #[test]
    fn test_run_properties_round_trip() {
        let style = TextStyle {
            font_name: Some("Aptos".into()),
            font_size: Some(10.5),
            bold: Some(true),
            italic: Some(false),
            underline: Some("single".into()),
            color: Some("#1F3864".into()),
        };
        let run = TextRun::styled("x", &style);
        let read = run.style();

        assert_eq!(read.font_name.as_deref(), Some("Aptos"));
        assert_eq!(read.font_size, Some(10.5));
        assert_eq!(read.bold, Some(true));
        assert_eq!(read.italic, Some(false));
        assert_eq!(read.underline.as_deref(), Some("single"));
        assert_eq!(read.color.as_deref(), Some("1F3864"));
    }

    #[test]
    fn test_run_properties_schema_order() {
        let mut props = RunProperties::new();
        props.set_font_size(12.0);
        props.set_bold(true);
        props.set_color("FF0000");
        props.set_font_name("Arial");

        let order: Vec<&str> = props
            .children
            .iter()
            .filter_map(XmlNode::local_name)
            .collect();
        assert_eq!(order, vec!["rFonts", "b", "color", "sz", "szCs"]);
    }

    #[test]
    fn test_set_font_drops_theme_fonts() {
        let mut props = RunProperties::new();
        props.children.push(XmlNode::Element(
            XmlElement::new("w:rFonts")
                .with_attr("w:asciiTheme", "minorHAnsi")
                .with_attr("w:hAnsiTheme", "minorHAnsi"),
        ));
        props.set_font_name("Calibri");
        props.set_east_asia_font("Calibri");

        let fonts = props.get("rFonts").unwrap();
        assert_eq!(fonts.attr("w:asciiTheme"), None);
        assert_eq!(fonts.attr("w:ascii"), Some("Calibri"));
        assert_eq!(fonts.attr("w:eastAsia"), Some("Calibri"));
        assert_eq!(props.children.len(), 1);
    }

    #[test]
    fn test_apply_leaves_absent_properties_inherited() {
        let mut props = RunProperties::new();
        props.apply(&TextStyle {
            bold: Some(true),
            ..Default::default()
        });
        let style = props.text_style();
        assert_eq!(style.bold, Some(true));
        assert_eq!(style.font_name, None);
        assert_eq!(style.font_size, None);
        assert!(style.has_styling());
        assert!(TextStyle::default().is_inherited());
    }

    #[test]
    fn test_toggle_off_values() {
        let mut props = RunProperties::new();
        props.children.push(XmlNode::Element(
            XmlElement::new("w:b").with_attr("w:val", "false"),
        ));
        assert_eq!(props.text_style().bold, Some(false));
    }
}
