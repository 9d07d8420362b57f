//! # letterfill
//!
//! Fill recommendation-letter Word templates.
//!
//! A template is an ordinary `.docx` (or `.dotx`) file carrying the tokens
//! `<<Date>>`, `<<Addressee>>`, `<<Salutation>>` and `<<Enter text here>>`.
//! This library loads the package, substitutes the tokens with a letter's
//! fields while keeping the template's formatting, and writes a new
//! document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use letterfill::{fill_letter, FillOptions, LetterRecord};
//!
//! fn main() -> letterfill::Result<()> {
//!     let template = std::fs::read("template.docx")?;
//!     let letter = LetterRecord::new("It is my pleasure...\n\nSincerely,", "Dear Committee,")
//!         .with_addressee("Admissions Committee");
//!
//!     let filled = fill_letter(&template, &letter, &FillOptions::default())?;
//!     std::fs::write("recommendation_letter.docx", &filled.bytes)?;
//!
//!     for placeholder in filled.report.not_found() {
//!         println!("{} not found in template", placeholder);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Formatting preserved**: replacement text takes the style of the run
//!   that held the token
//! - **Multi-paragraph bodies**: blank lines in the letter text become new
//!   paragraphs styled like the placeholder paragraph
//! - **Optional addressee**: an empty addressee removes its line
//! - **Font override**: restyle the letter with one of the standard fonts
//! - **Session cache**: identical requests reuse the last output
//! - **Letter store**: short-lived letters shared between pages by id

pub mod cache;
pub mod detect;
pub mod error;
pub mod fill;
pub mod letter;
pub mod model;
pub mod parser;
pub mod render;
pub mod store;
pub mod xml;

// Re-export commonly used types
pub use cache::{FilledLetter, Fingerprint, LetterSession};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, ContainerFormat, DOCX_MIME};
pub use error::{Error, Result};
pub use fill::{
    FillOptions, FillReport, FillWarning, FormatOverride, Location, Placeholder, PlaceholderMap,
    PlaceholderOutcome, SubstitutionPolicy,
};
pub use letter::{LetterOverrides, LetterRecord};
pub use model::{
    Block, Document, InlineContent, Metadata, PackageKind, Paragraph, Table, TableCell, TableRow,
    TextRun, TextStyle,
};
pub use parser::{DocxParser, ErrorMode, ParseOptions};
pub use render::JsonFormat;
pub use store::{LetterStore, StoreConfig, SweeperHandle};

use std::io::Read;
use std::path::Path;

/// Parse a Word file and return a structured document.
///
/// # Example
///
/// ```no_run
/// use letterfill::parse_file;
///
/// let doc = parse_file("template.docx").unwrap();
/// println!("Paragraphs: {}", doc.paragraph_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let parser = DocxParser::open(path)?;
    parser.parse()
}

/// Parse a Word file with custom options.
///
/// # Example
///
/// ```no_run
/// use letterfill::{parse_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new().lenient();
/// let doc = parse_file_with_options("template.docx", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    let parser = DocxParser::open_with_options(path, options)?;
    parser.parse()
}

/// Parse a Word document from bytes.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    let parser = DocxParser::from_bytes(data)?;
    parser.parse()
}

/// Parse a Word document from bytes with custom options.
pub fn parse_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Document> {
    let parser = DocxParser::from_bytes_with_options(data, options)?;
    parser.parse()
}

/// Parse a Word document from a reader.
///
/// # Example
///
/// ```no_run
/// use letterfill::parse_reader;
/// use std::fs::File;
///
/// let file = File::open("template.docx").unwrap();
/// let doc = parse_reader(file).unwrap();
/// ```
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    let parser = DocxParser::from_reader(reader)?;
    parser.parse()
}

/// Parse a Word document from a reader with custom options.
pub fn parse_reader_with_options<R: Read>(reader: R, options: ParseOptions) -> Result<Document> {
    let parser = DocxParser::from_reader_with_options(reader, options)?;
    parser.parse()
}

/// Fill template bytes with explicit placeholder values.
///
/// Placeholders absent from `placeholders` are left in the document as
/// they are.
pub fn fill_bytes(
    template: &[u8],
    placeholders: &PlaceholderMap,
    options: &FillOptions,
) -> Result<FilledLetter> {
    fill_bytes_with_options(template, placeholders, options, ParseOptions::default())
}

/// Fill template bytes, loading the template with custom parse options.
pub fn fill_bytes_with_options(
    template: &[u8],
    placeholders: &PlaceholderMap,
    options: &FillOptions,
    parse_options: ParseOptions,
) -> Result<FilledLetter> {
    let mut doc = parse_bytes_with_options(template, parse_options)?;
    let report = fill::substitute(&mut doc, placeholders, options);
    let bytes = render::to_docx(&doc)?;

    log::debug!(
        "Filled template: {} placeholders applied, {} paragraphs inserted, {} removed",
        report.applied().count(),
        report.paragraphs_inserted,
        report.paragraphs_removed
    );

    Ok(FilledLetter { bytes, report })
}

/// Fill template bytes with a letter.
///
/// The letter must carry a body and a salutation; the date defaults to
/// today.
pub fn fill_letter(
    template: &[u8],
    letter: &LetterRecord,
    options: &FillOptions,
) -> Result<FilledLetter> {
    letter.validate()?;
    fill_bytes(template, &letter.placeholders(), options)
}

/// Extract plain text from a Word file.
///
/// # Example
///
/// ```no_run
/// use letterfill::extract_text;
///
/// let text = extract_text("recommendation_letter.docx").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_text(&doc)
}

/// Convert a Word file to its JSON model.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_json(&doc, format)
}

/// Builder for filling letter templates.
///
/// # Example
///
/// ```no_run
/// use letterfill::{LetterFill, LetterRecord};
///
/// let letter = LetterRecord::new("Body text", "Dear Committee,");
/// let filled = LetterFill::new()
///     .with_font("Arial", 11.0)?
///     .collapse_date_blanks()
///     .fill_file("template.docx", &letter)?;
/// std::fs::write("recommendation_letter.docx", &filled.bytes)?;
/// # Ok::<(), letterfill::Error>(())
/// ```
pub struct LetterFill {
    parse_options: ParseOptions,
    fill_options: FillOptions,
}

impl LetterFill {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            fill_options: FillOptions::default(),
        }
    }

    /// Enable lenient template loading.
    pub fn lenient(mut self) -> Self {
        self.parse_options = self.parse_options.lenient();
        self
    }

    /// Set the largest accepted package part.
    pub fn with_max_part_size(mut self, bytes: u64) -> Self {
        self.parse_options = self.parse_options.with_max_part_size(bytes);
        self
    }

    /// Replace tokens inside the run that holds them.
    pub fn in_run(mut self) -> Self {
        self.fill_options = self.fill_options.in_run();
        self
    }

    /// Restyle the filled letter with a font and size.
    pub fn with_font(mut self, font_name: impl Into<String>, font_size: f32) -> Result<Self> {
        let format = FormatOverride::new(font_name, font_size)?;
        self.fill_options = self.fill_options.with_format_override(format);
        Ok(self)
    }

    /// Leave paragraphs after the letter body in their template style.
    pub fn without_trailing_format(mut self) -> Self {
        self.fill_options = self.fill_options.with_trailing_format(false);
        self
    }

    /// Remove blank paragraphs directly after the date line.
    pub fn collapse_date_blanks(mut self) -> Self {
        self.fill_options = self.fill_options.with_collapse_blank_after_date(true);
        self
    }

    /// The fill options collected so far.
    pub fn fill_options(&self) -> &FillOptions {
        &self.fill_options
    }

    /// Fill template bytes with a letter.
    pub fn fill_bytes(self, template: &[u8], letter: &LetterRecord) -> Result<FilledLetter> {
        letter.validate()?;
        fill_bytes_with_options(
            template,
            &letter.placeholders(),
            &self.fill_options,
            self.parse_options,
        )
    }

    /// Fill a template file with a letter.
    pub fn fill_file<P: AsRef<Path>>(self, path: P, letter: &LetterRecord) -> Result<FilledLetter> {
        let template = std::fs::read(path)?;
        self.fill_bytes(&template, letter)
    }

    /// Start a cached session for a template with these options.
    pub fn session(self, name: impl AsRef<str>, template: Vec<u8>) -> LetterSession {
        LetterSession::new(name, template).with_parse_options(self.parse_options)
    }
}

impl Default for LetterFill {
    fn default() -> Self {
        Self::new()
    }
}
