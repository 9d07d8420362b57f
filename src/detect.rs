//! Word package detection.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// MIME type of a Word document, for offering the output as a download.
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Zip local file header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Zip magic of an archive with no entries: PK\x05\x06
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";

/// Container format information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerFormat {
    /// Whether the zip archive has no entries
    pub empty: bool,
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.empty {
            write!(f, "empty zip container")
        } else {
            write!(f, "zip container")
        }
    }
}

/// Detect the container format from a file path.
///
/// # Example
/// ```no_run
/// use letterfill::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("template.docx").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<ContainerFormat> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 4];
    let read = file.read(&mut header)?;
    detect_format_from_bytes(&header[..read])
}

/// Detect the container format from bytes.
///
/// Only the zip signature is checked here; whether the archive really holds
/// a Word document is decided when the package is parsed.
///
/// # Returns
/// * `Ok(ContainerFormat)` if the data starts with a zip signature
/// * `Err(Error::UnknownFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<ContainerFormat> {
    if data.starts_with(ZIP_MAGIC) {
        Ok(ContainerFormat { empty: false })
    } else if data.starts_with(ZIP_EMPTY_MAGIC) {
        Ok(ContainerFormat { empty: true })
    } else {
        Err(Error::UnknownFormat)
    }
}

/// Check if a file looks like a Word package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_format_from_path(path), Ok(f) if !f.empty)
}

/// Check if bytes look like a Word package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(f) if !f.empty)
}
