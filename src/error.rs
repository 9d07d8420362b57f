//! Error types for letterfill library.

use std::io;
use thiserror::Error;

/// Result type alias for letterfill operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, filling or writing a template.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a zip container and cannot be a Word document.
    #[error("Unknown file format: not a valid Word document")]
    UnknownFormat,

    /// Error reading or writing the zip container.
    #[error("Package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Error parsing or writing an XML part.
    #[error("XML error: {0}")]
    Xml(String),

    /// A part required to read the document is absent.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// A package part exceeds the configured size limit.
    #[error("Package part {name} is too large ({size} bytes, limit {limit})")]
    PartTooLarge {
        /// Part name inside the package
        name: String,
        /// Uncompressed size of the part
        size: u64,
        /// Configured limit
        limit: u64,
    },

    /// The requested font override cannot be expressed in a document.
    #[error("Invalid format override: {0}")]
    InvalidFormat(String),

    /// A letter field required to fill the template is empty.
    #[error("No {0} found in letter")]
    MissingField(&'static str),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during rendering (docx, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error means the template itself could not be loaded.
    ///
    /// These are fatal to the current request and carry a message meant for
    /// the user who supplied the file.
    pub fn is_template_load(&self) -> bool {
        matches!(
            self,
            Error::UnknownFormat
                | Error::Zip(_)
                | Error::Xml(_)
                | Error::MissingPart(_)
                | Error::PartTooLarge { .. }
        )
    }
}
