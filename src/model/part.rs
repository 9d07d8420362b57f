//! Package parts: the files inside the `.docx` zip container.

use serde::{Deserialize, Serialize};

/// A part (zip entry) of the document package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagePart {
    /// Part name inside the package (e.g., "word/styles.xml")
    pub name: String,

    /// Raw part content
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,

    /// How the part was stored in the container
    pub compression: PartCompression,
}

impl PackagePart {
    /// Create a new deflated part.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            compression: PartCompression::Deflated,
        }
    }

    /// Set the compression method.
    pub fn with_compression(mut self, compression: PartCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Get the size of the part data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if this is an XML part (including relationship parts).
    pub fn is_xml(&self) -> bool {
        let lower = self.name.to_ascii_lowercase();
        lower.ends_with(".xml") || lower.ends_with(".rels")
    }

    /// Check if this part is embedded media (images, etc.).
    pub fn is_media(&self) -> bool {
        self.name.starts_with("word/media/")
    }

    /// Get the MIME type guessed from the part extension.
    pub fn mime_type(&self) -> &str {
        match self.extension().to_ascii_lowercase().as_str() {
            "xml" => "application/xml",
            "rels" => "application/vnd.openxmlformats-package.relationships+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "emf" => "image/x-emf",
            "wmf" => "image/x-wmf",
            "tif" | "tiff" => "image/tiff",
            "svg" => "image/svg+xml",
            "ttf" | "odttf" => "application/x-font-ttf",
            _ => "application/octet-stream",
        }
    }

    /// Get the file extension of the part name.
    pub fn extension(&self) -> &str {
        self.name
            .rsplit_once('/')
            .map(|(_, file)| file)
            .unwrap_or(&self.name)
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("")
    }
}

/// Compression method of a package part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartCompression {
    /// Stored without compression
    Stored,
    /// Deflate compression (default)
    #[default]
    Deflated,
}
