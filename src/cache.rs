//! Per-session cache of the last filled letter.
//!
//! A session holds one template and remembers the output of the last fill,
//! keyed by a fingerprint of everything that shapes the output. Asking for
//! the same letter again returns the stored bytes; any change recomputes
//! and overwrites the single entry.

use std::fmt;

use md5::{Digest, Md5};

use crate::error::Result;
use crate::fill::{FillOptions, FillReport, Placeholder, PlaceholderMap, SubstitutionPolicy};
use crate::letter::LetterRecord;
use crate::parser::ParseOptions;

/// Content fingerprint of a fill request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Fingerprint a fill of the identified template.
    ///
    /// Covers the template identity, every placeholder value (the date as
    /// resolved), the font and size override and the fill switches.
    pub fn new(template_id: &str, placeholders: &PlaceholderMap, options: &FillOptions) -> Self {
        let mut hasher = Md5::new();
        update_field(&mut hasher, template_id.as_bytes());

        for placeholder in Placeholder::ALL {
            match placeholders.get(placeholder) {
                Some(value) => update_field(&mut hasher, value.as_bytes()),
                None => hasher.update([0xff]),
            }
        }

        match options.format_override {
            Some(ref format) => {
                update_field(&mut hasher, format.font_name().as_bytes());
                hasher.update(format.font_size().to_le_bytes());
            }
            None => hasher.update([0xff]),
        }

        hasher.update([
            matches!(options.policy, SubstitutionPolicy::InRun) as u8,
            options.format_trailing as u8,
            options.collapse_blank_after_date as u8,
        ]);

        Self(hasher.finalize().into())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Length-prefixed so adjacent fields cannot run into each other.
fn update_field(hasher: &mut Md5, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// A filled letter ready to be written out.
#[derive(Debug, Clone)]
pub struct FilledLetter {
    /// The `.docx` bytes
    pub bytes: Vec<u8>,

    /// What the fill found and changed
    pub report: FillReport,
}

struct CacheEntry {
    fingerprint: Fingerprint,
    letter: FilledLetter,
}

/// One user's template and the last letter produced from it.
pub struct LetterSession {
    template_id: String,
    template: Vec<u8>,
    parse_options: ParseOptions,
    entry: Option<CacheEntry>,
    hits: u64,
    misses: u64,
}

impl LetterSession {
    /// Start a session for a template.
    ///
    /// The template is identified by its name and a digest of its bytes, so
    /// re-uploading a changed file under the same name is a new template.
    pub fn new(name: impl AsRef<str>, template: Vec<u8>) -> Self {
        let digest = Md5::digest(&template);
        let mut template_id = name.as_ref().to_string();
        template_id.push(':');
        for byte in digest {
            template_id.push_str(&format!("{:02x}", byte));
        }

        Self {
            template_id,
            template,
            parse_options: ParseOptions::default(),
            entry: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Set the options used to load the template.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Identity of the template in fingerprints.
    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    /// Fill the template with a letter, reusing the last output when
    /// nothing changed.
    pub fn render(&mut self, letter: &LetterRecord, options: &FillOptions) -> Result<&FilledLetter> {
        letter.validate()?;
        self.render_placeholders(&letter.placeholders(), options)
    }

    /// Fill the template with explicit placeholder values.
    pub fn render_placeholders(
        &mut self,
        placeholders: &PlaceholderMap,
        options: &FillOptions,
    ) -> Result<&FilledLetter> {
        let fingerprint = Fingerprint::new(&self.template_id, placeholders, options);

        let entry = match self.entry.take() {
            Some(entry) if entry.fingerprint == fingerprint => {
                log::debug!("Session cache hit for {}", fingerprint);
                self.hits += 1;
                entry
            }
            previous => {
                log::debug!("Session cache miss for {}", fingerprint);
                match crate::fill_bytes_with_options(
                    &self.template,
                    placeholders,
                    options,
                    self.parse_options.clone(),
                ) {
                    Ok(letter) => {
                        self.misses += 1;
                        CacheEntry {
                            fingerprint,
                            letter,
                        }
                    }
                    Err(e) => {
                        self.entry = previous;
                        return Err(e);
                    }
                }
            }
        };

        Ok(&self.entry.insert(entry).letter)
    }

    /// Fingerprint of the cached letter, if any.
    pub fn cached_fingerprint(&self) -> Option<Fingerprint> {
        self.entry.as_ref().map(|e| e.fingerprint)
    }

    /// Number of renders served from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of renders that had to fill the template.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop the cached letter.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}
