//! The letter record: the field values a template is filled with.

use std::io::Read;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::fill::{Placeholder, PlaceholderMap};

/// Date format used when no date is given ("May 01, 2024").
pub const DATE_FORMAT: &str = "%B %d, %Y";

/// Field values for one letter.
///
/// This is the JSON shape the letter store hands out; unknown fields such
/// as a storage timestamp are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterRecord {
    /// Letter body; blank lines separate paragraphs
    #[serde(default)]
    pub text: String,

    /// Recipient block; empty removes the addressee line from the letter
    #[serde(default)]
    pub addressee: String,

    /// Greeting line ("Dear Dr. Smith,")
    #[serde(default)]
    pub salutation: String,

    /// Date line; today's date when absent or empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl LetterRecord {
    /// Create a record with the required fields.
    pub fn new(text: impl Into<String>, salutation: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            salutation: salutation.into(),
            ..Default::default()
        }
    }

    /// Set the addressee and return self.
    pub fn with_addressee(mut self, addressee: impl Into<String>) -> Self {
        self.addressee = addressee.into();
        self
    }

    /// Set the date line and return self.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Parse a record from JSON, normalizing the text fields.
    pub fn from_json(json: &str) -> Result<Self> {
        let record: LetterRecord = serde_json::from_str(json)?;
        Ok(record.normalized())
    }

    /// Read a JSON record from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let record: LetterRecord = serde_json::from_reader(reader)?;
        Ok(record.normalized())
    }

    /// Serialize the record to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Apply individual field overrides on top of this record.
    pub fn with_overrides(mut self, overrides: &LetterOverrides) -> Self {
        if let Some(ref text) = overrides.text {
            self.text = normalize(text);
        }
        if let Some(ref addressee) = overrides.addressee {
            self.addressee = normalize(addressee);
        }
        if let Some(ref salutation) = overrides.salutation {
            self.salutation = normalize(salutation);
        }
        if let Some(ref date) = overrides.date {
            self.date = Some(normalize(date));
        }
        self
    }

    /// Line endings to `\n` and Unicode NFC in every field.
    pub fn normalized(self) -> Self {
        Self {
            text: normalize(&self.text),
            addressee: normalize(&self.addressee),
            salutation: normalize(&self.salutation),
            date: self.date.as_deref().map(normalize),
        }
    }

    /// Check that the fields a letter cannot do without are present.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::MissingField("text"));
        }
        if self.salutation.trim().is_empty() {
            return Err(Error::MissingField("salutation"));
        }
        Ok(())
    }

    /// The date line, or `today` formatted when none was given.
    pub fn date_or(&self, today: NaiveDate) -> String {
        match self.date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => date.to_string(),
            _ => today.format(DATE_FORMAT).to_string(),
        }
    }

    /// Fix the date line now, so every later placeholder map agrees on it.
    pub fn dated(self) -> Self {
        self.dated_on(Local::now().date_naive())
    }

    /// Fix the date line, using `today` when none was given.
    pub fn dated_on(mut self, today: NaiveDate) -> Self {
        self.date = Some(self.date_or(today));
        self
    }

    /// Build the placeholder map, dating the letter today if needed.
    pub fn placeholders(&self) -> PlaceholderMap {
        self.placeholders_on(Local::now().date_naive())
    }

    /// Build the placeholder map with the given date as "today".
    pub fn placeholders_on(&self, today: NaiveDate) -> PlaceholderMap {
        PlaceholderMap::new()
            .with(Placeholder::Date, self.date_or(today))
            .with(Placeholder::Addressee, normalize(&self.addressee))
            .with(Placeholder::Salutation, normalize(&self.salutation))
            .with(Placeholder::Body, normalize(&self.text))
    }
}

/// Individual field values that replace those of a fetched record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterOverrides {
    /// Letter body
    pub text: Option<String>,
    /// Addressee
    pub addressee: Option<String>,
    /// Salutation
    pub salutation: Option<String>,
    /// Date line
    pub date: Option<String>,
}

impl LetterOverrides {
    /// Check if no field is overridden.
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.addressee.is_none()
            && self.salutation.is_none()
            && self.date.is_none()
    }
}

fn normalize(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\r', "\n").nfc().collect()
}
