//! The placeholder tokens and the values supplied for them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the fixed placeholder tokens a letter template carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    /// `<<Date>>`
    Date,
    /// `<<Addressee>>`
    Addressee,
    /// `<<Salutation>>`
    Salutation,
    /// `<<Enter text here>>`, the letter body
    Body,
}

impl Placeholder {
    /// All placeholders in template order.
    pub const ALL: [Placeholder; 4] = [
        Placeholder::Date,
        Placeholder::Addressee,
        Placeholder::Salutation,
        Placeholder::Body,
    ];

    /// The literal token as it appears in the template.
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::Date => "<<Date>>",
            Placeholder::Addressee => "<<Addressee>>",
            Placeholder::Salutation => "<<Salutation>>",
            Placeholder::Body => "<<Enter text here>>",
        }
    }

    /// Look up a placeholder by its literal token.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.token() == token)
    }

    /// Short field name (`date`, `addressee`, ...).
    pub fn field(&self) -> &'static str {
        match self {
            Placeholder::Date => "date",
            Placeholder::Addressee => "addressee",
            Placeholder::Salutation => "salutation",
            Placeholder::Body => "text",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Replacement values keyed by placeholder.
///
/// A placeholder absent from the map is left in the template untouched;
/// one mapped to an empty string is replaced by nothing (or, for the
/// addressee, has its paragraph removed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderMap {
    values: BTreeMap<Placeholder, String>,
}

impl PlaceholderMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value and return self.
    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.insert(placeholder, value);
        self
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, placeholder: Placeholder, value: impl Into<String>) -> Option<String> {
        self.values.insert(placeholder, value.into())
    }

    /// Get the value for a placeholder.
    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }

    /// Check whether a value was supplied for the placeholder.
    pub fn contains(&self, placeholder: Placeholder) -> bool {
        self.values.contains_key(&placeholder)
    }

    /// Iterate over the supplied values in template order.
    pub fn iter(&self) -> impl Iterator<Item = (Placeholder, &str)> {
        self.values.iter().map(|(p, v)| (*p, v.as_str()))
    }

    /// Iterate over the placeholders that have a value.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.values.keys().copied()
    }

    /// Number of supplied values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no value was supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Placeholder, String)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (Placeholder, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
