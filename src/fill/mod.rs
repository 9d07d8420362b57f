//! Placeholder substitution for letter templates.
//!
//! A template carries the tokens `<<Date>>`, `<<Addressee>>`,
//! `<<Salutation>>` and `<<Enter text here>>`. [`substitute`] replaces them
//! in a loaded [`Document`](crate::model::Document) and returns a
//! [`FillReport`] saying what was found.

mod cleanup;
mod engine;
mod inspect;
mod options;
mod placeholder;
mod report;

pub use cleanup::{collapse_blank_after, format_trailing};
pub use engine::substitute;
pub use inspect::{missing_placeholders, scan_tokens, TokenOccurrence, TokenScanner};
pub use options::{FillOptions, FormatOverride, SubstitutionPolicy, STANDARD_FONTS, STANDARD_SIZES};
pub use placeholder::{Placeholder, PlaceholderMap};
pub use report::{preview, FillReport, FillWarning, Location, PlaceholderOutcome};
