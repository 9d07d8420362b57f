//! Fill results: what was replaced, removed or not found.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::placeholder::{Placeholder, PlaceholderMap};

/// Where a paragraph sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    /// A top-level paragraph at the given block index
    Body {
        /// Block index in the document body
        block: usize,
    },
    /// A paragraph inside a table cell
    Cell {
        /// Block index of the table
        block: usize,
        /// Row index
        row: usize,
        /// Cell index within the row
        cell: usize,
        /// Block index within the cell
        paragraph: usize,
    },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Body { block } => write!(f, "paragraph {}", block + 1),
            Location::Cell {
                block,
                row,
                cell,
                paragraph,
            } => write!(
                f,
                "table {} row {} cell {} paragraph {}",
                block + 1,
                row + 1,
                cell + 1,
                paragraph + 1
            ),
        }
    }
}

/// What happened to one placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlaceholderOutcome {
    /// The token was substituted
    Replaced {
        /// Number of token occurrences replaced
        occurrences: usize,
    },
    /// The paragraph holding the token was removed (empty addressee)
    Removed,
    /// The token was not found in the template
    NotFound,
}

impl PlaceholderOutcome {
    /// Check if the placeholder was handled (replaced or removed).
    pub fn is_applied(&self) -> bool {
        !matches!(self, PlaceholderOutcome::NotFound)
    }
}

/// A non-fatal condition met while filling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillWarning {
    /// The template contains none of the placeholders
    NoPlaceholders,
    /// A token spans several runs and was left in place (in-run policy)
    SplitToken {
        /// The placeholder that was not replaced
        placeholder: Placeholder,
        /// Paragraph holding the token
        location: Location,
    },
    /// A paragraph marked for removal could not be removed
    RemovalSkipped {
        /// Block index that was no longer present
        block: usize,
    },
}

impl fmt::Display for FillWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillWarning::NoPlaceholders => {
                write!(f, "No placeholders found in the template; output is unchanged")
            }
            FillWarning::SplitToken {
                placeholder,
                location,
            } => write!(
                f,
                "{} at {} spans several runs and was not replaced",
                placeholder, location
            ),
            FillWarning::RemovalSkipped { block } => {
                write!(f, "Paragraph {} was already gone; removal skipped", block + 1)
            }
        }
    }
}

/// Record of a fill run, for reporting back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    /// Outcome per placeholder that had a value
    pub outcomes: BTreeMap<Placeholder, PlaceholderOutcome>,

    /// Paragraphs added by splitting the letter body
    pub paragraphs_inserted: usize,

    /// Paragraphs removed (empty addressee, collapsed blank lines)
    pub paragraphs_removed: usize,

    /// Non-fatal conditions
    pub warnings: Vec<FillWarning>,
}

impl FillReport {
    /// Start a report with every supplied placeholder not found yet.
    pub fn new(placeholders: &PlaceholderMap) -> Self {
        Self {
            outcomes: placeholders
                .placeholders()
                .map(|p| (p, PlaceholderOutcome::NotFound))
                .collect(),
            ..Default::default()
        }
    }

    pub(crate) fn record_replaced(&mut self, placeholder: Placeholder, occurrences: usize) {
        if occurrences == 0 {
            return;
        }
        let outcome = self
            .outcomes
            .entry(placeholder)
            .or_insert(PlaceholderOutcome::NotFound);
        *outcome = match *outcome {
            PlaceholderOutcome::Replaced { occurrences: n } => PlaceholderOutcome::Replaced {
                occurrences: n + occurrences,
            },
            _ => PlaceholderOutcome::Replaced { occurrences },
        };
    }

    pub(crate) fn record_removed(&mut self, placeholder: Placeholder) {
        let outcome = self
            .outcomes
            .entry(placeholder)
            .or_insert(PlaceholderOutcome::NotFound);
        if *outcome == PlaceholderOutcome::NotFound {
            *outcome = PlaceholderOutcome::Removed;
        }
    }

    pub(crate) fn warn(&mut self, warning: FillWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Get the outcome for a placeholder, if it had a value.
    pub fn outcome(&self, placeholder: Placeholder) -> Option<PlaceholderOutcome> {
        self.outcomes.get(&placeholder).copied()
    }

    /// Check if a placeholder was replaced or removed.
    pub fn is_applied(&self, placeholder: Placeholder) -> bool {
        self.outcome(placeholder).map_or(false, |o| o.is_applied())
    }

    /// Placeholders that were replaced or removed.
    pub fn applied(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_applied())
            .map(|(p, _)| *p)
    }

    /// Placeholders with a value that were not found.
    pub fn not_found(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, o)| !o.is_applied())
            .map(|(p, _)| *p)
    }

    /// Check if nothing was applied.
    pub fn is_empty(&self) -> bool {
        self.applied().next().is_none()
    }

    /// Check if any warning was raised.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Shorten a value for display, appending `...` when cut.
pub fn preview(value: &str, max_chars: usize) -> String {
    let flat = value.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut out: String = flat.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_marks_all_not_found() {
        let map = PlaceholderMap::new()
            .with(Placeholder::Date, "today")
            .with(Placeholder::Salutation, "Dear Sir,");
        let report = FillReport::new(&map);

        assert!(report.is_empty());
        assert_eq!(report.not_found().count(), 2);
        assert_eq!(report.outcome(Placeholder::Body), None);
    }

    #[test]
    fn test_record_outcomes() {
        let map = PlaceholderMap::new()
            .with(Placeholder::Date, "today")
            .with(Placeholder::Addressee, "");
        let mut report = FillReport::new(&map);

        report.record_replaced(Placeholder::Date, 1);
        report.record_replaced(Placeholder::Date, 2);
        report.record_replaced(Placeholder::Date, 0);
        report.record_removed(Placeholder::Addressee);

        assert_eq!(
            report.outcome(Placeholder::Date),
            Some(PlaceholderOutcome::Replaced { occurrences: 3 })
        );
        assert_eq!(
            report.outcome(Placeholder::Addressee),
            Some(PlaceholderOutcome::Removed)
        );
        assert_eq!(report.applied().count(), 2);
        assert!(!report.is_empty());
    }

    #[test]
    fn test_warning_messages() {
        let warning = FillWarning::SplitToken {
            placeholder: Placeholder::Salutation,
            location: Location::Body { block: 3 },
        };
        assert_eq!(
            warning.to_string(),
            "<<Salutation>> at paragraph 4 spans several runs and was not replaced"
        );

        let location = Location::Cell {
            block: 0,
            row: 1,
            cell: 0,
            paragraph: 0,
        };
        assert_eq!(location.to_string(), "table 1 row 2 cell 1 paragraph 1");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 50), "short");
        assert_eq!(preview("line one\nline two", 50), "line one line two");
        assert_eq!(preview(&"x".repeat(60), 50), format!("{}...", "x".repeat(50)));
    }
}
