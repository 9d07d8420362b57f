//! Fill options and configuration.

use crate::error::{Error, Result};
use crate::model::RunProperties;

/// Font families offered for the letter text.
pub const STANDARD_FONTS: &[&str] = &["Arial", "Times New Roman", "Calibri", "Aptos"];

/// Point sizes offered for the letter text.
pub const STANDARD_SIZES: &[f32] = &[9.0, 10.0, 10.5, 11.0, 11.5, 12.0];

/// Largest font size Word accepts, in points.
const MAX_FONT_SIZE: f32 = 1638.0;

/// How placeholder text is substituted inside a paragraph.
///
/// Both policies see only the paragraph's direct runs. Runs nested in
/// `w:hyperlink`, `w:sdt` or field wrappers are kept verbatim, so a token
/// typed inside a hyperlink is reported as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionPolicy {
    /// Match on the paragraph text, then rebuild the paragraph as a single
    /// run carrying the formatting of the run that held the token.
    #[default]
    PreserveFormatting,
    /// Replace inside each run, leaving run formatting untouched.
    ///
    /// Tokens split across run boundaries are not replaced; they are
    /// reported as warnings.
    InRun,
}

/// A font family and size forced onto inserted text.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOverride {
    font_name: String,
    font_size: f32,
}

impl FormatOverride {
    /// Create an override, validating that the size can be stored.
    ///
    /// Sizes are kept in half-points, so they must be positive multiples
    /// of 0.5.
    pub fn new(font_name: impl Into<String>, font_size: f32) -> Result<Self> {
        let font_name = font_name.into().trim().to_string();
        if font_name.is_empty() {
            return Err(Error::InvalidFormat("font name is empty".to_string()));
        }
        if !font_size.is_finite() || font_size <= 0.0 || font_size > MAX_FONT_SIZE {
            return Err(Error::InvalidFormat(format!(
                "font size {} is out of range",
                font_size
            )));
        }
        if (font_size * 2.0).fract() != 0.0 {
            return Err(Error::InvalidFormat(format!(
                "font size {} is not a multiple of 0.5",
                font_size
            )));
        }

        Ok(Self {
            font_name,
            font_size,
        })
    }

    /// Font family name.
    pub fn font_name(&self) -> &str {
        &self.font_name
    }

    /// Font size in points.
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Check if the font and size are among the offered choices.
    pub fn is_standard(&self) -> bool {
        STANDARD_FONTS.contains(&self.font_name.as_str()) && STANDARD_SIZES.contains(&self.font_size)
    }

    /// Force the font (Latin and East Asian) and size onto run properties.
    pub fn apply(&self, properties: &mut RunProperties) {
        properties.set_font_name(&self.font_name);
        properties.set_east_asia_font(&self.font_name);
        properties.set_font_size(self.font_size);
    }
}

/// Options for filling a template.
#[derive(Debug, Clone)]
pub struct FillOptions {
    /// Substitution policy
    pub policy: SubstitutionPolicy,

    /// Font and size forced onto inserted text
    pub format_override: Option<FormatOverride>,

    /// Whether the override also applies to the paragraphs after the
    /// letter body (closing, signature block)
    pub format_trailing: bool,

    /// Whether to collapse runs of blank paragraphs after the date line
    pub collapse_blank_after_date: bool,
}

impl FillOptions {
    /// Create new fill options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the substitution policy.
    pub fn with_policy(mut self, policy: SubstitutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use in-run substitution.
    pub fn in_run(mut self) -> Self {
        self.policy = SubstitutionPolicy::InRun;
        self
    }

    /// Force a font and size onto inserted text.
    pub fn with_format_override(mut self, format: FormatOverride) -> Self {
        self.format_override = Some(format);
        self
    }

    /// Enable or disable the trailing-format pass.
    pub fn with_trailing_format(mut self, enabled: bool) -> Self {
        self.format_trailing = enabled;
        self
    }

    /// Enable or disable collapsing blank paragraphs after the date.
    pub fn with_collapse_blank_after_date(mut self, enabled: bool) -> Self {
        self.collapse_blank_after_date = enabled;
        self
    }
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            policy: SubstitutionPolicy::PreserveFormatting,
            format_override: None,
            format_trailing: true,
            collapse_blank_after_date: false,
        }
    }
}
