//! Parsing options and configuration.

/// Default limit on the uncompressed size of a single package part.
pub const DEFAULT_MAX_PART_SIZE: u64 = 64 * 1024 * 1024;

/// Options for loading Word packages.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Largest accepted uncompressed part, in bytes (0 = unlimited)
    pub max_part_size: u64,

    /// Whether to read the core properties part (title, author, dates)
    pub read_metadata: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (tolerate damaged secondary parts).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set the part size limit in bytes.
    pub fn with_max_part_size(mut self, bytes: u64) -> Self {
        self.max_part_size = bytes;
        self
    }

    /// Enable or disable reading the core properties.
    pub fn with_metadata(mut self, read: bool) -> Self {
        self.read_metadata = read;
        self
    }

    pub(crate) fn part_limit(&self) -> Option<u64> {
        (self.max_part_size > 0).then_some(self.max_part_size)
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            max_part_size: DEFAULT_MAX_PART_SIZE,
            read_metadata: true,
        }
    }
}

/// Error handling mode during parsing.
///
/// The main document part must always parse. The mode decides what happens
/// when the content types or core properties parts are missing or damaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Skip damaged secondary parts and continue
    Lenient,
}
