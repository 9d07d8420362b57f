//! Word package parsing module.

mod docx_parser;
mod options;

pub use docx_parser::DocxParser;
pub use options::{ErrorMode, ParseOptions, DEFAULT_MAX_PART_SIZE};
