//! Rendering module for writing documents back out.

mod docx;
mod json;
mod text;

pub use docx::{to_docx, write_docx};
pub use json::{to_json, JsonFormat};
pub use text::to_text;
