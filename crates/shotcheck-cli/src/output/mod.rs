//! Output formatting for CLI.

mod json;
mod text;

pub use json::JsonOutput;
pub use text::TextOutput;
