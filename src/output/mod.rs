//! Output formatting module

pub mod formatter;
pub mod json;
pub mod table;
pub mod yaml;

pub use formatter::{format_output, OutputFormat};
