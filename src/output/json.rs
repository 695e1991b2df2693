//! JSON output formatting

use crate::engine::value::Document;
use crate::error::{HostqlError, Result};

pub fn format_json(document: &Document) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(|e| HostqlError::OutputError(e.to_string()))
}
