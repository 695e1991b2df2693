//! YAML output formatting

use crate::engine::value::Document;
use crate::error::{HostqlError, Result};

pub fn format_yaml(document: &Document) -> Result<String> {
    serde_yaml::to_string(document).map_err(|e| HostqlError::OutputError(e.to_string()))
}
