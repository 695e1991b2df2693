//! Output formatting

use std::fmt;

use clap::ValueEnum;

use crate::engine::value::Document;
use crate::error::Result;
use crate::output::json::format_json;
use crate::output::table::format_table;
use crate::output::yaml::format_yaml;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

pub fn format_output(document: &Document, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => format_json(document),
        OutputFormat::Yaml => format_yaml(document),
        OutputFormat::Table => Ok(format_table(document)),
    }
}
