//! CLI argument parsing

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};

use crate::config::EngineConfig;
use crate::engine::convert::ListParsePolicy;
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "hostql")]
#[command(author, version, about = "Query facts from local and remote hosts", long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .args(["input", "query", "list_actions", "list_transformers"])
        .required(true)
))]
pub struct Args {
    /// Query file to run
    #[arg(short, long, value_name = "FILE", conflicts_with = "query")]
    pub input: Option<PathBuf>,

    /// Query text to run
    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, env = "HOSTQL_FORMAT")]
    pub output: OutputFormat,

    /// Write the result to a file instead of stdout
    #[arg(short = 'f', long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Maximum number of sessions queried at once
    #[arg(short, long, env = "HOSTQL_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Run sessions and fields one at a time
    #[arg(long)]
    pub sync: bool,

    /// Per-command timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip output lines a list pattern does not match instead of failing
    #[arg(long)]
    pub lenient_lists: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Shorthand for -vv
    #[arg(short, long)]
    pub debug: bool,

    /// Print the available actions and exit
    #[arg(long)]
    pub list_actions: bool,

    /// Print the available transformers and exit
    #[arg(long)]
    pub list_transformers: bool,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            max_parallelism: self
                .concurrency
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_parallelism),
            sync: self.sync,
            command_timeout: self.timeout.filter(|s| *s > 0).map(Duration::from_secs),
            list_policy: if self.lenient_lists {
                ListParsePolicy::Lenient
            } else {
                ListParsePolicy::Strict
            },
        }
    }

    /// Log filter directive for the chosen verbosity.
    pub fn log_level(&self) -> &'static str {
        let level = if self.debug { self.verbose.max(2) } else { self.verbose };
        match level {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
