//! hostql CLI - query facts from local and remote hosts

use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use hostql::cli::Args;
use hostql::{format_output, parse_query, Engine, HostqlError};

/// Exit status after an interrupt, as shells report SIGINT.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if matches!(e.downcast_ref::<HostqlError>(), Some(HostqlError::Cancelled)) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let engine = Engine::with_defaults(args.engine_config())?;

    if args.list_actions {
        for descriptor in engine.registry().descriptors() {
            println!("{}", descriptor);
        }
        return Ok(());
    }
    if args.list_transformers {
        for entry in engine.transformers().entries() {
            println!("{}", entry);
        }
        return Ok(());
    }

    let text = match (&args.query, &args.input) {
        (Some(query), _) => query.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read query file {}", path.display()))?,
        (None, None) => anyhow::bail!("either --input or --query is required"),
    };
    let query = parse_query(&text)?;

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    ctrlc::set_handler(move || token.cancel()).context("failed to set Ctrl+C handler")?;

    let document = engine.execute(&query, cancel).await?;
    let mut rendered = format_output(&document, args.output)?;
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    match &args.output_file {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", rendered),
    }
    Ok(())
}
