//! hostql - a declarative query language for host facts
//!
//! A query names the hosts to visit and the facts to collect from each:
//!
//! ```text
//! get {
//!     local { hostName diskSpace { mountPoint used @toHumanSize } }
//!     remote(host: "db01", user: "ops") { whoAmI docker { containers(all: true) } }
//! }
//! ```
//!
//! Each fact is a registered action: a shell command template plus a typed
//! parser for its output. Hosts are queried concurrently and the results are
//! merged into one ordered document keyed by session alias.
//!
//! # Example
//!
//! ```no_run
//! use hostql::{format_output, parse_query, Engine, EngineConfig, OutputFormat};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> hostql::Result<()> {
//! let query = parse_query("get { local { hostName } }")?;
//! let engine = Engine::with_defaults(EngineConfig::default())?;
//! let document = engine.execute(&query, CancellationToken::new()).await?;
//! println!("{}", format_output(&document, OutputFormat::Json)?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod parser;
pub mod session;

pub use config::EngineConfig;
pub use engine::{ActionRegistry, Document, Engine, SessionTarget, TransformerRegistry, Value};
pub use error::{ActionError, HostqlError, Result};
pub use output::{format_output, OutputFormat};
pub use parser::{parse_query, Query};
pub use session::{LocalSession, RemoteSession, Session};
