//! Scripted session for engine tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use hostql::error::SessionError;
use hostql::parser::{parse_query, Field};
use hostql::session::{CommandOutput, Platform, Session, SessionInfo};

/// Commands run across sessions, as `alias: command`.
pub type CommandLog = Arc<Mutex<Vec<String>>>;

pub struct MockSession {
    info: SessionInfo,
    connected: bool,
    fail_connect: bool,
    responses: HashMap<String, CommandOutput>,
    delays: HashMap<String, Duration>,
    tools: Vec<String>,
    log: CommandLog,
    teardowns: Option<CommandLog>,
}

impl MockSession {
    pub fn new(alias: &str) -> Self {
        Self {
            info: SessionInfo {
                alias: alias.to_string(),
                host: alias.to_string(),
                user: "tester".to_string(),
                port: 22,
            },
            connected: false,
            fail_connect: false,
            responses: HashMap::new(),
            delays: HashMap::new(),
            tools: Vec::new(),
            log: CommandLog::default(),
            teardowns: None,
        }
    }

    pub fn respond(mut self, command: &str, stdout: &str) -> Self {
        self.responses
            .insert(command.to_string(), CommandOutput::success(stdout));
        self
    }

    pub fn respond_with(mut self, command: &str, output: CommandOutput) -> Self {
        self.responses.insert(command.to_string(), output);
        self
    }

    pub fn delay(mut self, command: &str, delay: Duration) -> Self {
        self.delays.insert(command.to_string(), delay);
        self
    }

    pub fn with_tool(mut self, tool: &str) -> Self {
        self.tools.push(tool.to_string());
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn logging_to(mut self, log: &CommandLog) -> Self {
        self.log = Arc::clone(log);
        self
    }

    /// Record `alias: disconnect` in `log` whenever the session is torn down.
    pub fn tracking_disconnects(mut self, log: &CommandLog) -> Self {
        self.teardowns = Some(Arc::clone(log));
        self
    }

    pub fn boxed(self) -> Box<dyn Session> {
        Box::new(self)
    }
}

#[async_trait]
impl Session for MockSession {
    fn info(&self) -> &SessionInfo {
        &self.info
    }

    fn platform(&self) -> Option<Platform> {
        self.connected.then_some(Platform::Linux)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self, _cancel: &CancellationToken) -> Result<(), SessionError> {
        if self.fail_connect {
            return Err(SessionError::Connect {
                target: self.info.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        self.connected = true;
        Ok(())
    }

    async fn execute(
        &self,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, SessionError> {
        if let Some(delay) = self.delays.get(command) {
            tokio::select! {
                _ = tokio::time::sleep(*delay) => {}
                _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            }
        }
        self.log
            .lock()
            .unwrap()
            .push(format!("{}: {}", self.info.alias, command));
        Ok(self
            .responses
            .get(command)
            .cloned()
            .unwrap_or_else(|| CommandOutput::failure(format!("mock: {}: not found", command), 127)))
    }

    async fn upload_file(
        &self,
        _local: &Path,
        _remote: &str,
        _cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    async fn download_file(
        &self,
        _remote: &str,
        _local: &Path,
        _cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    async fn is_tool_installed(
        &self,
        tool: &str,
        _cancel: &CancellationToken,
    ) -> Result<bool, SessionError> {
        Ok(self.tools.iter().any(|t| t == tool))
    }

    async fn disconnect(&mut self) -> Result<(), SessionError> {
        if let Some(log) = &self.teardowns {
            log.lock()
                .unwrap()
                .push(format!("{}: disconnect", self.info.alias));
        }
        self.connected = false;
        Ok(())
    }
}

/// The top-level fields of a `local { ... }` selection.
pub fn fields(selection: &str) -> Vec<Field> {
    let query = parse_query(&format!("get {{ local {{ {} }} }}", selection)).unwrap();
    query.contexts.into_iter().next().unwrap().selection
}
