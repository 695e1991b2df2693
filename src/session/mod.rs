//! Execution targets
//!
//! A [`Session`] runs shell commands on one machine. [`LocalSession`] spawns
//! them directly; [`RemoteSession`] goes through the system `ssh` client.

mod keys;
mod local;
mod process;
mod remote;

pub use keys::{find_default_key, find_default_key_in};
pub use local::LocalSession;
pub use remote::{Credential, RemoteArgs, RemoteSession};

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;

/// Operating systems actions know how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
}

impl Platform {
    /// Interpret the output of `uname`.
    pub fn from_uname(output: &str) -> Option<Self> {
        let kernel = output.trim();
        if kernel.starts_with("Linux") {
            Some(Platform::Linux)
        } else if kernel.starts_with("Darwin") {
            Some(Platform::MacOs)
        } else {
            None
        }
    }

    /// The platform this binary is running on.
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "linux" => Some(Platform::Linux),
            "macos" => Some(Platform::MacOs),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "Linux"),
            Platform::MacOs => write!(f, "macOS"),
        }
    }
}

/// Captured result of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failure(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }
}

/// Who and where a session talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Key of this session's entry in the result document
    pub alias: String,
    pub host: String,
    pub user: String,
    pub port: u16,
}

impl fmt::Display for SessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alias != self.host {
            write!(f, "({}) ", self.alias)?;
        }
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

#[async_trait]
pub trait Session: Send + Sync {
    fn info(&self) -> &SessionInfo;

    fn alias(&self) -> &str {
        &self.info().alias
    }

    /// Resolved at connect time; `None` before that.
    fn platform(&self) -> Option<Platform>;

    fn is_connected(&self) -> bool;

    async fn connect(&mut self, cancel: &CancellationToken) -> Result<(), SessionError>;

    async fn execute(
        &self,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, SessionError>;

    async fn upload_file(
        &self,
        local: &Path,
        remote: &str,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError>;

    async fn download_file(
        &self,
        remote: &str,
        local: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError>;

    async fn is_tool_installed(
        &self,
        tool: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, SessionError>;

    async fn disconnect(&mut self) -> Result<(), SessionError>;
}

/// The OS user running this process.
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "root".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_uname() {
        assert_eq!(Platform::from_uname("Linux\n"), Some(Platform::Linux));
        assert_eq!(Platform::from_uname("Darwin"), Some(Platform::MacOs));
        assert_eq!(Platform::from_uname("FreeBSD"), None);
    }

    #[test]
    fn test_session_info_display() {
        let mut info = SessionInfo {
            alias: "db".to_string(),
            host: "10.0.0.5".to_string(),
            user: "ops".to_string(),
            port: 2222,
        };
        assert_eq!(info.to_string(), "(db) ops@10.0.0.5:2222");

        info.alias = info.host.clone();
        assert_eq!(info.to_string(), "ops@10.0.0.5:2222");
    }
}
