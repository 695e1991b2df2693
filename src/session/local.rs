//! The machine hostql runs on

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use directories::BaseDirs;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::process::run_process;
use super::{current_user, CommandOutput, Platform, Session, SessionInfo};
use crate::error::SessionError;

pub const LOCAL_ALIAS: &str = "localhost";

#[derive(Debug)]
pub struct LocalSession {
    info: SessionInfo,
    platform: Option<Platform>,
}

impl LocalSession {
    pub fn new() -> Self {
        Self {
            info: SessionInfo {
                alias: LOCAL_ALIAS.to_string(),
                host: LOCAL_ALIAS.to_string(),
                user: current_user(),
                port: 22,
            },
            platform: None,
        }
    }

    fn ensure_connected(&self) -> Result<(), SessionError> {
        if self.platform.is_some() {
            Ok(())
        } else {
            Err(SessionError::NotConnected(self.info.to_string()))
        }
    }
}

impl Default for LocalSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

#[async_trait]
impl Session for LocalSession {
    fn info(&self) -> &SessionInfo {
        &self.info
    }

    fn platform(&self) -> Option<Platform> {
        self.platform
    }

    fn is_connected(&self) -> bool {
        self.platform.is_some()
    }

    async fn connect(&mut self, _cancel: &CancellationToken) -> Result<(), SessionError> {
        let platform = Platform::current()
            .ok_or_else(|| SessionError::UnsupportedPlatform(std::env::consts::OS.to_string()))?;
        self.platform = Some(platform);
        Ok(())
    }

    async fn execute(
        &self,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, SessionError> {
        self.ensure_connected()?;
        let mut process = Command::new("sh");
        process.arg("-c").arg(command);
        run_process(process, cancel).await
    }

    async fn upload_file(
        &self,
        local: &Path,
        remote: &str,
        _cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        self.ensure_connected()?;
        tokio::fs::copy(local, expand_home(remote)).await?;
        Ok(())
    }

    async fn download_file(
        &self,
        remote: &str,
        local: &Path,
        _cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        self.ensure_connected()?;
        tokio::fs::copy(expand_home(remote), local).await?;
        Ok(())
    }

    async fn is_tool_installed(
        &self,
        tool: &str,
        _cancel: &CancellationToken,
    ) -> Result<bool, SessionError> {
        Ok(which::which(tool).is_ok())
    }

    async fn disconnect(&mut self) -> Result<(), SessionError> {
        self.platform = None;
        Ok(())
    }
}

/// Expand a leading `~` the way a shell would.
fn expand_home(path: &str) -> PathBuf {
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_requires_connect() {
        let session = LocalSession::new();
        let cancel = CancellationToken::new();
        assert!(matches!(
            session.execute("true", &cancel).await,
            Err(SessionError::NotConnected(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_through_shell() {
        let mut session = LocalSession::new();
        let cancel = CancellationToken::new();
        session.connect(&cancel).await.unwrap();
        assert!(session.is_connected());

        let output = session.execute("printf '%s' a b | wc -c", &cancel).await.unwrap();
        assert_eq!(output.stdout.trim(), "2");
        assert_eq!(output.exit_code, 0);

        session.disconnect().await.unwrap();
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_tool_probe() {
        let session = LocalSession::new();
        let cancel = CancellationToken::new();
        assert!(session.is_tool_installed("sh", &cancel).await.unwrap());
        assert!(!session
            .is_tool_installed("definitely-not-a-real-tool-hostql", &cancel)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_file_transfer_is_a_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.txt");
        let target = dir.path().join("out.txt");
        std::fs::write(&source, "payload").unwrap();

        let mut session = LocalSession::new();
        let cancel = CancellationToken::new();
        session.connect(&cancel).await.unwrap();
        session
            .upload_file(&source, target.to_str().unwrap(), &cancel)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "payload");
    }
}
