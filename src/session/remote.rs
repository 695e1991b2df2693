//! SSH sessions over the system OpenSSH client
//!
//! Connecting starts a `ControlMaster` whose socket lives in a private temp
//! directory; every later `ssh`/`scp` invocation multiplexes over it.
//! Password authentication goes through `sshpass -e`, which reads the
//! password from `SSHPASS` in the child environment.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use directories::BaseDirs;
use tempfile::TempDir;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::keys::find_default_key;
use super::process::run_process;
use super::{current_user, CommandOutput, Platform, Session, SessionInfo};
use crate::engine::convert::{convert_arguments, FieldKind};
use crate::error::{ConvertError, SessionError};
use crate::parser::ast::Argument;

const DEFAULT_PORT: u16 = 22;
const CONNECT_TIMEOUT_SECS: u32 = 10;

crate::record! {
    /// Arguments of a `remote(...)` block
    pub struct RemoteArgs {
        pub host: Option<String>,
        pub port: Option<i32>,
        pub user: Option<String>,
        pub alias: Option<String>,
        pub password: Option<String>,
        pub keyfile: Option<String>,
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Password(String),
    KeyFile(PathBuf),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password(_) => f.write_str("Password(***)"),
            Credential::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
        }
    }
}

#[derive(Debug)]
pub struct RemoteSession {
    info: SessionInfo,
    credential: Credential,
    platform: Option<Platform>,
    control_dir: Option<TempDir>,
}

impl RemoteSession {
    pub fn new(info: SessionInfo, credential: Credential) -> Self {
        Self {
            info,
            credential,
            platform: None,
            control_dir: None,
        }
    }

    /// Build a session from the arguments of a `remote(...)` block.
    ///
    /// `host` is required. `port` defaults to 22, `user` to the current OS
    /// user and `alias` to the host. A `password` takes precedence over a
    /// `keyfile`; with neither, the default SSH key is used.
    pub fn from_arguments(arguments: &[Argument]) -> Result<Self, SessionError> {
        let args: RemoteArgs = convert_arguments(arguments)?;

        let host = args
            .host
            .filter(|host| !host.trim().is_empty())
            .ok_or(SessionError::MissingArgument("host"))?;

        let port = match args.port {
            Some(port) => u16::try_from(port).map_err(|_| {
                SessionError::InvalidArguments(ConvertError::InvalidValue {
                    field: "port".to_string(),
                    kind: FieldKind::I32,
                    value: port.to_string(),
                })
            })?,
            None => DEFAULT_PORT,
        };

        let credential = match (args.password, args.keyfile) {
            (Some(password), _) => Credential::Password(password),
            (None, Some(keyfile)) => Credential::KeyFile(expand_home(&keyfile)),
            (None, None) => {
                Credential::KeyFile(find_default_key().ok_or(SessionError::MissingCredential)?)
            }
        };

        let info = SessionInfo {
            alias: args.alias.unwrap_or_else(|| host.clone()),
            user: args.user.unwrap_or_else(current_user),
            host,
            port,
        };

        Ok(Self::new(info, credential))
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.info.user, self.info.host)
    }

    fn control_path(&self) -> Option<PathBuf> {
        self.control_dir.as_ref().map(|dir| dir.path().join("master.sock"))
    }

    /// `ssh` or `scp`, wrapped in `sshpass` for password auth.
    fn client(&self, program: &str) -> Command {
        match &self.credential {
            Credential::Password(password) => {
                let mut command = Command::new("sshpass");
                command.arg("-e").arg(program).env("SSHPASS", password);
                command
            }
            Credential::KeyFile(_) => Command::new(program),
        }
    }

    /// Options common to `ssh` and `scp`. `port_flag` differs between them.
    fn client_options(&self, port_flag: &str) -> Vec<OsString> {
        let mut options: Vec<OsString> = vec![
            port_flag.into(),
            self.info.port.to_string().into(),
            "-o".into(),
            "StrictHostKeyChecking=accept-new".into(),
            "-o".into(),
            format!("ConnectTimeout={}", CONNECT_TIMEOUT_SECS).into(),
        ];

        match &self.credential {
            Credential::KeyFile(key) => {
                options.push("-i".into());
                options.push(key.as_os_str().to_owned());
                options.push("-o".into());
                options.push("BatchMode=yes".into());
            }
            Credential::Password(_) => {
                options.push("-o".into());
                options.push("PubkeyAuthentication=no".into());
            }
        }

        if let Some(path) = self.control_path() {
            let mut control = OsString::from("ControlPath=");
            control.push(path.as_os_str());
            options.push("-o".into());
            options.push(control);
        }
        options
    }

    fn ensure_connected(&self) -> Result<(), SessionError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(SessionError::NotConnected(self.info.to_string()))
        }
    }

    async fn scp(
        &self,
        from: OsString,
        to: OsString,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        self.ensure_connected()?;
        let mut command = self.client("scp");
        command.args(self.client_options("-P")).arg("-q").arg(from).arg(to);

        let output = run_process(command, cancel).await?;
        if output.exit_code == 0 {
            Ok(())
        } else {
            Err(SessionError::IoError(std::io::Error::other(format!(
                "scp exited with code {}: {}",
                output.exit_code,
                output.stderr.trim()
            ))))
        }
    }

    /// Start the control master and read the remote platform from `uname`.
    async fn open_master(&self, cancel: &CancellationToken) -> Result<Platform, SessionError> {
        let connect_error = |reason: String| SessionError::Connect {
            target: self.info.to_string(),
            reason,
        };

        let mut command = self.client("ssh");
        command
            .args(self.client_options("-p"))
            .args(["-o", "ControlMaster=auto", "-o", "ControlPersist=yes"])
            .arg(self.destination())
            .arg("uname");

        let output = match run_process(command, cancel).await {
            Ok(output) => output,
            Err(SessionError::Cancelled) => return Err(SessionError::Cancelled),
            Err(err) => return Err(connect_error(err.to_string())),
        };

        if output.exit_code != 0 {
            let reason = match output.stderr.trim() {
                "" => format!("ssh exited with code {}", output.exit_code),
                stderr => stderr.to_string(),
            };
            return Err(connect_error(reason));
        }

        Platform::from_uname(&output.stdout)
            .ok_or_else(|| SessionError::UnsupportedPlatform(output.stdout.trim().to_string()))
    }

    /// Stop whatever master a failed connect left behind, then hand `err`
    /// back.
    async fn abandon(&mut self, err: SessionError) -> SessionError {
        if let Err(teardown) = self.disconnect().await {
            debug!(session = %self.info, error = %teardown, "teardown after failed connect");
        }
        err
    }

    fn remote_spec(&self, path: &str) -> OsString {
        format!("{}:{}", self.destination(), path).into()
    }
}

impl fmt::Display for RemoteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

#[async_trait]
impl Session for RemoteSession {
    fn info(&self) -> &SessionInfo {
        &self.info
    }

    fn platform(&self) -> Option<Platform> {
        self.platform
    }

    fn is_connected(&self) -> bool {
        self.platform.is_some()
    }

    async fn connect(&mut self, cancel: &CancellationToken) -> Result<(), SessionError> {
        self.control_dir = Some(
            tempfile::Builder::new()
                .prefix("hostql-ssh-")
                .tempdir()?,
        );

        match self.open_master(cancel).await {
            Ok(platform) => {
                info!(session = %self.info, %platform, "connected");
                self.platform = Some(platform);
                Ok(())
            }
            Err(err) => Err(self.abandon(err).await),
        }
    }

    async fn execute(
        &self,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, SessionError> {
        self.ensure_connected()?;
        let mut process = self.client("ssh");
        process
            .args(self.client_options("-p"))
            .arg(self.destination())
            .arg("--")
            .arg(command);
        run_process(process, cancel).await
    }

    async fn upload_file(
        &self,
        local: &Path,
        remote: &str,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        self.scp(local.as_os_str().to_owned(), self.remote_spec(remote), cancel)
            .await
    }

    async fn download_file(
        &self,
        remote: &str,
        local: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        self.scp(self.remote_spec(remote), local.as_os_str().to_owned(), cancel)
            .await
    }

    async fn is_tool_installed(
        &self,
        tool: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, SessionError> {
        let output = self
            .execute(&format!("command -v {} >/dev/null 2>&1", tool), cancel)
            .await?;
        Ok(output.exit_code == 0)
    }

    async fn disconnect(&mut self) -> Result<(), SessionError> {
        let Some(control_path) = self.control_path() else {
            return Ok(());
        };
        self.platform = None;

        let mut command = Command::new("ssh");
        command
            .arg("-O")
            .arg("exit")
            .arg("-o")
            .arg({
                let mut option = OsString::from("ControlPath=");
                option.push(control_path.as_os_str());
                option
            })
            .arg(self.destination());

        // a fresh token: teardown runs even when the query was cancelled
        let result = run_process(command, &CancellationToken::new()).await;
        self.control_dir = None;

        match result {
            Ok(output) if output.exit_code == 0 => {
                debug!(session = %self.info, "control master stopped");
                Ok(())
            }
            Ok(output) => {
                warn!(session = %self.info, stderr = %output.stderr.trim(), "ssh -O exit failed");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), BaseDirs::new()) {
        (Some(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => PathBuf::from(path),
    }
}
