//! Child process plumbing shared by the session implementations

use std::process::Stdio;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::CommandOutput;
use crate::error::SessionError;

/// Spawn `command` and collect its output. Cancellation kills the child.
pub(crate) async fn run_process(
    mut command: Command,
    cancel: &CancellationToken,
) -> Result<CommandOutput, SessionError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command.spawn()?;

    tokio::select! {
        output = child.wait_with_output() => {
            let output = output?;
            Ok(CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code().unwrap_or(-1),
            })
        }
        _ = cancel.cancelled() => Err(SessionError::Cancelled),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn shell(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[tokio::test]
    async fn test_collects_output_and_exit_code() {
        let cancel = CancellationToken::new();
        let output = run_process(shell("echo out; echo err >&2; exit 3"), &cancel)
            .await
            .unwrap();
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.exit_code, 3);
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_wait() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = run_process(shell("sleep 10"), &cancel).await;
        assert!(matches!(result, Err(SessionError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
