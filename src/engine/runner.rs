//! Action runner
//!
//! Drives one query field through its lifecycle on one session:
//! resolve → check dependencies → build command → execute → check exit code
//! → parse → project. Any stage failure is returned as an `{error, exitCode}`
//! node in place of the field's value. Only cancellation escapes.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::action::ActionDescriptor;
use crate::engine::projection::FieldSelection;
use crate::engine::registry::ActionRegistry;
use crate::engine::value::Value;
use crate::error::{ActionError, HostqlError, Result, SessionError};
use crate::parser::ast::Field;
use crate::session::{CommandOutput, Session};

/// Why a field did not produce a value.
enum Failure {
    Action(ActionError),
    Cancelled,
}

impl From<ActionError> for Failure {
    fn from(err: ActionError) -> Self {
        Failure::Action(err)
    }
}

impl From<SessionError> for Failure {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Cancelled => Failure::Cancelled,
            other => Failure::Action(other.into()),
        }
    }
}

pub struct ActionRunner<'a> {
    pub session: &'a dyn Session,
    pub registry: &'a ActionRegistry,
    pub config: &'a EngineConfig,
    pub cancel: &'a CancellationToken,
}

impl ActionRunner<'_> {
    /// Run `field` as an action of `namespace` (empty for global) and shape
    /// its result with `selection`, resolved from the same field.
    ///
    /// Returns the projected value or an error node; `Err` only on
    /// cancellation.
    pub async fn run(
        &self,
        field: &Field,
        selection: &FieldSelection,
        namespace: &str,
    ) -> Result<Value> {
        let outcome = AssertUnwindSafe(self.try_run(field, selection, namespace))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(Failure::Action(err))) => {
                debug!(
                    session = %self.session.info(),
                    field = %field.name,
                    kind = ?err.kind,
                    error = %err,
                    "action failed"
                );
                Ok(err.to_node())
            }
            Ok(Err(Failure::Cancelled)) => Err(HostqlError::Cancelled),
            Err(_) => {
                warn!(session = %self.session.info(), field = %field.name, "action panicked");
                Ok(ActionError::unexpected("An unexpected error occurred").to_node())
            }
        }
    }

    async fn try_run(
        &self,
        field: &Field,
        selection: &FieldSelection,
        namespace: &str,
    ) -> std::result::Result<Value, Failure> {
        let entry = self.registry.resolve(&field.name, namespace)?;
        if let Some(err) = selection.binding_error() {
            return Err(err.clone().into());
        }

        let platform = self
            .session
            .platform()
            .ok_or_else(|| SessionError::NotConnected(self.session.info().to_string()))?;
        let invocation = entry.initialize(platform, self.config.list_policy);

        self.check_dependencies(entry.descriptor()).await?;

        let prepared = entry.prepare(invocation, &field.arguments)?;
        debug!(
            session = %self.session.info(),
            action = %entry.descriptor().qualified_name(),
            command = prepared.command(),
            "executing"
        );

        let output = self.execute(prepared.command()).await?;
        validate_exit_code(&output)?;

        let parsed = prepared.parse(&output)?;
        Ok(selection.project(&parsed))
    }

    async fn check_dependencies(
        &self,
        descriptor: &ActionDescriptor,
    ) -> std::result::Result<(), Failure> {
        for tool in descriptor.dependencies() {
            if !self.session.is_tool_installed(tool, self.cancel).await? {
                return Err(ActionError::dependency_missing(tool).into());
            }
        }
        Ok(())
    }

    async fn execute(&self, command: &str) -> std::result::Result<CommandOutput, Failure> {
        let run = self.session.execute(command, self.cancel);
        let result = match self.config.command_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    warn!(session = %self.session.info(), command, ?limit, "command timed out");
                    Err(SessionError::Timeout(limit))
                }
            },
            None => run.await,
        };
        Ok(result?)
    }
}

/// A non-zero exit code fails the action with stderr (or stdout) as message.
fn validate_exit_code(output: &CommandOutput) -> std::result::Result<(), ActionError> {
    if output.exit_code == 0 {
        return Ok(());
    }

    let message = [&output.stderr, &output.stdout]
        .into_iter()
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Command exited with code {}", output.exit_code));

    Err(ActionError::execution_failed(&message, output.exit_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_message_prefers_stderr() {
        let output = CommandOutput {
            stdout: "partial".to_string(),
            stderr: "df: /nope:\nNo such file or directory\n".to_string(),
            exit_code: 1,
        };
        let err = validate_exit_code(&output).unwrap_err();
        assert_eq!(err.message, "df: /nope: No such file or directory");
        assert_eq!(err.exit_code, 1);
    }

    #[test]
    fn test_exit_code_message_fallbacks() {
        let err = validate_exit_code(&CommandOutput {
            stdout: "usage: thing\n".to_string(),
            stderr: "  ".to_string(),
            exit_code: 64,
        })
        .unwrap_err();
        assert_eq!(err.message, "usage: thing");

        let err = validate_exit_code(&CommandOutput::failure("", 137)).unwrap_err();
        assert_eq!(err.message, "Command exited with code 137");
        assert_eq!(err.exit_code, 137);
    }

    #[test]
    fn test_zero_exit_code_passes() {
        assert!(validate_exit_code(&CommandOutput::success("ok")).is_ok());
    }
}
