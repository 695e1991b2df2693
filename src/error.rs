//! Error types for hostql
//!
//! Errors are layered the way they are contained at runtime: [`HostqlError`]
//! ends a whole run, [`SessionError`] ends one session, and [`ActionError`]
//! only ever replaces a single field with an `{error, exitCode}` node.

use std::time::Duration;

use thiserror::Error;

use crate::engine::convert::FieldKind;
use crate::engine::value::Value;

#[derive(Error, Debug)]
pub enum HostqlError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Registry error: {0}")]
    RegistryError(#[from] RegistryError),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Query cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, HostqlError>;

/// Failures raised while building the action or transformer registries.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("action '{name}' is already registered in namespace '{namespace}'")]
    DuplicateAction { namespace: String, name: String },

    #[error("transformer '{0}' is already registered")]
    DuplicateTransformer(String),

    #[error("invalid result pattern for action '{action}': {source}")]
    InvalidPattern {
        action: String,
        #[source]
        source: regex::Error,
    },

    #[error("action '{action}': {source}")]
    UnsupportedResultType {
        action: String,
        #[source]
        source: ConvertError,
    },
}

/// Failures of the typed argument/result conversion layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("argument '{argument}' is a {found} value, which cannot populate a {expected} property")]
    UnsupportedArgumentType {
        argument: String,
        found: &'static str,
        expected: FieldKind,
    },

    #[error("field '{field}' has type {kind}, which cannot be read from command output")]
    UnsupportedResultType { field: String, kind: FieldKind },

    #[error("The command results did not match the regex")]
    NoMatch,

    #[error("output line did not match the result pattern: {line}")]
    LineMismatch { line: String },

    #[error("invalid {kind} value '{value}' for field '{field}'")]
    InvalidValue {
        field: String,
        kind: FieldKind,
        value: String,
    },
}

/// Transport failures. Any of these skips the session they occur on.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to connect to {target}: {reason}")]
    Connect { target: String, reason: String },

    #[error("Missing keyfile argument or password argument")]
    MissingCredential,

    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),

    #[error("invalid connection arguments: {0}")]
    InvalidArguments(#[from] ConvertError),

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("session {0} is not connected")]
    NotConnected(String),

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Where in the action lifecycle a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionErrorKind {
    QueryResolution,
    ArgumentConversion,
    CommandExecution,
    ResultParse,
    DependencyMissing,
    Transformer,
    Unexpected,
}

/// A failure contained to one action or one field.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ActionError {
    pub kind: ActionErrorKind,
    pub message: String,
    pub exit_code: i32,
}

impl ActionError {
    pub fn new(kind: ActionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            exit_code: 1,
        }
    }

    pub fn action_not_found(name: &str, namespace: &str) -> Self {
        let message = if namespace.is_empty() {
            format!("Action '{}' was not found", name)
        } else {
            format!("Action '{}' was not found in namespace '{}'", name, namespace)
        };
        Self::new(ActionErrorKind::QueryResolution, message)
    }

    pub fn transformer_not_found(name: &str) -> Self {
        Self::new(
            ActionErrorKind::QueryResolution,
            format!("Transformer '{}' was not found", name),
        )
    }

    pub fn dependency_missing(tool: &str) -> Self {
        Self::new(
            ActionErrorKind::DependencyMissing,
            format!("The tool {} is not installed on the client.", tool),
        )
    }

    /// Non-zero exit status. Line breaks are stripped so the message stays
    /// on one line in the result document.
    pub fn execution_failed(message: &str, exit_code: i32) -> Self {
        let message: String = message
            .split(['\r', '\n'])
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            kind: ActionErrorKind::CommandExecution,
            message,
            exit_code,
        }
    }

    pub fn transformer(message: impl Into<String>) -> Self {
        Self::new(ActionErrorKind::Transformer, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ActionErrorKind::Unexpected, message)
    }

    /// The `{error, exitCode}` node that stands in for the failed value.
    pub fn to_node(&self) -> Value {
        Value::error(self.message.clone(), self.exit_code)
    }
}

impl From<ConvertError> for ActionError {
    fn from(err: ConvertError) -> Self {
        let kind = match err {
            ConvertError::UnsupportedArgumentType { .. } => ActionErrorKind::ArgumentConversion,
            _ => ActionErrorKind::ResultParse,
        };
        ActionError::new(kind, err.to_string())
    }
}

impl From<SessionError> for ActionError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Timeout(_) => ActionError {
                kind: ActionErrorKind::CommandExecution,
                message: err.to_string(),
                exit_code: 124,
            },
            other => ActionError::new(ActionErrorKind::CommandExecution, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_failed_strips_line_breaks() {
        let err = ActionError::execution_failed("ls: cannot access\r\n'/nope': No such file\n", 2);
        assert_eq!(err.message, "ls: cannot access '/nope': No such file");
        assert_eq!(err.exit_code, 2);
        assert_eq!(err.kind, ActionErrorKind::CommandExecution);
    }

    #[test]
    fn test_dependency_message() {
        let err = ActionError::dependency_missing("docker");
        assert_eq!(err.message, "The tool docker is not installed on the client.");
        assert_eq!(err.exit_code, 1);
    }

    #[test]
    fn test_convert_error_kinds() {
        let err: ActionError = ConvertError::NoMatch.into();
        assert_eq!(err.kind, ActionErrorKind::ResultParse);

        let err: ActionError = ConvertError::UnsupportedArgumentType {
            argument: "path".to_string(),
            found: "integer",
            expected: FieldKind::String,
        }
        .into();
        assert_eq!(err.kind, ActionErrorKind::ArgumentConversion);
    }

    #[test]
    fn test_timeout_maps_to_exit_code_124() {
        let err: ActionError = SessionError::Timeout(Duration::from_secs(5)).into();
        assert_eq!(err.exit_code, 124);
    }
}
