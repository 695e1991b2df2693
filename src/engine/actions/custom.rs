//! Arbitrary shell commands

use crate::engine::action::{Action, ActionSpec, Invocation};
use crate::engine::registry::ActionRegistry;
use crate::error::{ActionError, ActionErrorKind, RegistryError};
use crate::session::CommandOutput;

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(RunCustom)
}

crate::record! {
    pub struct RunCustomArgs {
        pub cmd: Option<String>,
    }
}

crate::record! {
    pub struct CustomOutput {
        pub output: String,
        pub exit_code: i32,
    }
}

/// Runs `cmd` verbatim and returns its stdout.
pub struct RunCustom;

impl Action for RunCustom {
    type Args = RunCustomArgs;
    type Output = CustomOutput;

    const SPEC: ActionSpec = ActionSpec {
        name: "runCustom",
        description: "Run a shell command and return its output",
        command: "{cmd}",
        ..ActionSpec::EMPTY
    };

    fn build_command(&self, _invocation: &Invocation<'_>, args: &RunCustomArgs) -> Result<String, ActionError> {
        match args.cmd.as_deref().map(str::trim) {
            Some(cmd) if !cmd.is_empty() => Ok(cmd.to_string()),
            _ => Err(ActionError::new(
                ActionErrorKind::ArgumentConversion,
                "Missing required argument 'cmd'",
            )),
        }
    }

    fn parse_output(
        &self,
        _invocation: &Invocation<'_>,
        _args: &RunCustomArgs,
        output: &CommandOutput,
    ) -> Result<CustomOutput, ActionError> {
        Ok(CustomOutput {
            output: output.stdout.trim_end().to_string(),
            exit_code: output.exit_code,
        })
    }
}
