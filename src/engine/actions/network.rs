//! Default network interface

use crate::engine::action::{Action, ActionSpec, Invocation};
use crate::engine::convert::NoArgs;
use crate::engine::registry::ActionRegistry;
use crate::error::{ActionError, RegistryError};
use crate::session::{CommandOutput, Platform};

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(ActiveInterface)?;
    registry.register(MacAddress)?;
    Ok(())
}

fn first_line(output: &CommandOutput) -> Result<String, ActionError> {
    match output.stdout.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(line) => Ok(line.to_string()),
        None => Err(ActionError::from(crate::error::ConvertError::NoMatch)),
    }
}

/// Name of the interface carrying the default route.
pub struct ActiveInterface;

impl Action for ActiveInterface {
    type Args = NoArgs;
    type Output = String;

    const SPEC: ActionSpec = ActionSpec {
        name: "activeInterface",
        description: "Interface used by the default route",
        command: "ip route show default | awk '/default/ {print $5}'",
        ..ActionSpec::EMPTY
    };

    fn build_command(&self, invocation: &Invocation<'_>, _args: &NoArgs) -> Result<String, ActionError> {
        Ok(match invocation.platform {
            Platform::Linux => Self::SPEC.command.to_string(),
            Platform::MacOs => "route -n get default | awk '/interface:/{print $2}'".to_string(),
        })
    }

    fn parse_output(
        &self,
        _invocation: &Invocation<'_>,
        _args: &NoArgs,
        output: &CommandOutput,
    ) -> Result<String, ActionError> {
        first_line(output)
    }
}

/// Hardware address of the default route's interface.
pub struct MacAddress;

impl Action for MacAddress {
    type Args = NoArgs;
    type Output = String;

    const SPEC: ActionSpec = ActionSpec {
        name: "macAddress",
        description: "MAC address of the active interface",
        command: "cat /sys/class/net/$(ip route show default | awk '/default/ {print $5}')/address",
        ..ActionSpec::EMPTY
    };

    fn build_command(&self, invocation: &Invocation<'_>, _args: &NoArgs) -> Result<String, ActionError> {
        Ok(match invocation.platform {
            Platform::Linux => Self::SPEC.command.to_string(),
            Platform::MacOs => {
                "ifconfig $(route -n get default | awk '/interface:/{print $2}') | awk '/ether/{print $2}'"
                    .to_string()
            }
        })
    }

    fn parse_output(
        &self,
        _invocation: &Invocation<'_>,
        _args: &NoArgs,
        output: &CommandOutput,
    ) -> Result<String, ActionError> {
        first_line(output)
    }
}
