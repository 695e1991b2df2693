//! Host identity and clock

use crate::engine::action::{Action, ActionSpec, Invocation};
use crate::engine::convert::{FieldKind, FieldValue, NoArgs};
use crate::engine::registry::ActionRegistry;
use crate::engine::value::Value;
use crate::error::{ActionError, ConvertError, RegistryError};
use crate::session::CommandOutput;

use super::token;

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(HostName)?;
    registry.register(Architecture)?;
    registry.register(SystemInfo)?;
    registry.register(CurrentTime)?;
    Ok(())
}

pub struct HostName;

impl Action for HostName {
    type Args = NoArgs;
    type Output = String;

    const SPEC: ActionSpec = ActionSpec {
        name: "hostName",
        description: "Network name of the machine",
        command: "hostname",
        pattern: Some("(.*)"),
        ..ActionSpec::EMPTY
    };
}

pub struct Architecture;

impl Action for Architecture {
    type Args = NoArgs;
    type Output = String;

    const SPEC: ActionSpec = ActionSpec {
        name: "architecture",
        description: "Machine hardware name",
        command: "uname -m",
        pattern: Some("(.*)"),
        ..ActionSpec::EMPTY
    };
}

crate::record! {
    pub struct Uname {
        pub kernel_name: String,
        pub host_name: String,
        pub kernel_release: String,
        pub kernel_version: String,
        pub architecture: String,
    }
}

/// One `uname` field per line, so no field has to be split out of `uname -a`.
pub struct SystemInfo;

impl Action for SystemInfo {
    type Args = NoArgs;
    type Output = Uname;

    const SPEC: ActionSpec = ActionSpec {
        name: "systemInfo",
        description: "Kernel and machine information from uname",
        command: "uname -s; uname -n; uname -r; uname -v; uname -m",
        pattern: Some(
            r"\A(?P<kernelName>.*)\n(?P<hostName>.*)\n(?P<kernelRelease>.*)\n(?P<kernelVersion>.*)\n(?P<architecture>.*)",
        ),
        ..ActionSpec::EMPTY
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Meridiem {
    #[default]
    Am,
    Pm,
}

impl FieldValue for Meridiem {
    const KIND: FieldKind = FieldKind::Enum;

    fn to_value(&self) -> Value {
        match self {
            Meridiem::Am => Value::from("AM"),
            Meridiem::Pm => Value::from("PM"),
        }
    }
}

crate::record! {
    pub struct Clock {
        /// `Mon`, `Tue`, ...
        pub day_of_week: String,
        /// `Jan`, `Feb`, ...
        pub month: String,
        pub day: i32,
        /// `HH:MM:SS`
        pub time: String,
        pub time_zone: String,
        pub year: i32,
        pub meridiem: Meridiem,
    }
}

pub struct CurrentTime;

impl Action for CurrentTime {
    type Args = NoArgs;
    type Output = Clock;

    const SPEC: ActionSpec = ActionSpec {
        name: "currentTime",
        description: "Current date and time as reported by date",
        command: "LC_ALL=C date",
        ..ActionSpec::EMPTY
    };

    fn parse_output(
        &self,
        _invocation: &Invocation<'_>,
        _args: &NoArgs,
        output: &CommandOutput,
    ) -> Result<Clock, ActionError> {
        Ok(parse_date(&output.stdout)?)
    }
}

/// Parse `Tue Mar  5 14:02:11 UTC 2024`, optionally with `AM`/`PM` after
/// the time.
fn parse_date(text: &str) -> Result<Clock, ConvertError> {
    let line = text.lines().next().unwrap_or_default();
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 6 {
        return Err(ConvertError::NoMatch);
    }

    let mut clock = Clock {
        day_of_week: parts[0].to_string(),
        month: parts[1].to_string(),
        day: token("day", parts[2])?,
        time: parts[3].to_string(),
        ..Default::default()
    };

    match parts[4] {
        "AM" | "PM" if parts.len() >= 7 => {
            clock.meridiem = if parts[4] == "AM" {
                Meridiem::Am
            } else {
                Meridiem::Pm
            };
            clock.time_zone = parts[5].to_string();
            clock.year = token("year", parts[6])?;
        }
        _ => {
            let hour: i32 = token("time", clock.time.split(':').next().unwrap_or_default())?;
            clock.meridiem = if hour >= 12 { Meridiem::Pm } else { Meridiem::Am };
            clock.time_zone = parts[4].to_string();
            clock.year = token("year", parts[5])?;
        }
    }
    Ok(clock)
}
