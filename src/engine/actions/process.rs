//! Process listing

use crate::engine::action::{Action, ActionSpec, Invocation};
use crate::engine::registry::ActionRegistry;
use crate::error::{ActionError, RegistryError};

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(Processes)
}

crate::record! {
    pub struct ProcessArgs {
        /// Keep the first N processes
        pub top: Option<i32>,
        /// Keep the last N processes
        pub limit: Option<i32>,
    }
}

crate::record! {
    pub struct Process {
        pub pid: i32,
        pub user: String,
        /// Percent of one CPU
        pub cpu_usage: f32,
        /// Percent of physical memory
        pub memory_usage: f32,
        /// `[[dd-]hh:]mm:ss` as printed by ps
        pub elapsed_time: String,
        pub command: String,
    }
}

pub struct Processes;

impl Action for Processes {
    type Args = ProcessArgs;
    type Output = Vec<Process>;

    const SPEC: ActionSpec = ActionSpec {
        name: "processes",
        description: "Running processes with CPU and memory usage",
        command: "ps -eo pid=,user=,pcpu=,pmem=,etime=,comm=",
        pattern: Some(
            r"^\s*(?P<pid>\d+)\s+(?P<user>\S+)\s+(?P<cpuUsage>[\d.]+)\s+(?P<memoryUsage>[\d.]+)\s+(?P<elapsedTime>\S+)\s+(?P<command>.+)$",
        ),
        ..ActionSpec::EMPTY
    };

    fn build_command(&self, _invocation: &Invocation<'_>, args: &ProcessArgs) -> Result<String, ActionError> {
        let mut command = Self::SPEC.command.to_string();
        if let Some(top) = args.top.filter(|n| *n >= 0) {
            command.push_str(&format!(" | head -n {}", top));
        } else if let Some(limit) = args.limit.filter(|n| *n >= 0) {
            command.push_str(&format!(" | tail -n {}", limit));
        }
        Ok(command)
    }
}
