//! System log entries
//!
//! Linux reads the journal newest first; journalctl does the filtering. macOS
//! has no journal, so `/var/log/system.log` is read and filtered here.

use chrono::{Datelike, Local, NaiveDateTime};

use crate::engine::action::{Action, ActionSpec, Invocation};
use crate::engine::convert::parse_datetime;
use crate::engine::registry::ActionRegistry;
use crate::error::{ActionError, RegistryError};
use crate::session::{CommandOutput, Platform};

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(Logs)
}

crate::record! {
    pub struct LogsArgs {
        /// Most recent entries to return
        pub top: Option<i32>,
        pub start_date: Option<NaiveDateTime>,
        pub end_date: Option<NaiveDateTime>,
        /// systemd unit to filter on (Linux only)
        pub unit: Option<String>,
    }
}

crate::record! {
    pub struct LogEntry {
        /// `Mar 05 14:02:11`
        pub timestamp: String,
        pub machine_name: String,
        pub service: String,
        /// Message including the service prefix
        pub message: String,
    }
}

pub struct Logs;

impl Action for Logs {
    type Args = LogsArgs;
    type Output = Vec<LogEntry>;

    const SPEC: ActionSpec = ActionSpec {
        name: "logs",
        description: "Recent entries from the system log",
        command: "journalctl --reverse --no-pager",
        ..ActionSpec::EMPTY
    };

    fn build_command(&self, invocation: &Invocation<'_>, args: &LogsArgs) -> Result<String, ActionError> {
        if invocation.platform == Platform::MacOs {
            return Ok("cat /var/log/system.log".to_string());
        }

        let mut command = Self::SPEC.command.to_string();
        if let Some(start) = args.start_date {
            command.push_str(&format!(" --since \"{}\"", start.format("%Y-%m-%d")));
        }
        if let Some(end) = args.end_date {
            command.push_str(&format!(" --until \"{}\"", end.format("%Y-%m-%d")));
        }
        if let Some(top) = args.top.filter(|n| *n > 0) {
            command.push_str(&format!(" --lines {}", top));
        }
        if let Some(unit) = args.unit.as_deref().filter(|u| !u.is_empty()) {
            command.push_str(&format!(" --unit {}", unit));
        }
        Ok(command)
    }

    fn parse_output(
        &self,
        invocation: &Invocation<'_>,
        args: &LogsArgs,
        output: &CommandOutput,
    ) -> Result<Vec<LogEntry>, ActionError> {
        Ok(match invocation.platform {
            Platform::Linux => parse_journal(&output.stdout),
            Platform::MacOs => parse_system_log(&output.stdout, args, Local::now().naive_local()),
        })
    }
}

/// Split a syslog-style line: three timestamp tokens, host, then message.
fn parse_line(line: &str) -> Option<LogEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }
    Some(LogEntry {
        timestamp: parts[..3].join(" "),
        machine_name: parts[3].to_string(),
        service: parts[4].trim_end_matches(':').to_string(),
        message: parts[4..].join(" "),
    })
}

fn parse_journal(text: &str) -> Vec<LogEntry> {
    text.lines()
        .filter(|line| !line.starts_with("--"))
        .filter_map(parse_line)
        .collect()
}

/// Newest first, limited to the requested window and count.
fn parse_system_log(text: &str, args: &LogsArgs, now: NaiveDateTime) -> Vec<LogEntry> {
    let top = args
        .top
        .filter(|n| *n > 0)
        .map_or(usize::MAX, |n| n as usize);

    text.lines()
        .rev()
        .filter_map(|line| {
            let entry = parse_line(line)?;
            // syslog omits the year; a date ahead of now is from last year
            let mut stamp = parse_datetime(&entry.timestamp)?.with_year(now.year())?;
            if stamp > now {
                stamp = stamp.with_year(stamp.year() - 1)?;
            }
            let after_start = args.start_date.map_or(true, |start| stamp >= start);
            let before_end = args.end_date.map_or(true, |end| stamp <= end);
            (after_start && before_end).then_some(entry)
        })
        .take(top)
        .collect()
}
