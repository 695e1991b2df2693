//! Disk usage

use crate::engine::action::{Action, ActionSpec, Invocation};
use crate::engine::convert::{parse_records, ListParsePolicy};
use crate::engine::registry::ActionRegistry;
use crate::error::{ActionError, ConvertError, RegistryError};
use crate::session::CommandOutput;

use super::{token, unreadable_line};

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(DiskSpace)?;
    registry.register(FileSpace)?;
    Ok(())
}

crate::record! {
    /// One mounted filesystem. Sizes are in bytes.
    pub struct Disk {
        pub file_system: String,
        pub mount_point: String,
        pub total: u64,
        pub used: u64,
        pub available: u64,
        pub used_percentage: f32,
        pub available_percentage: f32,
    }
}

pub struct DiskSpace;

impl Action for DiskSpace {
    type Args = crate::engine::convert::NoArgs;
    type Output = Vec<Disk>;

    const SPEC: ActionSpec = ActionSpec {
        name: "diskSpace",
        description: "Size and usage of every mounted filesystem",
        command: "df -kP",
        ..ActionSpec::EMPTY
    };

    fn parse_output(
        &self,
        invocation: &Invocation<'_>,
        _args: &Self::Args,
        output: &CommandOutput,
    ) -> Result<Vec<Disk>, ActionError> {
        Ok(parse_df(&output.stdout, invocation.list_policy)?)
    }
}

/// Parse POSIX `df -kP` output. Mount points may contain spaces.
fn parse_df(text: &str, policy: ListParsePolicy) -> Result<Vec<Disk>, ConvertError> {
    let mut disks = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() || line.starts_with("Filesystem") {
            continue;
        }
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < 6 {
            unreadable_line(line, policy)?;
            continue;
        }

        let used: u64 = token("used", columns[2])?;
        let available: u64 = token("available", columns[3])?;
        let total = used + available;
        let percentage = |part: u64| {
            if total == 0 {
                0.0
            } else {
                (part as f64 * 100.0 / total as f64) as f32
            }
        };

        disks.push(Disk {
            file_system: columns[0].to_string(),
            mount_point: columns[5..].join(" "),
            total: total * 1024,
            used: used * 1024,
            available: available * 1024,
            used_percentage: percentage(used),
            available_percentage: percentage(available),
        });
    }
    Ok(disks)
}

crate::record! {
    pub struct FileSpaceArgs {
        /// Directory to measure, `~` when absent
        pub path: Option<String>,
        /// Maximum directory depth to report
        pub depth: Option<i32>,
    }
}

crate::record! {
    pub struct DirectorySize {
        /// Bytes
        pub size: u64,
        pub path: String,
    }
}

pub struct FileSpace;

impl Action for FileSpace {
    type Args = FileSpaceArgs;
    type Output = Vec<DirectorySize>;

    const SPEC: ActionSpec = ActionSpec {
        name: "fileSpace",
        description: "Disk usage of a directory tree",
        command: "du -k {path}",
        pattern: Some(r"^(?P<size>\d+)\s+(?P<path>.+)$"),
        ..ActionSpec::EMPTY
    };

    fn build_command(
        &self,
        _invocation: &Invocation<'_>,
        args: &FileSpaceArgs,
    ) -> Result<String, ActionError> {
        let mut command = String::from("du -k");
        if let Some(depth) = args.depth.filter(|depth| *depth >= 0) {
            command.push_str(&format!(" -d {}", depth));
        }
        command.push(' ');
        command.push_str(args.path.as_deref().filter(|p| !p.is_empty()).unwrap_or("~"));
        Ok(command)
    }

    fn parse_output(
        &self,
        invocation: &Invocation<'_>,
        _args: &FileSpaceArgs,
        output: &CommandOutput,
    ) -> Result<Vec<DirectorySize>, ActionError> {
        let pattern = invocation
            .descriptor
            .result_pattern()
            .ok_or_else(|| ActionError::unexpected("fileSpace has no result pattern"))?;
        let mut sizes: Vec<DirectorySize> =
            parse_records(&output.stdout, pattern, invocation.list_policy)?;
        for entry in &mut sizes {
            entry.size *= 1024;
        }
        Ok(sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::action::ActionDescriptor;
    use crate::session::Platform;

    const DF: &str = "\
Filesystem     1024-blocks      Used Available Capacity Mounted on
/dev/nvme0n1p2   490617784 211473712 254144520      46% /
tmpfs              8084436         0   8084436       0% /dev/shm
/dev/sdb1          1000000    250000    750000      25% /mnt/Backup Drive
";

    #[test]
    fn test_parse_df() {
        let disks = parse_df(DF, ListParsePolicy::Strict).unwrap();
        assert_eq!(disks.len(), 3);

        let root = &disks[0];
        assert_eq!(root.file_system, "/dev/nvme0n1p2");
        assert_eq!(root.mount_point, "/");
        assert_eq!(root.used, 211473712 * 1024);
        assert_eq!(root.total, root.used + root.available);

        let shm = &disks[1];
        assert_eq!(shm.used_percentage, 0.0);
        assert_eq!(shm.available_percentage, 100.0);

        let backup = &disks[2];
        assert_eq!(backup.mount_point, "/mnt/Backup Drive");
        assert_eq!(backup.used_percentage, 25.0);
    }

    #[test]
    fn test_parse_df_short_line() {
        let text = "Filesystem 1024-blocks Used Available Capacity Mounted on\nbroken line\n";
        assert!(matches!(
            parse_df(text, ListParsePolicy::Strict),
            Err(ConvertError::LineMismatch { .. })
        ));
        assert!(parse_df(text, ListParsePolicy::Lenient).unwrap().is_empty());
    }

    #[test]
    fn test_file_space_command() {
        let descriptor = ActionDescriptor::from_action::<FileSpace>().unwrap();
        let invocation = Invocation {
            platform: Platform::Linux,
            descriptor: &descriptor,
            list_policy: ListParsePolicy::Strict,
        };

        let args = FileSpaceArgs::default();
        assert_eq!(FileSpace.build_command(&invocation, &args).unwrap(), "du -k ~");

        let args = FileSpaceArgs {
            path: Some("/var/log".to_string()),
            depth: Some(1),
        };
        assert_eq!(
            FileSpace.build_command(&invocation, &args).unwrap(),
            "du -k -d 1 /var/log"
        );

        let output = CommandOutput::success("8\t/var/log/apt\n120\t/var/log\n");
        let sizes = FileSpace.parse_output(&invocation, &args, &output).unwrap();
        assert_eq!(sizes[0].size, 8 * 1024);
        assert_eq!(sizes[1].path, "/var/log");
    }
}
