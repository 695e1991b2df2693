//! Memory and CPU information

use crate::engine::action::{Action, ActionSpec, Invocation};
use crate::engine::convert::NoArgs;
use crate::engine::registry::ActionRegistry;
use crate::error::{ActionError, ConvertError, RegistryError};
use crate::session::{CommandOutput, Platform};

use super::token;

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(MemoryInfo)?;
    registry.register(CpuInfo)?;
    Ok(())
}

crate::record! {
    /// Physical memory in bytes
    pub struct Memory {
        pub total: u64,
        pub used: u64,
        pub free: u64,
        pub shared: u64,
        pub buff_cache: u64,
        pub available: u64,
    }
}

crate::record! {
    pub struct Swap {
        pub total: u64,
        pub used: u64,
        pub free: u64,
    }
}

crate::record! {
    pub struct MemoryReport {
        pub memory: Memory,
        pub swap: Swap,
    }
}

/// `free -b` on Linux. macOS only reports the installed total.
pub struct MemoryInfo;

impl Action for MemoryInfo {
    type Args = NoArgs;
    type Output = MemoryReport;

    const SPEC: ActionSpec = ActionSpec {
        name: "memoryInfo",
        description: "Physical memory and swap usage in bytes",
        command: "free -b",
        ..ActionSpec::EMPTY
    };

    fn build_command(&self, invocation: &Invocation<'_>, _args: &NoArgs) -> Result<String, ActionError> {
        Ok(match invocation.platform {
            Platform::Linux => Self::SPEC.command.to_string(),
            Platform::MacOs => "sysctl -n hw.memsize".to_string(),
        })
    }

    fn parse_output(
        &self,
        invocation: &Invocation<'_>,
        _args: &NoArgs,
        output: &CommandOutput,
    ) -> Result<MemoryReport, ActionError> {
        let report = match invocation.platform {
            Platform::Linux => parse_free(&output.stdout)?,
            Platform::MacOs => MemoryReport {
                memory: Memory {
                    total: token("total", output.stdout.trim())?,
                    ..Default::default()
                },
                ..Default::default()
            },
        };
        Ok(report)
    }
}

fn parse_free(text: &str) -> Result<MemoryReport, ConvertError> {
    let mut report = MemoryReport::default();
    let mut matched = false;

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else {
            continue;
        };
        let values: Vec<&str> = parts.collect();
        let column = |index: usize, field: &str| -> Result<u64, ConvertError> {
            token(field, values.get(index).copied().unwrap_or_default())
        };

        match label {
            "Mem:" => {
                report.memory = Memory {
                    total: column(0, "total")?,
                    used: column(1, "used")?,
                    free: column(2, "free")?,
                    shared: column(3, "shared")?,
                    buff_cache: column(4, "buffCache")?,
                    available: column(5, "available")?,
                };
                matched = true;
            }
            "Swap:" => {
                report.swap = Swap {
                    total: column(0, "total")?,
                    used: column(1, "used")?,
                    free: column(2, "free")?,
                };
            }
            _ => {}
        }
    }

    if matched {
        Ok(report)
    } else {
        Err(ConvertError::NoMatch)
    }
}

crate::record! {
    pub struct Cpu {
        pub architecture: String,
        pub model_name: String,
        pub vendor: String,
        /// Logical CPUs
        pub cpus: u32,
        pub threads_per_core: u32,
        pub cores_per_socket: u32,
        pub sockets: u32,
        pub flags: Vec<String>,
    }
}

pub struct CpuInfo;

impl Action for CpuInfo {
    type Args = NoArgs;
    type Output = Cpu;

    const SPEC: ActionSpec = ActionSpec {
        name: "cpuInfo",
        description: "Processor model and topology",
        command: "LC_ALL=C lscpu",
        ..ActionSpec::EMPTY
    };

    fn build_command(&self, invocation: &Invocation<'_>, _args: &NoArgs) -> Result<String, ActionError> {
        Ok(match invocation.platform {
            Platform::Linux => Self::SPEC.command.to_string(),
            Platform::MacOs => concat!(
                "sysctl -a | grep -E '^(machdep.cpu.brand_string|machdep.cpu.vendor|hw.ncpu|hw.physicalcpu|hw.packages|machdep.cpu.features):'; ",
                "echo \"arch: $(uname -m)\""
            )
            .to_string(),
        })
    }

    fn parse_output(
        &self,
        invocation: &Invocation<'_>,
        _args: &NoArgs,
        output: &CommandOutput,
    ) -> Result<Cpu, ActionError> {
        Ok(parse_cpu(&output.stdout, invocation.platform)?)
    }
}

/// Parse `key: value` lines from `lscpu` or the filtered `sysctl` listing.
fn parse_cpu(text: &str, platform: Platform) -> Result<Cpu, ConvertError> {
    let mut cpu = Cpu::default();
    let mut physical_cores = 0u32;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match (platform, key.trim()) {
            (Platform::Linux, "Architecture") | (Platform::MacOs, "arch") => {
                cpu.architecture = value.to_string()
            }
            (Platform::Linux, "Model name") | (Platform::MacOs, "machdep.cpu.brand_string") => {
                cpu.model_name = value.to_string()
            }
            (Platform::Linux, "Vendor ID") | (Platform::MacOs, "machdep.cpu.vendor") => {
                cpu.vendor = value.to_string()
            }
            (Platform::Linux, "CPU(s)") | (Platform::MacOs, "hw.ncpu") => {
                cpu.cpus = token("cpus", value)?
            }
            (Platform::Linux, "Thread(s) per core") => {
                cpu.threads_per_core = token("threadsPerCore", value)?
            }
            (Platform::Linux, "Core(s) per socket") => {
                cpu.cores_per_socket = token("coresPerSocket", value)?
            }
            (Platform::Linux, "Socket(s)") | (Platform::MacOs, "hw.packages") => {
                cpu.sockets = token("sockets", value)?
            }
            (Platform::MacOs, "hw.physicalcpu") => physical_cores = token("physicalCores", value)?,
            (Platform::Linux, "Flags") | (Platform::MacOs, "machdep.cpu.features") => {
                cpu.flags = value
                    .split_whitespace()
                    .map(|flag| flag.to_lowercase())
                    .collect()
            }
            _ => {}
        }
    }

    if platform == Platform::MacOs && physical_cores > 0 {
        let sockets = cpu.sockets.max(1);
        cpu.cores_per_socket = physical_cores / sockets;
        cpu.threads_per_core = cpu.cpus / physical_cores;
    }

    if cpu.cpus == 0 && cpu.model_name.is_empty() {
        return Err(ConvertError::NoMatch);
    }
    Ok(cpu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_free() {
        let text = "\
               total        used        free      shared  buff/cache   available
Mem:     16542777344  5063659520   852291584   612380672 10626826240 10479067136
Swap:     2147479552           0  2147479552
";
        let report = parse_free(text).unwrap();
        assert_eq!(report.memory.total, 16542777344);
        assert_eq!(report.memory.buff_cache, 10626826240);
        assert_eq!(report.memory.available, 10479067136);
        assert_eq!(report.swap.used, 0);
        assert_eq!(report.swap.free, 2147479552);
    }

    #[test]
    fn test_parse_free_without_mem_line() {
        assert_eq!(parse_free("nothing here\n").unwrap_err(), ConvertError::NoMatch);
    }

    #[test]
    fn test_parse_lscpu() {
        let text = "\
Architecture:            x86_64
  CPU op-mode(s):        32-bit, 64-bit
CPU(s):                  8
Vendor ID:               GenuineIntel
  Model name:            Intel(R) Core(TM) i7-10510U CPU @ 1.80GHz
    Thread(s) per core:  2
    Core(s) per socket:  4
    Socket(s):           1
    Flags:               fpu vme de pse
";
        let cpu = parse_cpu(text, Platform::Linux).unwrap();
        assert_eq!(cpu.architecture, "x86_64");
        assert_eq!(cpu.vendor, "GenuineIntel");
        assert_eq!(cpu.model_name, "Intel(R) Core(TM) i7-10510U CPU @ 1.80GHz");
        assert_eq!(cpu.cpus, 8);
        assert_eq!(cpu.threads_per_core, 2);
        assert_eq!(cpu.cores_per_socket, 4);
        assert_eq!(cpu.sockets, 1);
        assert_eq!(cpu.flags, vec!["fpu", "vme", "de", "pse"]);
    }

    #[test]
    fn test_parse_sysctl() {
        let text = "\
hw.ncpu: 8
hw.physicalcpu: 4
hw.packages: 1
machdep.cpu.brand_string: Intel(R) Core(TM) i5-8259U CPU @ 2.30GHz
machdep.cpu.vendor: GenuineIntel
machdep.cpu.features: FPU VME SSE3
arch: x86_64
";
        let cpu = parse_cpu(text, Platform::MacOs).unwrap();
        assert_eq!(cpu.cpus, 8);
        assert_eq!(cpu.cores_per_socket, 4);
        assert_eq!(cpu.threads_per_core, 2);
        assert_eq!(cpu.architecture, "x86_64");
        assert_eq!(cpu.flags, vec!["fpu", "vme", "sse3"]);
    }
}
