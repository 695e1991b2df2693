//! The `dotnet` namespace

use crate::engine::action::{Action, ActionSpec};
use crate::engine::convert::NoArgs;
use crate::engine::registry::ActionRegistry;
use crate::error::RegistryError;

pub const NAMESPACE: &str = "dotnet";

const DEPENDENCIES: &[&str] = &["dotnet"];

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(Runtimes)?;
    registry.register(Sdks)?;
    registry.register(Version)?;
    Ok(())
}

crate::record! {
    pub struct Runtime {
        pub package: String,
        pub version: String,
        pub major: i32,
        pub minor: i32,
        pub patch: i32,
        pub path: String,
    }
}

pub struct Runtimes;

impl Action for Runtimes {
    type Args = NoArgs;
    type Output = Vec<Runtime>;

    const SPEC: ActionSpec = ActionSpec {
        name: "runtimes",
        namespace: NAMESPACE,
        description: "Installed .NET runtimes",
        command: "dotnet --list-runtimes",
        pattern: Some(
            r"^(?P<package>\S+)\s+(?P<version>(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)\S*)\s+\[(?P<path>.+?)\]$",
        ),
        dependencies: DEPENDENCIES,
        ..ActionSpec::EMPTY
    };
}

crate::record! {
    pub struct Sdk {
        pub version: String,
        pub major: i32,
        pub minor: i32,
        pub patch: i32,
        pub path: String,
    }
}

pub struct Sdks;

impl Action for Sdks {
    type Args = NoArgs;
    type Output = Vec<Sdk>;

    const SPEC: ActionSpec = ActionSpec {
        name: "sdks",
        namespace: NAMESPACE,
        description: "Installed .NET SDKs",
        command: "dotnet --list-sdks",
        pattern: Some(
            r"^(?P<version>(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)\S*)\s+\[(?P<path>.+?)\]$",
        ),
        dependencies: DEPENDENCIES,
        ..ActionSpec::EMPTY
    };
}

pub struct Version;

impl Action for Version {
    type Args = NoArgs;
    type Output = String;

    const SPEC: ActionSpec = ActionSpec {
        name: "version",
        namespace: NAMESPACE,
        description: "Version of the dotnet host",
        command: "dotnet --version",
        pattern: Some("(.*)"),
        dependencies: DEPENDENCIES,
        ..ActionSpec::EMPTY
    };
}
