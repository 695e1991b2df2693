//! The `docker` namespace
//!
//! Every listing asks docker for a tab-separated `--format`, so each column
//! is captured with `[^\t]*` regardless of spaces inside values.

use crate::engine::action::{Action, ActionSpec, Invocation};
use crate::engine::convert::{NoArgs, Record};
use crate::engine::registry::ActionRegistry;
use crate::engine::template;
use crate::error::{ActionError, RegistryError};

pub const NAMESPACE: &str = "docker";

const DEPENDENCIES: &[&str] = &["docker"];

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(Containers)?;
    registry.register(Images)?;
    registry.register(Networks)?;
    registry.register(Volumes)?;
    registry.register(Contexts)?;
    Ok(())
}

crate::record! {
    pub struct ContainerArgs {
        /// Include stopped containers
        pub all: bool,
        /// Only the N most recently created
        pub limit: Option<i32>,
    }
}

crate::record! {
    pub struct Container {
        pub id: String,
        pub image: String,
        pub command: String,
        pub created: String,
        pub status: String,
        pub ports: String,
        pub names: String,
    }
}

pub struct Containers;

impl Action for Containers {
    type Args = ContainerArgs;
    type Output = Vec<Container>;

    const SPEC: ActionSpec = ActionSpec {
        name: "containers",
        namespace: NAMESPACE,
        description: "Containers known to the docker daemon",
        command: r"docker ps ?[all]-a --format '{{.ID}}\t{{.Image}}\t{{.Command}}\t{{.CreatedAt}}\t{{.Status}}\t{{.Ports}}\t{{.Names}}'",
        pattern: Some(
            r"^(?P<id>[^\t]*)\t(?P<image>[^\t]*)\t(?P<command>[^\t]*)\t(?P<created>[^\t]*)\t(?P<status>[^\t]*)\t(?P<ports>[^\t]*)\t(?P<names>[^\t]*)$",
        ),
        dependencies: DEPENDENCIES,
        ..ActionSpec::EMPTY
    };

    fn build_command(&self, invocation: &Invocation<'_>, args: &ContainerArgs) -> Result<String, ActionError> {
        let mut command = template::render(
            invocation.descriptor.command_template(),
            &args.template_values(),
        );
        if let Some(limit) = args.limit.filter(|n| *n > 0) {
            command.push_str(&format!(" --last {}", limit));
        }
        Ok(command)
    }
}

crate::record! {
    pub struct Image {
        pub repository: String,
        pub tag: String,
        pub id: String,
        pub created: String,
        pub size: String,
    }
}

pub struct Images;

impl Action for Images {
    type Args = NoArgs;
    type Output = Vec<Image>;

    const SPEC: ActionSpec = ActionSpec {
        name: "images",
        namespace: NAMESPACE,
        description: "Locally stored images",
        command: r"docker images --format '{{.Repository}}\t{{.Tag}}\t{{.ID}}\t{{.CreatedSince}}\t{{.Size}}'",
        pattern: Some(
            r"^(?P<repository>[^\t]*)\t(?P<tag>[^\t]*)\t(?P<id>[^\t]*)\t(?P<created>[^\t]*)\t(?P<size>[^\t]*)$",
        ),
        dependencies: DEPENDENCIES,
        ..ActionSpec::EMPTY
    };
}

crate::record! {
    pub struct Network {
        pub id: String,
        pub name: String,
        pub driver: String,
        pub scope: String,
    }
}

pub struct Networks;

impl Action for Networks {
    type Args = NoArgs;
    type Output = Vec<Network>;

    const SPEC: ActionSpec = ActionSpec {
        name: "networks",
        namespace: NAMESPACE,
        description: "Docker networks",
        command: r"docker network ls --format '{{.ID}}\t{{.Name}}\t{{.Driver}}\t{{.Scope}}'",
        pattern: Some(r"^(?P<id>[^\t]*)\t(?P<name>[^\t]*)\t(?P<driver>[^\t]*)\t(?P<scope>[^\t]*)$"),
        dependencies: DEPENDENCIES,
        ..ActionSpec::EMPTY
    };
}

crate::record! {
    pub struct Volume {
        pub driver: String,
        pub name: String,
    }
}

pub struct Volumes;

impl Action for Volumes {
    type Args = NoArgs;
    type Output = Vec<Volume>;

    const SPEC: ActionSpec = ActionSpec {
        name: "volumes",
        namespace: NAMESPACE,
        description: "Docker volumes",
        command: r"docker volume ls --format '{{.Driver}}\t{{.Name}}'",
        pattern: Some(r"^(?P<driver>[^\t]*)\t(?P<name>[^\t]*)$"),
        dependencies: DEPENDENCIES,
        ..ActionSpec::EMPTY
    };
}

crate::record! {
    pub struct Context {
        pub name: String,
        pub description: String,
        pub docker_endpoint: String,
        /// `true` for the active context
        pub current: String,
    }
}

pub struct Contexts;

impl Action for Contexts {
    type Args = NoArgs;
    type Output = Vec<Context>;

    const SPEC: ActionSpec = ActionSpec {
        name: "contexts",
        namespace: NAMESPACE,
        description: "Configured docker contexts",
        command: r"docker context ls --format '{{.Name}}\t{{.Description}}\t{{.DockerEndpoint}}\t{{.Current}}'",
        pattern: Some(
            r"^(?P<name>[^\t]*)\t(?P<description>[^\t]*)\t(?P<dockerEndpoint>[^\t]*)\t(?P<current>[^\t]*)$",
        ),
        dependencies: DEPENDENCIES,
        ..ActionSpec::EMPTY
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::action::ActionDescriptor;
    use crate::engine::convert::{ActionOutput, ListParsePolicy};
    use crate::session::Platform;

    #[test]
    fn test_containers_command() {
        let descriptor = ActionDescriptor::from_action::<Containers>().unwrap();
        let invocation = Invocation {
            platform: Platform::Linux,
            descriptor: &descriptor,
            list_policy: ListParsePolicy::Strict,
        };

        let command = Containers
            .build_command(&invocation, &ContainerArgs::default())
            .unwrap();
        assert!(command.starts_with("docker ps --format"));

        let args = ContainerArgs {
            all: true,
            limit: Some(2),
        };
        let command = Containers.build_command(&invocation, &args).unwrap();
        assert!(command.starts_with("docker ps -a --format"));
        assert!(command.ends_with("--last 2"));
    }

    #[test]
    fn test_parse_containers() {
        let descriptor = ActionDescriptor::from_action::<Containers>().unwrap();
        let text = "3f2a9c1d\tnginx:1.25\t\"/docker-entrypoint.…\"\t2024-03-05 14:02:11 +0000 UTC\tUp 2 hours\t0.0.0.0:8080->80/tcp\tweb\n\
                    9b8e7d6c\tpostgres:16\t\"docker-entrypoint.s…\"\t2024-03-04 09:00:00 +0000 UTC\tExited (0) 3 hours ago\t\tdb\n";
        let containers = Vec::<Container>::from_pattern(
            text,
            descriptor.result_pattern().unwrap(),
            ListParsePolicy::Strict,
        )
        .unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].image, "nginx:1.25");
        assert_eq!(containers[0].status, "Up 2 hours");
        assert_eq!(containers[1].ports, "");
        assert_eq!(containers[1].names, "db");
    }

    #[test]
    fn test_namespace_and_dependency() {
        let descriptor = ActionDescriptor::from_action::<Volumes>().unwrap();
        assert_eq!(descriptor.qualified_name(), "docker.volumes");
        assert_eq!(descriptor.dependencies(), ["docker".to_string()]);
    }
}
