//! Identity of the session user

use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::action::{Action, ActionSpec, Invocation};
use crate::engine::convert::NoArgs;
use crate::engine::registry::ActionRegistry;
use crate::error::{ActionError, ConvertError, RegistryError};
use crate::session::CommandOutput;

use super::token;

pub fn register(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    registry.register(WhoAmI)?;
    registry.register(Groups)?;
    registry.register(Id)?;
    Ok(())
}

pub struct WhoAmI;

impl Action for WhoAmI {
    type Args = NoArgs;
    type Output = String;

    const SPEC: ActionSpec = ActionSpec {
        name: "whoAmI",
        description: "Name of the user the session runs as",
        command: "whoami",
        pattern: Some("(.*)"),
        ..ActionSpec::EMPTY
    };
}

pub struct Groups;

impl Action for Groups {
    type Args = NoArgs;
    type Output = Vec<String>;

    const SPEC: ActionSpec = ActionSpec {
        name: "groups",
        description: "Groups the session user belongs to",
        command: "groups",
        ..ActionSpec::EMPTY
    };

    fn parse_output(
        &self,
        _invocation: &Invocation<'_>,
        _args: &NoArgs,
        output: &CommandOutput,
    ) -> Result<Vec<String>, ActionError> {
        Ok(output.stdout.split_whitespace().map(str::to_string).collect())
    }
}

crate::record! {
    pub struct GroupInfo {
        pub id: u32,
        pub name: String,
    }
}

crate::record! {
    pub struct IdInfo {
        pub username: String,
        pub uid: u32,
        pub primary_group: GroupInfo,
        pub groups: Vec<GroupInfo>,
    }
}

static UID: Lazy<Regex> = Lazy::new(|| Regex::new(r"uid=(\d+)\(([^)]*)\)").expect("valid regex"));
static GID: Lazy<Regex> = Lazy::new(|| Regex::new(r"gid=(\d+)\(([^)]*)\)").expect("valid regex"));
static GROUPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"groups=(\S+)").expect("valid regex"));
static GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\(([^)]*)\)").expect("valid regex"));

pub struct Id;

impl Action for Id {
    type Args = NoArgs;
    type Output = IdInfo;

    const SPEC: ActionSpec = ActionSpec {
        name: "id",
        description: "User and group ids of the session user",
        command: "id",
        ..ActionSpec::EMPTY
    };

    fn parse_output(
        &self,
        _invocation: &Invocation<'_>,
        _args: &NoArgs,
        output: &CommandOutput,
    ) -> Result<IdInfo, ActionError> {
        Ok(parse_id(&output.stdout)?)
    }
}

/// Parse `uid=1000(deploy) gid=1000(deploy) groups=1000(deploy),27(sudo)`.
fn parse_id(text: &str) -> Result<IdInfo, ConvertError> {
    let uid = UID.captures(text).ok_or(ConvertError::NoMatch)?;
    let gid = GID.captures(text).ok_or(ConvertError::NoMatch)?;

    let groups = match GROUPS.captures(text) {
        Some(list) => GROUP
            .captures_iter(&list[1])
            .map(|group| -> Result<GroupInfo, ConvertError> {
                Ok(GroupInfo {
                    id: token("id", &group[1])?,
                    name: group[2].to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(IdInfo {
        username: uid[2].to_string(),
        uid: token("uid", &uid[1])?,
        primary_group: GroupInfo {
            id: token("id", &gid[1])?,
            name: gid[2].to_string(),
        },
        groups,
    })
}
