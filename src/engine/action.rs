//! The action abstraction
//!
//! An action pairs a command template with a typed parser. Most actions are
//! fully declarative: an [`ActionSpec`] with a template and a result pattern
//! is enough, and the default [`Action::build_command`] and
//! [`Action::parse_output`] do the rest. Actions with platform-specific
//! commands or hand-written parsing override one or both.

use std::fmt;

use crate::engine::convert::{
    convert_arguments, ensure_capturable, ActionOutput, FieldInfo, ListParsePolicy, Record,
    ResultPattern,
};
use crate::engine::template;
use crate::engine::value::Value;
use crate::error::{ActionError, RegistryError};
use crate::parser::ast::Argument;
use crate::session::{CommandOutput, Platform};

/// Static metadata declared by every action.
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub name: &'static str,
    /// Empty for the global namespace
    pub namespace: &'static str,
    pub description: &'static str,
    pub command: &'static str,
    pub pattern: Option<&'static str>,
    /// Apply the pattern globally instead of once per line
    pub multiline: bool,
    /// Tools that must be on the target's PATH
    pub dependencies: &'static [&'static str],
}

impl ActionSpec {
    pub const EMPTY: ActionSpec = ActionSpec {
        name: "",
        namespace: "",
        description: "",
        command: "",
        pattern: None,
        multiline: false,
        dependencies: &[],
    };
}

/// Per-invocation context handed to an action.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub platform: Platform,
    pub descriptor: &'a ActionDescriptor,
    pub list_policy: ListParsePolicy,
}

pub trait Action: Send + Sync + 'static {
    type Args: Record;
    type Output: ActionOutput;

    const SPEC: ActionSpec;

    fn build_command(
        &self,
        invocation: &Invocation<'_>,
        args: &Self::Args,
    ) -> Result<String, ActionError> {
        Ok(template::render(
            invocation.descriptor.command_template(),
            &args.template_values(),
        ))
    }

    fn parse_output(
        &self,
        invocation: &Invocation<'_>,
        _args: &Self::Args,
        output: &CommandOutput,
    ) -> Result<Self::Output, ActionError> {
        let pattern = invocation.descriptor.result_pattern().ok_or_else(|| {
            ActionError::unexpected(format!(
                "action '{}' has no result pattern",
                invocation.descriptor.qualified_name()
            ))
        })?;
        Ok(Self::Output::from_pattern(
            &output.stdout,
            pattern,
            invocation.list_policy,
        )?)
    }
}

/// An action whose arguments are converted and whose command is built.
pub trait PreparedAction: Send {
    fn command(&self) -> &str;

    fn parse(&self, output: &CommandOutput) -> Result<Value, ActionError>;
}

/// Type-erased [`Action`].
pub(crate) trait DynAction: Send + Sync {
    fn prepare<'a>(
        &'a self,
        invocation: Invocation<'a>,
        arguments: &[Argument],
    ) -> Result<Box<dyn PreparedAction + 'a>, ActionError>;
}

struct Prepared<'a, A: Action> {
    action: &'a A,
    invocation: Invocation<'a>,
    args: A::Args,
    command: String,
}

impl<A: Action> PreparedAction for Prepared<'_, A> {
    fn command(&self) -> &str {
        &self.command
    }

    fn parse(&self, output: &CommandOutput) -> Result<Value, ActionError> {
        self.action
            .parse_output(&self.invocation, &self.args, output)
            .map(ActionOutput::into_value)
    }
}

impl<A: Action> DynAction for A {
    fn prepare<'a>(
        &'a self,
        invocation: Invocation<'a>,
        arguments: &[Argument],
    ) -> Result<Box<dyn PreparedAction + 'a>, ActionError> {
        let args: A::Args = convert_arguments(arguments)?;
        let command = template::normalize_whitespace(&self.build_command(&invocation, &args)?);
        Ok(Box::new(Prepared {
            action: self,
            invocation,
            args,
            command,
        }))
    }
}

/// Registered description of an action.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    name: String,
    namespace: String,
    description: Option<String>,
    argument_fields: &'static [FieldInfo],
    result_fields: Option<&'static [FieldInfo]>,
    command_template: String,
    result_pattern: Option<ResultPattern>,
    dependencies: Vec<String>,
}

impl ActionDescriptor {
    pub(crate) fn from_action<A: Action>() -> Result<Self, RegistryError> {
        let spec = A::SPEC;
        let qualified = qualify(spec.namespace, spec.name);

        let result_pattern = spec
            .pattern
            .map(|source| ResultPattern::new(source, spec.multiline))
            .transpose()
            .map_err(|source| RegistryError::InvalidPattern {
                action: qualified.clone(),
                source,
            })?;

        let result_fields = <A::Output as ActionOutput>::capture_fields();
        if let (Some(_), Some(fields)) = (&result_pattern, result_fields) {
            ensure_capturable(fields).map_err(|source| RegistryError::UnsupportedResultType {
                action: qualified.clone(),
                source,
            })?;
        }

        Ok(Self {
            name: spec.name.to_string(),
            namespace: spec.namespace.to_string(),
            description: (!spec.description.is_empty()).then(|| spec.description.to_string()),
            argument_fields: <A::Args as Record>::fields(),
            result_fields,
            command_template: spec.command.to_string(),
            result_pattern,
            dependencies: spec.dependencies.iter().map(|d| d.to_string()).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `namespace.name`, or just `name` in the global namespace
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn argument_fields(&self) -> &'static [FieldInfo] {
        self.argument_fields
    }

    pub fn result_fields(&self) -> Option<&'static [FieldInfo]> {
        self.result_fields
    }

    pub fn command_template(&self) -> &str {
        &self.command_template
    }

    pub fn result_pattern(&self) -> Option<&ResultPattern> {
        self.result_pattern.as_ref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())?;
        if !self.argument_fields.is_empty() {
            let args: Vec<String> = self
                .argument_fields
                .iter()
                .map(|info| format!("{}: {}", info.key(), info.kind))
                .collect();
            write!(f, "({})", args.join(", "))?;
        }
        if let Some(description) = &self.description {
            write!(f, " - {}", description)?;
        }
        Ok(())
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}
