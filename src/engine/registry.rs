//! Action registry
//!
//! Actions are registered explicitly at startup and looked up
//! case-insensitively, either globally or inside a namespace. The registry is
//! read-only once built and shared between sessions.

use std::collections::BTreeMap;

use crate::engine::action::{Action, ActionDescriptor, DynAction, Invocation, PreparedAction};
use crate::engine::actions;
use crate::engine::convert::ListParsePolicy;
use crate::error::{ActionError, RegistryError};
use crate::parser::ast::Argument;
use crate::session::Platform;

/// What a top-level field name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    Action,
    Namespace,
}

/// A registered action: its descriptor plus the erased implementation.
pub struct ActionEntry {
    descriptor: ActionDescriptor,
    action: Box<dyn DynAction>,
}

impl ActionEntry {
    pub fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    /// Bind the entry to a session's platform.
    pub fn initialize(&self, platform: Platform, list_policy: ListParsePolicy) -> Invocation<'_> {
        Invocation {
            platform,
            descriptor: &self.descriptor,
            list_policy,
        }
    }

    /// Convert `arguments` and build the command.
    pub fn prepare<'a>(
        &'a self,
        invocation: Invocation<'a>,
        arguments: &[Argument],
    ) -> Result<Box<dyn PreparedAction + 'a>, ActionError> {
        self.action.prepare(invocation, arguments)
    }
}

impl std::fmt::Debug for ActionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionEntry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct ActionRegistry {
    global: BTreeMap<String, ActionEntry>,
    namespaces: BTreeMap<String, BTreeMap<String, ActionEntry>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in action.
    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        actions::register_all(&mut registry)?;
        Ok(registry)
    }

    pub fn register<A: Action>(&mut self, action: A) -> Result<(), RegistryError> {
        let descriptor = ActionDescriptor::from_action::<A>()?;
        let key = descriptor.name().to_lowercase();

        let table = if descriptor.namespace().is_empty() {
            &mut self.global
        } else {
            self.namespaces
                .entry(descriptor.namespace().to_lowercase())
                .or_default()
        };

        if table.contains_key(&key) {
            return Err(RegistryError::DuplicateAction {
                namespace: descriptor.namespace().to_string(),
                name: descriptor.name().to_string(),
            });
        }

        table.insert(
            key,
            ActionEntry {
                descriptor,
                action: Box::new(action),
            },
        );
        Ok(())
    }

    /// Look up `name` in `namespace` (empty for global).
    pub fn resolve(&self, name: &str, namespace: &str) -> Result<&ActionEntry, ActionError> {
        let table = if namespace.is_empty() {
            Some(&self.global)
        } else {
            self.namespaces.get(&namespace.to_lowercase())
        };

        table
            .and_then(|t| t.get(&name.to_lowercase()))
            .ok_or_else(|| ActionError::action_not_found(name, namespace))
    }

    pub fn is_namespace(&self, name: &str) -> bool {
        self.namespaces.contains_key(&name.to_lowercase())
    }

    /// Namespaces win over global actions of the same name.
    pub fn classify(&self, name: &str) -> FieldTarget {
        if self.is_namespace(name) {
            FieldTarget::Namespace
        } else {
            FieldTarget::Action
        }
    }

    /// Every descriptor, global actions first, each group sorted by name.
    pub fn descriptors(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.global
            .values()
            .chain(self.namespaces.values().flat_map(|t| t.values()))
            .map(ActionEntry::descriptor)
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.namespaces.values().map(BTreeMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
