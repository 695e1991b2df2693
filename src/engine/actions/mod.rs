//! Built-in actions
//!
//! Each module groups related actions and exposes a `register` function;
//! [`register_all`] is the single startup routine that wires them into a
//! registry.

pub mod custom;
pub mod disk;
pub mod docker;
pub mod dotnet;
pub mod files;
pub mod logs;
pub mod memory;
pub mod network;
pub mod process;
pub mod system;
pub mod users;

use crate::engine::convert::{FieldValue, ListParsePolicy};
use crate::engine::registry::ActionRegistry;
use crate::error::{ConvertError, RegistryError};

pub fn register_all(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    system::register(registry)?;
    disk::register(registry)?;
    files::register(registry)?;
    memory::register(registry)?;
    process::register(registry)?;
    logs::register(registry)?;
    network::register(registry)?;
    users::register(registry)?;
    custom::register(registry)?;
    docker::register(registry)?;
    dotnet::register(registry)?;
    Ok(())
}

/// Convert one token of hand-parsed output; an empty token is the default.
pub(crate) fn token<T: FieldValue + Default>(field: &str, text: &str) -> Result<T, ConvertError> {
    Ok(T::from_capture(text, field)?.unwrap_or_default())
}

/// Handle a line a hand-written parser cannot read.
pub(crate) fn unreadable_line(line: &str, policy: ListParsePolicy) -> Result<(), ConvertError> {
    match policy {
        ListParsePolicy::Strict => Err(ConvertError::LineMismatch {
            line: line.to_string(),
        }),
        ListParsePolicy::Lenient => {
            tracing::debug!(line, "skipping unreadable line");
            Ok(())
        }
    }
}
