//! Query engine: actions, conversion, projection and execution

pub mod action;
pub mod actions;
pub mod convert;
pub mod executor;
pub mod projection;
pub mod registry;
pub mod runner;
pub mod template;
pub mod transformers;
pub mod value;

pub use action::{Action, ActionDescriptor, ActionSpec, Invocation};
pub use executor::{Engine, SessionTarget};
pub use projection::FieldSelection;
pub use registry::{ActionRegistry, FieldTarget};
pub use transformers::{Transformer, TransformerRegistry};
pub use value::{Document, Value};
