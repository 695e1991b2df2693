//! Scalar transformers (`@toGigabytes`, `@toUpper`, ...)
//!
//! A transformer is registered once by name. When a query's selection tree
//! is built, each `@name(args)` is resolved and its arguments converted,
//! producing a bound [`TransformStep`] that the projection applies to leaf
//! values.

mod size;
mod text;

pub use size::{ToGigabytes, ToHumanSize, ToKilobytes, ToMegabytes, ToTerabytes};
pub use text::{ToLower, ToUpper, Trim};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::engine::convert::{convert_arguments, FieldInfo, Record};
use crate::engine::value::Value;
use crate::error::{ActionError, RegistryError};
use crate::parser::ast::Transformation;

pub trait Transformer: Clone + fmt::Debug + Send + Sync + 'static {
    type Args: Record + fmt::Debug;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn transform(&self, value: &Value, args: &Self::Args) -> Result<Value, ActionError>;
}

/// A transformer with its arguments already converted.
pub trait TransformStep: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, value: &Value) -> Result<Value, ActionError>;
}

#[derive(Debug)]
struct Bound<T: Transformer> {
    transformer: T,
    args: T::Args,
}

impl<T: Transformer> TransformStep for Bound<T> {
    fn name(&self) -> &str {
        T::NAME
    }

    fn apply(&self, value: &Value) -> Result<Value, ActionError> {
        self.transformer.transform(value, &self.args)
    }
}

trait Binder: Send + Sync {
    fn bind(&self, transformation: &Transformation) -> Result<Arc<dyn TransformStep>, ActionError>;
}

impl<T: Transformer> Binder for T {
    fn bind(&self, transformation: &Transformation) -> Result<Arc<dyn TransformStep>, ActionError> {
        let args: T::Args = convert_arguments(&transformation.arguments)?;
        Ok(Arc::new(Bound {
            transformer: self.clone(),
            args,
        }))
    }
}

pub struct TransformerEntry {
    name: &'static str,
    description: &'static str,
    argument_fields: &'static [FieldInfo],
    binder: Box<dyn Binder>,
}

impl TransformerEntry {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn description(&self) -> &str {
        self.description
    }

    pub fn argument_fields(&self) -> &'static [FieldInfo] {
        self.argument_fields
    }
}

impl fmt::Display for TransformerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.argument_fields.is_empty() {
            let args: Vec<String> = self
                .argument_fields
                .iter()
                .map(|info| format!("{}: {}", info.key(), info.kind))
                .collect();
            write!(f, "({})", args.join(", "))?;
        }
        write!(f, " - {}", self.description)
    }
}

#[derive(Default)]
pub struct TransformerRegistry {
    entries: BTreeMap<String, TransformerEntry>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(ToKilobytes)?;
        registry.register(ToMegabytes)?;
        registry.register(ToGigabytes)?;
        registry.register(ToTerabytes)?;
        registry.register(ToHumanSize)?;
        registry.register(ToUpper)?;
        registry.register(ToLower)?;
        registry.register(Trim)?;
        Ok(registry)
    }

    pub fn register<T: Transformer>(&mut self, transformer: T) -> Result<(), RegistryError> {
        let key = T::NAME.to_lowercase();
        if self.entries.contains_key(&key) {
            return Err(RegistryError::DuplicateTransformer(T::NAME.to_string()));
        }
        self.entries.insert(
            key,
            TransformerEntry {
                name: T::NAME,
                description: T::DESCRIPTION,
                argument_fields: T::Args::fields(),
                binder: Box::new(transformer),
            },
        );
        Ok(())
    }

    /// Look up and bind `transformation`.
    pub fn resolve(
        &self,
        transformation: &Transformation,
    ) -> Result<Arc<dyn TransformStep>, ActionError> {
        self.entries
            .get(&transformation.name.to_lowercase())
            .ok_or_else(|| ActionError::transformer_not_found(&transformation.name))?
            .binder
            .bind(transformation)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TransformerEntry> {
        self.entries.values()
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionErrorKind;
    use crate::parser::ast::Literal;

    #[test]
    fn test_resolve_and_apply() {
        let registry = TransformerRegistry::with_defaults().unwrap();
        let step = registry.resolve(&Transformation::new("TOUPPER")).unwrap();
        assert_eq!(step.name(), "toUpper");
        assert_eq!(step.apply(&"abc".into()).unwrap(), "ABC".into());
    }

    #[test]
    fn test_unknown_transformer() {
        let registry = TransformerRegistry::with_defaults().unwrap();
        let err = registry.resolve(&Transformation::new("toParsecs")).unwrap_err();
        assert_eq!(err.kind, ActionErrorKind::QueryResolution);
        assert_eq!(err.message, "Transformer 'toParsecs' was not found");
    }

    #[test]
    fn test_bad_transformer_argument() {
        let registry = TransformerRegistry::with_defaults().unwrap();
        let transformation = Transformation::new("toGigabytes")
            .with_argument("precision", Literal::Str("two".to_string()));
        let err = registry.resolve(&transformation).unwrap_err();
        assert_eq!(err.kind, ActionErrorKind::ArgumentConversion);
    }

    #[test]
    fn test_duplicate_transformer() {
        let mut registry = TransformerRegistry::with_defaults().unwrap();
        assert!(matches!(
            registry.register(Trim),
            Err(RegistryError::DuplicateTransformer(_))
        ));
    }
}
