//! Field projection
//!
//! A [`FieldSelection`] mirrors one query field and its nested selection. It
//! prunes a parsed result down to the requested properties, renames them to
//! the caller's spelling, keeps the caller's order and runs transformers on
//! scalar leaves.

use std::sync::Arc;

use crate::engine::convert::to_camel_case;
use crate::engine::transformers::{TransformStep, TransformerRegistry};
use crate::engine::value::{Document, Value};
use crate::error::ActionError;
use crate::parser::ast::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Prune and apply transformers
    Full,
    /// Prune only
    Reorder,
}

#[derive(Debug, Clone)]
pub struct FieldSelection {
    name: String,
    key: String,
    /// Bound transformers, or why binding them failed
    transformers: Result<Vec<Arc<dyn TransformStep>>, ActionError>,
    children: Vec<FieldSelection>,
}

impl FieldSelection {
    /// Build the selection for `field`, binding every transformer in the
    /// tree. An unknown transformer or bad argument is kept on the node it
    /// belongs to and only replaces that node's value when projecting.
    pub fn resolve(field: &Field, registry: &TransformerRegistry) -> Self {
        let transformers = field
            .transformations
            .iter()
            .map(|t| registry.resolve(t))
            .collect::<Result<Vec<_>, _>>();

        Self {
            name: field.name.clone(),
            key: to_camel_case(&field.name),
            transformers,
            children: field
                .selection
                .iter()
                .map(|child| Self::resolve(child, registry))
                .collect(),
        }
    }

    /// Shape-only selection for `field`, with no transformers bound.
    pub fn outline(field: &Field) -> Self {
        Self {
            name: field.name.clone(),
            key: to_camel_case(&field.name),
            transformers: Ok(Vec::new()),
            children: field.selection.iter().map(Self::outline).collect(),
        }
    }

    /// A synthetic selection over `children`, used for the document root.
    pub fn group(name: impl Into<String>, children: Vec<FieldSelection>) -> Self {
        let name = name.into();
        Self {
            key: to_camel_case(&name),
            name,
            transformers: Ok(Vec::new()),
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn children(&self) -> &[FieldSelection] {
        &self.children
    }

    /// Why this node's own transformers could not be bound.
    pub fn binding_error(&self) -> Option<&ActionError> {
        self.transformers.as_ref().err()
    }

    /// Prune `value` and apply transformers to selected scalars.
    pub fn project(&self, value: &Value) -> Value {
        self.shape(value, Mode::Full)
    }

    /// Prune and reorder `value` without running transformers.
    pub fn reorder(&self, value: &Value) -> Value {
        self.shape(value, Mode::Reorder)
    }

    fn shape(&self, value: &Value, mode: Mode) -> Value {
        if value.is_error_node() {
            return value.clone();
        }
        if let (Mode::Full, Some(err)) = (mode, self.binding_error()) {
            return err.to_node();
        }

        match value {
            Value::Map(map) => Value::Map(self.shape_map(map, mode)),
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| {
                        if item.is_scalar() {
                            item.clone()
                        } else {
                            self.shape(item, mode)
                        }
                    })
                    .collect(),
            ),
            scalar if mode == Mode::Full => self.transform(scalar),
            scalar => scalar.clone(),
        }
    }

    fn shape_map(&self, map: &Document, mode: Mode) -> Document {
        if self.children.is_empty() {
            return map.clone();
        }

        let mut out = Document::new();

        for child in &self.children {
            let found = map
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(&child.key));
            if let Some((_, value)) = found {
                out.insert(child.name.clone(), child.shape(value, mode));
            }
        }
        out
    }

    fn transform(&self, scalar: &Value) -> Value {
        let Ok(steps) = &self.transformers else {
            return scalar.clone();
        };
        let mut current = scalar.clone();
        for step in steps {
            match step.apply(&current) {
                Ok(next) => current = next,
                Err(err) => {
                    tracing::debug!(transformer = step.name(), error = %err, "transformer failed");
                    return err.to_node();
                }
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Literal, Transformation};

    fn disk() -> Value {
        let mut map = Document::new();
        map.insert("fileSystem".to_string(), "/dev/sda1".into());
        map.insert("size".to_string(), Value::UInt(2 * 1024 * 1024 * 1024));
        map.insert("used".to_string(), Value::UInt(1024 * 1024 * 1024));
        map.insert("mountedOn".to_string(), "/".into());
        Value::Map(map)
    }

    fn keys(value: &Value) -> Vec<String> {
        value.as_map().unwrap().keys().cloned().collect()
    }

    #[test]
    fn test_subset_in_selection_order() {
        let field = Field::new("diskSpace").with_selection(vec![
            Field::new("MountedOn"),
            Field::new("size"),
            Field::new("doesNotExist"),
        ]);
        let projected = FieldSelection::outline(&field).project(&disk());
        assert_eq!(keys(&projected), vec!["MountedOn", "size"]);
        assert_eq!(projected.get("mountedon"), Some(&"/".into()));
    }

    #[test]
    fn test_no_children_keeps_everything_in_declaration_order() {
        let projected = FieldSelection::outline(&Field::new("diskSpace")).project(&disk());
        assert_eq!(keys(&projected), vec!["fileSystem", "size", "used", "mountedOn"]);
    }

    #[test]
    fn test_transformers_run_on_selected_leaves() {
        let registry = TransformerRegistry::with_defaults().unwrap();
        let field = Field::new("diskSpace").with_selection(vec![
            Field::new("size").with_transformation(Transformation::new("toGigabytes")),
            Field::new("fileSystem").with_transformation(Transformation::new("toGigabytes")),
        ]);
        let selection = FieldSelection::resolve(&field, &registry);
        let projected = selection.project(&disk());

        assert_eq!(projected.get("size"), Some(&"2 GB".into()));
        // the failing transformer only replaces its own leaf
        let leaf = projected.get("fileSystem").unwrap();
        assert!(leaf.is_error_node());
        assert_eq!(leaf.get("exitCode"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_transformers_chain_left_to_right() {
        let registry = TransformerRegistry::with_defaults().unwrap();
        let field = Field::new("hostName")
            .with_transformation(Transformation::new("trim"))
            .with_transformation(Transformation::new("toUpper"));
        let selection = FieldSelection::resolve(&field, &registry);
        assert_eq!(selection.project(&"  web01 ".into()), "WEB01".into());
    }

    #[test]
    fn test_unknown_transformer_replaces_only_its_leaf() {
        let registry = TransformerRegistry::with_defaults().unwrap();
        let field = Field::new("diskSpace").with_selection(vec![
            Field::new("used"),
            Field::new("size").with_transformation(
                Transformation::new("toPetabytes").with_argument("precision", Literal::Int(1)),
            ),
        ]);
        let selection = FieldSelection::resolve(&field, &registry);
        assert!(selection.binding_error().is_none());
        assert!(selection.children()[1].binding_error().is_some());

        let projected = selection.project(&disk());
        assert_eq!(keys(&projected), vec!["used", "size"]);
        assert_eq!(projected.get("used"), Some(&Value::UInt(1024 * 1024 * 1024)));
        assert_eq!(
            projected.get("size"),
            Some(&Value::error("Transformer 'toPetabytes' was not found", 1))
        );
    }

    #[test]
    fn test_exit_code_field_is_an_ordinary_child() {
        let mut map = Document::new();
        map.insert("output".to_string(), "hi".into());
        map.insert("exitCode".to_string(), Value::Int(0));
        let record = Value::Map(map);

        let only_output = Field::new("runCustom").with_selection(vec![Field::new("output")]);
        let projected = FieldSelection::outline(&only_output).project(&record);
        assert_eq!(keys(&projected), vec!["output"]);

        let both = Field::new("runCustom")
            .with_selection(vec![Field::new("output"), Field::new("exitCode")]);
        let projected = FieldSelection::outline(&both).project(&record);
        assert_eq!(keys(&projected), vec!["output", "exitCode"]);
        assert_eq!(FieldSelection::outline(&both).reorder(&projected), projected);
    }

    #[test]
    fn test_lists_of_records_and_scalars() {
        let field = Field::new("diskSpace").with_selection(vec![Field::new("size")]);
        let selection = FieldSelection::outline(&field);

        let projected = selection.project(&Value::List(vec![disk(), disk()]));
        let Value::List(items) = projected else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(keys(&items[0]), vec!["size"]);

        let groups = Value::List(vec!["wheel".into(), "staff".into()]);
        assert_eq!(selection.project(&groups), groups);
    }

    #[test]
    fn test_error_nodes_are_carried() {
        let field = Field::new("diskSpace").with_selection(vec![Field::new("size")]);
        let node = Value::error("df: not found", 127);
        let projected = FieldSelection::outline(&field).project(&node);
        assert_eq!(projected, node);
    }

    #[test]
    fn test_reorder_is_idempotent_and_pure() {
        let field = Field::new("diskSpace").with_selection(vec![
            Field::new("used"),
            Field::new("FileSystem"),
        ]);
        let root = FieldSelection::group("localhost", vec![FieldSelection::outline(&field)]);

        let mut doc = Document::new();
        doc.insert("diskSpace".to_string(), disk());
        let input = Value::Map(doc);
        let snapshot = input.clone();

        let once = root.reorder(&input);
        let twice = root.reorder(&once);
        assert_eq!(once, twice);
        assert_eq!(input, snapshot);
        assert_eq!(keys(once.get("diskSpace").unwrap()), vec!["used", "FileSystem"]);
    }
}
