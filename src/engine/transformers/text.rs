//! String transformers

use super::Transformer;
use crate::engine::convert::NoArgs;
use crate::engine::value::Value;
use crate::error::ActionError;

fn text(value: &Value) -> Result<&str, ActionError> {
    value.as_str().ok_or_else(|| {
        ActionError::transformer(format!("Value must be a string, got {}", value.type_name()))
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ToUpper;

impl Transformer for ToUpper {
    type Args = NoArgs;

    const NAME: &'static str = "toUpper";
    const DESCRIPTION: &'static str = "Converts a string to upper case";

    fn transform(&self, value: &Value, _args: &NoArgs) -> Result<Value, ActionError> {
        Ok(Value::Text(text(value)?.to_uppercase()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ToLower;

impl Transformer for ToLower {
    type Args = NoArgs;

    const NAME: &'static str = "toLower";
    const DESCRIPTION: &'static str = "Converts a string to lower case";

    fn transform(&self, value: &Value, _args: &NoArgs) -> Result<Value, ActionError> {
        Ok(Value::Text(text(value)?.to_lowercase()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Trim;

impl Transformer for Trim {
    type Args = NoArgs;

    const NAME: &'static str = "trim";
    const DESCRIPTION: &'static str = "Removes leading and trailing whitespace";

    fn transform(&self, value: &Value, _args: &NoArgs) -> Result<Value, ActionError> {
        Ok(Value::Text(text(value)?.trim().to_string()))
    }
}
