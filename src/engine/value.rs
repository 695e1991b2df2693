//! The result document model
//!
//! Every parsed action result is lowered into a [`Value`] before projection.
//! Maps are [`IndexMap`]s so that serializing the same document twice is
//! byte-identical and follows the caller's field order.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// An ordered map of field name to value.
pub type Document = IndexMap<String, Value>;

pub const ERROR_KEY: &str = "error";
pub const EXIT_CODE_KEY: &str = "exitCode";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(Document),
}

impl Value {
    /// An `{error, exitCode}` node.
    pub fn error(message: impl Into<String>, exit_code: i32) -> Self {
        let mut map = Document::new();
        map.insert(ERROR_KEY.to_string(), Value::Text(message.into()));
        map.insert(EXIT_CODE_KEY.to_string(), Value::Int(i64::from(exit_code)));
        Value::Map(map)
    }

    /// True only for the exact `{error, exitCode}` shape built by
    /// [`Value::error`]. A record that merely has such a field is not one.
    pub fn is_error_node(&self) -> bool {
        matches!(
            self,
            Value::Map(map)
                if map.len() == 2
                    && matches!(map.get(ERROR_KEY), Some(Value::Text(_)))
                    && matches!(map.get(EXIT_CODE_KEY), Some(Value::Int(_)))
        )
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Map(_))
    }

    pub fn as_map(&self) -> Option<&Document> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Case-insensitive key lookup on a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "decimal",
            Value::Text(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", rendered.join(", "))
            }
            Value::Map(map) => {
                let rendered: Vec<String> =
                    map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                // null-valued fields are omitted
                let present: Vec<_> = map.iter().filter(|(_, v)| **v != Value::Null).collect();
                let mut out = serializer.serialize_map(Some(present.len()))?;
                for (key, value) in present {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Document> for Value {
    fn from(map: Document) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_node_shape() {
        let node = Value::error("boom", 3);
        assert!(node.is_error_node());
        assert_eq!(node.get("error"), Some(&Value::Text("boom".to_string())));
        assert_eq!(node.get("exitcode"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_record_with_exit_code_is_not_an_error_node() {
        let mut map = Document::new();
        map.insert("output".to_string(), Value::from("hi"));
        map.insert(EXIT_CODE_KEY.to_string(), Value::Int(0));
        assert!(!Value::Map(map.clone()).is_error_node());

        map.insert(ERROR_KEY.to_string(), Value::from("boom"));
        assert!(!Value::Map(map).is_error_node());
    }

    #[test]
    fn test_serialize_omits_nulls_and_keeps_order() {
        let mut map = Document::new();
        map.insert("zeta".to_string(), Value::UInt(1));
        map.insert("gone".to_string(), Value::Null);
        map.insert("alpha".to_string(), Value::from("a"));
        let json = serde_json::to_string(&Value::Map(map)).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":"a"}"#);
    }
}
