//! Typed conversion between query literals, command output and records
//!
//! Argument and result structs are declared with the [`record!`](crate::record)
//! macro, which generates a static field table (`name`, [`FieldKind`]) and
//! the setters the converter needs. Names are matched case-insensitively
//! against the camel-cased field name, so `show_hidden` accepts `showHidden`,
//! `ShowHidden` or `showhidden`.

mod dates;
mod fields;
mod results;

pub use dates::{parse_datetime, DATE_FORMATS};
pub use fields::parse_timespan;
pub use results::{parse_record, parse_records, ActionOutput, ListParsePolicy, ResultPattern};

use std::fmt;

use crate::engine::value::Value;
use crate::error::ConvertError;
use crate::parser::ast::{Argument, Literal};

/// The closed set of property types a record field can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    String,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    DateTime,
    DateTimeOffset,
    TimeSpan,
    Guid,
    Uri,
    Enum,
    Record,
    List,
}

impl FieldKind {
    /// Kinds that can be populated from a regex capture group.
    pub fn is_capturable(self) -> bool {
        !matches!(
            self,
            FieldKind::Bool | FieldKind::Enum | FieldKind::Record | FieldKind::List
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::I32 => "i32",
            FieldKind::U32 => "u32",
            FieldKind::I64 => "i64",
            FieldKind::U64 => "u64",
            FieldKind::F32 => "f32",
            FieldKind::F64 => "f64",
            FieldKind::DateTime => "DateTime",
            FieldKind::DateTimeOffset => "DateTimeOffset",
            FieldKind::TimeSpan => "TimeSpan",
            FieldKind::Guid => "Guid",
            FieldKind::Uri => "Uri",
            FieldKind::Enum => "enum",
            FieldKind::Record => "record",
            FieldKind::List => "list",
        };
        write!(f, "{}", name)
    }
}

/// One entry of a record's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Rust field name (`snake_case`)
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldInfo {
    /// The name the field is exposed under in templates and documents.
    pub fn key(&self) -> String {
        snake_to_camel(self.name)
    }

    /// Whether `candidate` (a query argument or capture group name) refers
    /// to this field.
    pub fn matches(&self, candidate: &str) -> bool {
        names_match(self.name, candidate)
    }
}

/// How a field takes part in command template substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Flag(bool),
    Text(String),
}

/// A struct with a generated field table.
///
/// Implemented by [`record!`](crate::record); not meant to be implemented by
/// hand.
pub trait Record: Default + Send + Sync + 'static {
    fn fields() -> &'static [FieldInfo];

    /// Set `field` from captured command output.
    fn assign_capture(&mut self, field: &str, text: &str) -> Result<(), ConvertError>;

    /// Set `field` from a query literal.
    fn assign_literal(&mut self, field: &str, literal: &Literal) -> Result<(), ConvertError>;

    fn template_values(&self) -> Vec<(&'static str, TemplateValue)>;

    /// Lower into a map keyed by camel-cased field names, in declaration order.
    fn to_value(&self) -> Value;
}

/// A type that can sit in a record field.
///
/// The defaults reject conversion, so a type only opts into the capture or
/// literal paths it supports.
pub trait FieldValue: Sized {
    const KIND: FieldKind;

    /// Parse captured text. `Ok(None)` leaves the field at its default.
    fn from_capture(_text: &str, field: &str) -> Result<Option<Self>, ConvertError> {
        Err(ConvertError::UnsupportedResultType {
            field: field.to_string(),
            kind: Self::KIND,
        })
    }

    /// Convert a query literal. `Ok(None)` leaves the field at its default.
    fn from_literal(literal: &Literal, field: &str) -> Result<Option<Self>, ConvertError> {
        Err(ConvertError::UnsupportedArgumentType {
            argument: field.to_string(),
            found: literal.kind_name(),
            expected: Self::KIND,
        })
    }

    fn to_value(&self) -> Value;

    fn template_value(&self) -> TemplateValue {
        TemplateValue::Text(self.to_value().to_string())
    }
}

/// Populate a fresh argument record from query arguments.
///
/// Unknown arguments are ignored, `null` leaves the default, and a literal of
/// the wrong kind is an error.
pub fn convert_arguments<R: Record>(arguments: &[Argument]) -> Result<R, ConvertError> {
    let mut record = R::default();
    for info in R::fields() {
        let Some(argument) = arguments.iter().find(|arg| info.matches(&arg.name)) else {
            continue;
        };
        if argument.value == Literal::Null {
            continue;
        }
        record.assign_literal(info.name, &argument.value)?;
    }
    Ok(record)
}

/// Reject record types containing fields that cannot be captured.
pub fn ensure_capturable(fields: &[FieldInfo]) -> Result<(), ConvertError> {
    match fields.iter().find(|info| !info.kind.is_capturable()) {
        Some(info) => Err(ConvertError::UnsupportedResultType {
            field: info.name.to_string(),
            kind: info.kind,
        }),
        None => Ok(()),
    }
}

/// `link_count` → `linkCount`
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Lower-case the leading run of capitals of a PascalCase name.
///
/// `HostName` → `hostName`, `CPU` → `cpu`, `IPAddress` → `ipAddress`. Names
/// that do not start with a capital are returned unchanged.
pub fn to_camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.first().map_or(true, |c| !c.is_uppercase()) {
        return name.to_string();
    }

    let mut out = chars.clone();
    for i in 0..chars.len() {
        let next_is_lower = chars.get(i + 1).map_or(false, |c| !c.is_uppercase());
        if i > 0 && next_is_lower {
            break;
        }
        out[i] = chars[i].to_ascii_lowercase();
    }
    out.into_iter().collect()
}

/// Compare a Rust field name with an external name, ignoring case and
/// underscores.
pub fn names_match(field: &str, candidate: &str) -> bool {
    let normalize = |s: &str| -> String {
        s.chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect()
    };
    normalize(field) == normalize(candidate)
}

/// Declare a record: a plain struct plus its generated field table.
///
/// ```
/// hostql::record! {
///     /// One mounted filesystem
///     pub struct Mount {
///         pub device: String,
///         pub used: u64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $ty, )*
        }

        impl $crate::engine::convert::Record for $name {
            fn fields() -> &'static [$crate::engine::convert::FieldInfo] {
                const FIELDS: &[$crate::engine::convert::FieldInfo] = &[
                    $(
                        $crate::engine::convert::FieldInfo {
                            name: stringify!($field),
                            kind: <$ty as $crate::engine::convert::FieldValue>::KIND,
                        },
                    )*
                ];
                FIELDS
            }

            #[allow(unused_variables)]
            fn assign_capture(
                &mut self,
                field: &str,
                text: &str,
            ) -> ::std::result::Result<(), $crate::error::ConvertError> {
                $(
                    if field == stringify!($field) {
                        if let Some(value) =
                            <$ty as $crate::engine::convert::FieldValue>::from_capture(text, field)?
                        {
                            self.$field = value;
                        }
                        return Ok(());
                    }
                )*
                Ok(())
            }

            #[allow(unused_variables)]
            fn assign_literal(
                &mut self,
                field: &str,
                literal: &$crate::parser::ast::Literal,
            ) -> ::std::result::Result<(), $crate::error::ConvertError> {
                $(
                    if field == stringify!($field) {
                        if let Some(value) =
                            <$ty as $crate::engine::convert::FieldValue>::from_literal(literal, field)?
                        {
                            self.$field = value;
                        }
                        return Ok(());
                    }
                )*
                Ok(())
            }

            fn template_values(
                &self,
            ) -> Vec<(&'static str, $crate::engine::convert::TemplateValue)> {
                vec![
                    $(
                        (
                            stringify!($field),
                            $crate::engine::convert::FieldValue::template_value(&self.$field),
                        ),
                    )*
                ]
            }

            fn to_value(&self) -> $crate::engine::value::Value {
                #[allow(unused_mut)]
                let mut map = $crate::engine::value::Document::new();
                $(
                    map.insert(
                        $crate::engine::convert::snake_to_camel(stringify!($field)),
                        $crate::engine::convert::FieldValue::to_value(&self.$field),
                    );
                )*
                $crate::engine::value::Value::Map(map)
            }
        }

        impl $crate::engine::convert::FieldValue for $name {
            const KIND: $crate::engine::convert::FieldKind =
                $crate::engine::convert::FieldKind::Record;

            fn to_value(&self) -> $crate::engine::value::Value {
                $crate::engine::convert::Record::to_value(self)
            }
        }

        impl $crate::engine::convert::ActionOutput for $name {
            fn capture_fields() -> Option<&'static [$crate::engine::convert::FieldInfo]> {
                Some(<$name as $crate::engine::convert::Record>::fields())
            }

            fn from_pattern(
                text: &str,
                pattern: &$crate::engine::convert::ResultPattern,
                _policy: $crate::engine::convert::ListParsePolicy,
            ) -> ::std::result::Result<Self, $crate::error::ConvertError> {
                $crate::engine::convert::parse_record(text, pattern)
            }

            fn into_value(self) -> $crate::engine::value::Value {
                $crate::engine::convert::Record::to_value(&self)
            }
        }

        impl $crate::engine::convert::ActionOutput for Vec<$name> {
            fn capture_fields() -> Option<&'static [$crate::engine::convert::FieldInfo]> {
                Some(<$name as $crate::engine::convert::Record>::fields())
            }

            fn from_pattern(
                text: &str,
                pattern: &$crate::engine::convert::ResultPattern,
                policy: $crate::engine::convert::ListParsePolicy,
            ) -> ::std::result::Result<Self, $crate::error::ConvertError> {
                $crate::engine::convert::parse_records(text, pattern, policy)
            }

            fn into_value(self) -> $crate::engine::value::Value {
                $crate::engine::value::Value::List(
                    self.iter()
                        .map($crate::engine::convert::Record::to_value)
                        .collect(),
                )
            }
        }
    };
}

crate::record! {
    /// Argument record for actions and transformers that take none
    pub struct NoArgs {}
}
