//! [`FieldValue`] implementations for the supported scalar types

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use url::Url;
use uuid::Uuid;

use super::dates::parse_datetime;
use super::{FieldKind, FieldValue, TemplateValue};
use crate::engine::value::Value;
use crate::error::ConvertError;
use crate::parser::ast::Literal;

fn invalid(field: &str, kind: FieldKind, value: &str) -> ConvertError {
    ConvertError::InvalidValue {
        field: field.to_string(),
        kind,
        value: value.to_string(),
    }
}

fn mismatch(literal: &Literal, field: &str, expected: FieldKind) -> ConvertError {
    ConvertError::UnsupportedArgumentType {
        argument: field.to_string(),
        found: literal.kind_name(),
        expected,
    }
}

impl FieldValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn from_literal(literal: &Literal, field: &str) -> Result<Option<Self>, ConvertError> {
        match literal {
            Literal::Bool(b) => Ok(Some(*b)),
            other => Err(mismatch(other, field, Self::KIND)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn template_value(&self) -> TemplateValue {
        TemplateValue::Flag(*self)
    }
}

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::String;

    fn from_capture(text: &str, _field: &str) -> Result<Option<Self>, ConvertError> {
        Ok(Some(text.to_string()))
    }

    fn from_literal(literal: &Literal, field: &str) -> Result<Option<Self>, ConvertError> {
        match literal {
            Literal::Str(s) => Ok(Some(s.clone())),
            other => Err(mismatch(other, field, Self::KIND)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

// Numeric captures: whitespace is trimmed and an empty capture is zero.
macro_rules! numeric_field {
    (@literal $ty:ty, int, $lit:ident, $field:ident) => {
        match $lit {
            Literal::Int(n) => <$ty>::try_from(*n)
                .map(Some)
                .map_err(|_| invalid($field, Self::KIND, &n.to_string())),
            other => Err(mismatch(other, $field, Self::KIND)),
        }
    };
    (@literal $ty:ty, decimal, $lit:ident, $field:ident) => {
        match $lit {
            Literal::Decimal(d) => Ok(Some(*d as $ty)),
            other => Err(mismatch(other, $field, Self::KIND)),
        }
    };
    (@literal $ty:ty, none, $lit:ident, $field:ident) => {
        Err(mismatch($lit, $field, Self::KIND))
    };
    ($ty:ty, $kind:expr, $zero:expr, $value:expr, $literal:ident) => {
        impl FieldValue for $ty {
            const KIND: FieldKind = $kind;

            fn from_capture(text: &str, field: &str) -> Result<Option<Self>, ConvertError> {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(Some($zero));
                }
                trimmed
                    .parse::<$ty>()
                    .map(Some)
                    .map_err(|_| invalid(field, Self::KIND, text))
            }

            fn from_literal(literal: &Literal, field: &str) -> Result<Option<Self>, ConvertError> {
                numeric_field!(@literal $ty, $literal, literal, field)
            }

            fn to_value(&self) -> Value {
                ($value)(*self)
            }
        }
    };
}

numeric_field!(i32, FieldKind::I32, 0, |n: i32| Value::Int(i64::from(n)), int);
numeric_field!(i64, FieldKind::I64, 0, Value::Int, int);
numeric_field!(u32, FieldKind::U32, 0, |n: u32| Value::UInt(u64::from(n)), none);
numeric_field!(u64, FieldKind::U64, 0, Value::UInt, none);
numeric_field!(f32, FieldKind::F32, 0.0, |n: f32| Value::Float(f64::from(n)), decimal);
numeric_field!(f64, FieldKind::F64, 0.0, Value::Float, decimal);

/// Local date/time parsed against the accepted format list. Failures are
/// logged and leave the field untouched.
impl FieldValue for NaiveDateTime {
    const KIND: FieldKind = FieldKind::DateTime;

    fn from_capture(text: &str, field: &str) -> Result<Option<Self>, ConvertError> {
        let parsed = parse_datetime(text);
        if parsed.is_none() {
            tracing::warn!(field, value = text, "unrecognized date format, leaving default");
        }
        Ok(parsed)
    }

    fn from_literal(literal: &Literal, field: &str) -> Result<Option<Self>, ConvertError> {
        match literal {
            Literal::Str(s) => Self::from_capture(s, field),
            other => Err(mismatch(other, field, Self::KIND)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Text(self.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

impl FieldValue for DateTime<FixedOffset> {
    const KIND: FieldKind = FieldKind::DateTimeOffset;

    fn from_capture(text: &str, field: &str) -> Result<Option<Self>, ConvertError> {
        let trimmed = text.trim();
        DateTime::parse_from_rfc3339(trimmed)
            .or_else(|_| DateTime::parse_from_rfc2822(trimmed))
            .map(Some)
            .map_err(|_| invalid(field, Self::KIND, text))
    }

    fn to_value(&self) -> Value {
        Value::Text(self.to_rfc3339())
    }
}

impl FieldValue for Duration {
    const KIND: FieldKind = FieldKind::TimeSpan;

    fn from_capture(text: &str, field: &str) -> Result<Option<Self>, ConvertError> {
        parse_timespan(text.trim())
            .map(Some)
            .ok_or_else(|| invalid(field, Self::KIND, text))
    }

    fn to_value(&self) -> Value {
        Value::Text(format_timespan(self))
    }
}

impl FieldValue for Uuid {
    const KIND: FieldKind = FieldKind::Guid;

    fn from_capture(text: &str, field: &str) -> Result<Option<Self>, ConvertError> {
        Uuid::parse_str(text.trim())
            .map(Some)
            .map_err(|_| invalid(field, Self::KIND, text))
    }

    fn to_value(&self) -> Value {
        Value::Text(self.hyphenated().to_string())
    }
}

impl FieldValue for Url {
    const KIND: FieldKind = FieldKind::Uri;

    fn from_capture(text: &str, field: &str) -> Result<Option<Self>, ConvertError> {
        Url::parse(text.trim())
            .map(Some)
            .map_err(|_| invalid(field, Self::KIND, text))
    }

    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: FieldKind = T::KIND;

    fn from_capture(text: &str, field: &str) -> Result<Option<Self>, ConvertError> {
        Ok(T::from_capture(text, field)?.map(Some))
    }

    fn from_literal(literal: &Literal, field: &str) -> Result<Option<Self>, ConvertError> {
        Ok(T::from_literal(literal, field)?.map(Some))
    }

    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }

    fn template_value(&self) -> TemplateValue {
        match self {
            Some(value) => value.template_value(),
            None if T::KIND == FieldKind::Bool => TemplateValue::Flag(false),
            None => TemplateValue::Text(String::new()),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    const KIND: FieldKind = FieldKind::List;

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }
}

/// Parse `[-][d.]hh:mm[:ss[.fffffff]]`.
pub fn parse_timespan(text: &str) -> Option<Duration> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (days, clock) = match body.split_once('.') {
        Some((d, rest)) if !d.contains(':') => (d.parse::<i64>().ok()?, rest),
        _ => (0, body),
    };

    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let (seconds, nanos) = match parts.next() {
        Some(sec) => {
            let (whole, fraction) = sec.split_once('.').unwrap_or((sec, ""));
            let whole: i64 = whole.parse().ok()?;
            let nanos = if fraction.is_empty() {
                0
            } else {
                if fraction.len() > 9 || !fraction.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                format!("{:0<9}", fraction).parse::<i64>().ok()?
            };
            (whole, nanos)
        }
        None => (0, 0),
    };
    if parts.next().is_some() || hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }

    let total = Duration::days(days)
        + Duration::hours(hours)
        + Duration::minutes(minutes)
        + Duration::seconds(seconds)
        + Duration::nanoseconds(nanos);
    Some(if negative { -total } else { total })
}

fn format_timespan(span: &Duration) -> String {
    let sign = if *span < Duration::zero() { "-" } else { "" };
    let span = if *span < Duration::zero() { -*span } else { *span };
    let days = span.num_days();
    let hours = span.num_hours() % 24;
    let minutes = span.num_minutes() % 60;
    let seconds = span.num_seconds() % 60;
    if days > 0 {
        format!("{}{}.{:02}:{:02}:{:02}", sign, days, hours, minutes, seconds)
    } else {
        format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
    }
}
