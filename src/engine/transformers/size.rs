//! Byte count conversions

use bytesize::ByteSize;

use super::Transformer;
use crate::engine::convert::NoArgs;
use crate::engine::value::Value;
use crate::error::ActionError;

crate::record! {
    /// Digits after the decimal point; whole units when absent
    pub struct PrecisionArgs {
        pub precision: Option<i32>,
    }
}

fn byte_count(value: &Value) -> Result<u64, ActionError> {
    match value {
        Value::UInt(bytes) => Ok(*bytes),
        other => Err(ActionError::transformer(format!(
            "Value must be an unsigned byte count, got {}",
            other.type_name()
        ))),
    }
}

fn scale(bytes: u64, power: u32, unit: &str, precision: Option<i32>) -> Value {
    let divisor = 1024u64.pow(power);
    let text = match precision {
        Some(digits) if digits > 0 => {
            let digits = digits as usize;
            format!("{:.*} {}", digits, bytes as f64 / divisor as f64, unit)
        }
        _ => format!("{} {}", bytes / divisor, unit),
    };
    Value::Text(text)
}

macro_rules! unit_transformer {
    ($ty:ident, $name:literal, $description:literal, $power:literal, $unit:literal) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $ty;

        impl Transformer for $ty {
            type Args = PrecisionArgs;

            const NAME: &'static str = $name;
            const DESCRIPTION: &'static str = $description;

            fn transform(&self, value: &Value, args: &PrecisionArgs) -> Result<Value, ActionError> {
                Ok(scale(byte_count(value)?, $power, $unit, args.precision))
            }
        }
    };
}

unit_transformer!(ToKilobytes, "toKilobytes", "Converts bytes to kilobytes", 1, "KB");
unit_transformer!(ToMegabytes, "toMegabytes", "Converts bytes to megabytes", 2, "MB");
unit_transformer!(ToGigabytes, "toGigabytes", "Converts bytes to gigabytes", 3, "GB");
unit_transformer!(ToTerabytes, "toTerabytes", "Converts bytes to terabytes", 4, "TB");

#[derive(Debug, Clone, Copy, Default)]
pub struct ToHumanSize;

impl Transformer for ToHumanSize {
    type Args = NoArgs;

    const NAME: &'static str = "toHumanSize";
    const DESCRIPTION: &'static str = "Renders a byte count in the largest fitting binary unit";

    fn transform(&self, value: &Value, _args: &NoArgs) -> Result<Value, ActionError> {
        let bytes = byte_count(value)?;
        Ok(Value::Text(ByteSize(bytes).to_string_as(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionErrorKind;

    const TWO_GIB: u64 = 2 * 1024 * 1024 * 1024;

    #[test]
    fn test_whole_units() {
        let args = PrecisionArgs::default();
        let bytes = Value::UInt(TWO_GIB);
        assert_eq!(ToKilobytes.transform(&bytes, &args).unwrap(), "2097152 KB".into());
        assert_eq!(ToMegabytes.transform(&bytes, &args).unwrap(), "2048 MB".into());
        assert_eq!(ToGigabytes.transform(&bytes, &args).unwrap(), "2 GB".into());
        assert_eq!(ToTerabytes.transform(&bytes, &args).unwrap(), "0 TB".into());
    }

    #[test]
    fn test_precision() {
        let args = PrecisionArgs {
            precision: Some(2),
        };
        let bytes = Value::UInt(1536 * 1024 * 1024);
        assert_eq!(ToGigabytes.transform(&bytes, &args).unwrap(), "1.50 GB".into());
    }

    #[test]
    fn test_rejects_non_byte_counts() {
        let args = PrecisionArgs::default();
        for value in [Value::Text("10".to_string()), Value::Int(10), Value::Float(1.0)] {
            let err = ToMegabytes.transform(&value, &args).unwrap_err();
            assert_eq!(err.kind, ActionErrorKind::Transformer);
            assert!(err.message.starts_with("Value must be an unsigned byte count"));
        }
    }

    #[test]
    fn test_human_size() {
        let out = ToHumanSize.transform(&Value::UInt(TWO_GIB), &NoArgs {}).unwrap();
        assert_eq!(out, "2.0 GiB".into());
    }
}
