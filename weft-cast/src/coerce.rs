//! Scalar coercion into primitive targets.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use weft_core::{Error, Path, PrimitiveType, Value};

/// `Int32 12`, `String "abc"`: how a value is named in mismatch errors.
pub(crate) fn describe(value: &Value) -> String {
    format!("{} {value}", value.type_name())
}

/// The textual form a value takes when coerced into a `String`.
///
/// Buffers render as standard base64, timestamps as RFC 3339, enums as their
/// member name. Null has no string form.
pub(crate) fn string_form(value: &Value) -> Option<String> {
    Some(match value {
        Value::Boolean(v) => v.to_string(),
        Value::Int32(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Uint32(v) => v.to_string(),
        Value::Uint64(v) => v.to_string(),
        Value::Float32(v) => v.to_string(),
        Value::Float64(v) => v.to_string(),
        Value::String(s) => s.clone(),
        Value::Buffer(bytes) => STANDARD.encode(bytes),
        Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        Value::Enum(e) => e.member.clone(),
        Value::Null => return None,
    })
}

/// Coerce a non-null `value` into `target`.
pub(crate) fn coerce(target: PrimitiveType, value: Value, path: &Path) -> Result<Value, Error> {
    match target {
        PrimitiveType::Boolean => to_boolean(value, path),
        PrimitiveType::Int32
        | PrimitiveType::Int64
        | PrimitiveType::Uint32
        | PrimitiveType::Uint64 => to_integer(target, value, path),
        PrimitiveType::Float32 | PrimitiveType::Float64 => to_float(target, value, path),
        PrimitiveType::String => to_string(value, path),
        PrimitiveType::Buffer => to_buffer(value, path),
        PrimitiveType::Timestamp => to_timestamp(value, path),
        PrimitiveType::SymbolMap => Err(mismatch(target, &value, path)),
        PrimitiveType::Value => Ok(value),
    }
}

fn mismatch(target: PrimitiveType, value: &Value, path: &Path) -> Error {
    Error::TypeMismatch {
        expected: target.name().to_string(),
        actual: describe(value),
        path: path.clone(),
    }
}

fn out_of_range(target: PrimitiveType, value: &Value, path: &Path) -> Error {
    Error::OutOfRange {
        value: value.to_string(),
        target: target.name().to_string(),
        path: path.clone(),
    }
}

fn to_boolean(value: Value, path: &Path) -> Result<Value, Error> {
    match value {
        Value::Boolean(v) => Ok(Value::Boolean(v)),
        Value::String(ref s) if s.eq_ignore_ascii_case("true") => Ok(Value::Boolean(true)),
        Value::String(ref s) if s.eq_ignore_ascii_case("false") => Ok(Value::Boolean(false)),
        other => Err(mismatch(PrimitiveType::Boolean, &other, path)),
    }
}

/// Truncate toward zero. Non-finite input has no integer value.
fn truncate(v: f64) -> Option<i128> {
    // `as` saturates, so anything beyond i128 fails the target conversion below
    v.is_finite().then(|| v.trunc() as i128)
}

fn to_integer(target: PrimitiveType, value: Value, path: &Path) -> Result<Value, Error> {
    let wide = match &value {
        Value::Float32(v) => truncate(f64::from(*v)),
        Value::Float64(v) => truncate(*v),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i128>() {
                Ok(v) => Some(v),
                // "12.7" is a decimal-looking integer: parse as float, then truncate
                Err(_) => match s.parse::<f64>() {
                    Ok(v) => truncate(v),
                    Err(_) => return Err(mismatch(target, &value, path)),
                },
            }
        }
        other => match other.as_i128() {
            Some(v) => Some(v),
            None => return Err(mismatch(target, &value, path)),
        },
    };
    let converted = wide.and_then(|wide| match target {
        PrimitiveType::Int32 => i32::try_from(wide).ok().map(Value::Int32),
        PrimitiveType::Int64 => i64::try_from(wide).ok().map(Value::Int64),
        PrimitiveType::Uint32 => u32::try_from(wide).ok().map(Value::Uint32),
        PrimitiveType::Uint64 => u64::try_from(wide).ok().map(Value::Uint64),
        _ => None,
    });
    converted.ok_or_else(|| out_of_range(target, &value, path))
}

fn to_float(target: PrimitiveType, value: Value, path: &Path) -> Result<Value, Error> {
    let wide = match &value {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| mismatch(target, &value, path))?,
        other => other
            .as_f64()
            .ok_or_else(|| mismatch(target, &value, path))?,
    };
    if target == PrimitiveType::Float64 {
        return Ok(Value::Float64(wide));
    }
    if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
        return Err(out_of_range(target, &value, path));
    }
    Ok(Value::Float32(wide as f32))
}

fn to_string(value: Value, path: &Path) -> Result<Value, Error> {
    match value {
        Value::String(s) => Ok(Value::String(s)),
        other => string_form(&other)
            .map(Value::String)
            .ok_or_else(|| mismatch(PrimitiveType::String, &other, path)),
    }
}

fn to_buffer(value: Value, path: &Path) -> Result<Value, Error> {
    match value {
        Value::Buffer(bytes) => Ok(Value::Buffer(bytes)),
        Value::String(ref s) => STANDARD
            .decode(s.as_bytes())
            .map(Value::Buffer)
            .map_err(|_| mismatch(PrimitiveType::Buffer, &value, path)),
        other => Err(mismatch(PrimitiveType::Buffer, &other, path)),
    }
}

fn to_timestamp(value: Value, path: &Path) -> Result<Value, Error> {
    match value {
        Value::Timestamp(ts) => Ok(Value::Timestamp(ts)),
        Value::String(ref s) => DateTime::parse_from_rfc3339(s)
            .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
            .map_err(|_| mismatch(PrimitiveType::Timestamp, &value, path)),
        other => Err(mismatch(PrimitiveType::Timestamp, &other, path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ok(target: PrimitiveType, value: impl Into<Value>) -> Value {
        coerce(target, value.into(), &Path::new()).unwrap()
    }

    fn err(target: PrimitiveType, value: impl Into<Value>) -> Error {
        coerce(target, value.into(), &Path::new()).unwrap_err()
    }

    #[test]
    fn test_booleans() {
        weft_testhelpers::setup();

        assert_eq!(ok(PrimitiveType::Boolean, "TRUE"), Value::Boolean(true));
        assert_eq!(ok(PrimitiveType::Boolean, "false"), Value::Boolean(false));
        assert!(matches!(
            err(PrimitiveType::Boolean, 1),
            Error::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_integers() {
        weft_testhelpers::setup();

        assert_eq!(ok(PrimitiveType::Int32, 5i64), Value::Int32(5));
        assert_eq!(ok(PrimitiveType::Int64, "42"), Value::Int64(42));
        assert_eq!(ok(PrimitiveType::Int32, "12.9"), Value::Int32(12));
        assert_eq!(ok(PrimitiveType::Int32, -3.7f64), Value::Int32(-3));
        assert_eq!(ok(PrimitiveType::Uint64, 7u32), Value::Uint64(7));
    }

    #[test]
    fn test_integers_out_of_range() {
        weft_testhelpers::setup();

        assert!(matches!(
            err(PrimitiveType::Uint32, -1),
            Error::OutOfRange { .. }
        ));
        assert!(matches!(
            err(PrimitiveType::Int32, i64::MAX),
            Error::OutOfRange { .. }
        ));
        assert!(matches!(
            err(PrimitiveType::Int64, f64::NAN),
            Error::OutOfRange { .. }
        ));
        assert!(matches!(
            err(PrimitiveType::Int32, "twelve"),
            Error::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_floats() {
        weft_testhelpers::setup();

        assert_eq!(ok(PrimitiveType::Float64, 3), Value::Float64(3.0));
        assert_eq!(ok(PrimitiveType::Float32, "1.5"), Value::Float32(1.5));
        assert!(matches!(
            err(PrimitiveType::Float32, 1e300),
            Error::OutOfRange { .. }
        ));
    }

    #[test]
    fn test_strings() {
        weft_testhelpers::setup();

        assert_eq!(ok(PrimitiveType::String, 12), Value::from("12"));
        assert_eq!(ok(PrimitiveType::String, true), Value::from("true"));
        assert_eq!(
            ok(PrimitiveType::String, vec![1u8, 2, 3]),
            Value::from("AQID")
        );
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            ok(PrimitiveType::String, ts),
            Value::from("2024-05-01T12:00:00Z")
        );
    }

    #[test]
    fn test_buffers_and_timestamps_from_strings() {
        weft_testhelpers::setup();

        assert_eq!(
            ok(PrimitiveType::Buffer, "AQID"),
            Value::Buffer(vec![1, 2, 3])
        );
        assert!(matches!(
            err(PrimitiveType::Buffer, "not base64!"),
            Error::TypeMismatch { .. }
        ));
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(
            ok(PrimitiveType::Timestamp, "2024-05-01T12:00:00+02:00"),
            Value::Timestamp(ts)
        );
    }

    #[test]
    fn test_symbol_map_rejects_leaves() {
        weft_testhelpers::setup();

        assert!(matches!(
            err(PrimitiveType::SymbolMap, "x"),
            Error::TypeMismatch { .. }
        ));
        assert_eq!(ok(PrimitiveType::Value, 9u64), Value::Uint64(9));
    }
}
