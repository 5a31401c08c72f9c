use core::cmp::Ordering;
use core::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// Built-in atomic types that resolve without a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `true` / `false`
    Boolean,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 32-bit integer
    Uint32,
    /// Unsigned 64-bit integer
    Uint64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// UTF-8 string
    String,
    /// Raw bytes
    Buffer,
    /// UTC instant
    Timestamp,
    /// Open, string-keyed map of arbitrary values
    SymbolMap,
    /// Accepts any value
    Value,
}

impl PrimitiveType {
    /// Every primitive, in declaration order.
    pub const ALL: [PrimitiveType; 12] = [
        PrimitiveType::Boolean,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::Uint32,
        PrimitiveType::Uint64,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::String,
        PrimitiveType::Buffer,
        PrimitiveType::Timestamp,
        PrimitiveType::SymbolMap,
        PrimitiveType::Value,
    ];

    /// The qualified name this primitive is referenced by.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::Int32 => "Int32",
            PrimitiveType::Int64 => "Int64",
            PrimitiveType::Uint32 => "Uint32",
            PrimitiveType::Uint64 => "Uint64",
            PrimitiveType::Float32 => "Float32",
            PrimitiveType::Float64 => "Float64",
            PrimitiveType::String => "String",
            PrimitiveType::Buffer => "Buffer",
            PrimitiveType::Timestamp => "Timestamp",
            PrimitiveType::SymbolMap => "SymbolMap",
            PrimitiveType::Value => "Value",
        }
    }

    /// Look a primitive up by its qualified name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Whether this is one of the four integer types.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveType::Int32 | PrimitiveType::Int64 | PrimitiveType::Uint32 | PrimitiveType::Uint64
        )
    }

    /// Whether this is an integer or floating-point type.
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, PrimitiveType::Float32 | PrimitiveType::Float64)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A member of a registered enum type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Qualified name of the enum type
    pub type_name: String,
    /// Member identifier
    pub member: String,
}

impl EnumValue {
    /// Create an enum value.
    pub fn new(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            member: member.into(),
        }
    }
}

/// A leaf value carried by [`crate::EventKind::Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean
    Boolean(bool),
    /// Signed 32-bit integer
    Int32(i32),
    /// Signed 64-bit integer
    Int64(i64),
    /// Unsigned 32-bit integer
    Uint32(u32),
    /// Unsigned 64-bit integer
    Uint64(u64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Buffer(Vec<u8>),
    /// UTC instant
    Timestamp(DateTime<Utc>),
    /// Enum member
    Enum(EnumValue),
    /// Null
    Null,
}

impl Value {
    /// The qualified name of this value's own type.
    ///
    /// Enum values report their enum type; everything else reports a
    /// primitive name (`Null` for null).
    pub fn type_name(&self) -> &str {
        match self {
            Value::Enum(e) => e.type_name.as_str(),
            Value::Null => "Null",
            other => other.primitive().map(PrimitiveType::name).unwrap_or("Null"),
        }
    }

    /// The primitive type of this value, if it has one.
    pub fn primitive(&self) -> Option<PrimitiveType> {
        Some(match self {
            Value::Boolean(_) => PrimitiveType::Boolean,
            Value::Int32(_) => PrimitiveType::Int32,
            Value::Int64(_) => PrimitiveType::Int64,
            Value::Uint32(_) => PrimitiveType::Uint32,
            Value::Uint64(_) => PrimitiveType::Uint64,
            Value::Float32(_) => PrimitiveType::Float32,
            Value::Float64(_) => PrimitiveType::Float64,
            Value::String(_) => PrimitiveType::String,
            Value::Buffer(_) => PrimitiveType::Buffer,
            Value::Timestamp(_) => PrimitiveType::Timestamp,
            Value::Enum(_) | Value::Null => return None,
        })
    }

    /// Whether this is [`Value::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Widen an integer value to `i128`.
    pub const fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::Int32(v) => Some(v as i128),
            Value::Int64(v) => Some(v as i128),
            Value::Uint32(v) => Some(v as i128),
            Value::Uint64(v) => Some(v as i128),
            _ => None,
        }
    }

    /// Widen any numeric value to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int32(v) => Some(v as f64),
            Value::Int64(v) => Some(v as f64),
            Value::Uint32(v) => Some(v as f64),
            Value::Uint64(v) => Some(v as f64),
            Value::Float32(v) => Some(v as f64),
            Value::Float64(v) => Some(v),
            _ => None,
        }
    }

    /// Order two values for range checks.
    ///
    /// Integers compare exactly, mixed integer/float pairs compare as `f64`,
    /// strings compare lexically and timestamps chronologically. Returns
    /// `None` for pairs without a meaningful order.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_i128(), other.as_i128()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Uint32(v) => write!(f, "{v}"),
            Value::Uint64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Buffer(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Enum(e) => write!(f, "{}.{}", e.type_name, e.member),
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Buffer(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Value::Enum(v)
    }
}
