//! The error type shared by every weft processor.

use core::fmt;

use weft_path::Path;

/// Errors raised while feeding events through a pipeline.
///
/// Cast errors carry the [`Path`] of the offending event; wire decode errors
/// carry the byte offset at which the bad input began.
#[derive(Debug)]
pub enum Error {
    /// A value or container does not have the expected shape.
    TypeMismatch {
        /// External form of the expected type
        expected: String,
        /// What was found instead
        actual: String,
        /// Where it was found
        path: Path,
    },
    /// A coerced value failed its type's restriction.
    RestrictionViolation {
        /// The offending value
        value: String,
        /// External form of the restriction
        restriction: String,
        /// Where it was found
        path: Path,
    },
    /// Null was supplied for a type without a Nullable wrapper.
    NullNotAllowed {
        /// External form of the expected type
        expected: String,
        /// Where it was found
        path: Path,
    },
    /// A struct closed while required fields were still missing.
    MissingFields {
        /// The unsatisfied field names, sorted
        fields: Vec<String>,
        /// Path of the struct
        path: Path,
    },
    /// A struct received a field its definition does not declare.
    UnrecognizedField {
        /// The field name
        field: String,
        /// The struct type that rejected it
        type_name: String,
        /// Where it was found
        path: Path,
    },
    /// A string or enum value is not a member of the target enum.
    IllegalEnumValue {
        /// The offending member name
        value: String,
        /// The target enum type
        enum_type: String,
        /// Where it was found
        path: Path,
    },
    /// The event stream or a value inside it is structurally invalid.
    NotWellFormed {
        /// What was wrong, e.g. `empty list` or `not a struct type`
        kind: String,
        /// Where it was found
        path: Path,
    },
    /// A numeric value does not fit the target type.
    OutOfRange {
        /// The offending value
        value: String,
        /// The target type
        target: String,
        /// Where it was found
        path: Path,
    },
    /// A type name resolved neither to a primitive nor to a registry entry.
    UnknownType {
        /// The unresolved name
        name: String,
        /// Where it was referenced
        path: Path,
    },
    /// A type was registered twice.
    DuplicateType {
        /// The duplicated name
        name: String,
    },
    /// The binary decoder met bytes it could not interpret.
    WireDecode {
        /// Byte offset at which the bad input began
        offset: u64,
        /// Human-readable detail
        detail: String,
    },
    /// The binary encoder was handed an event stream it cannot write.
    WireEncode {
        /// Human-readable detail
        detail: String,
    },
    /// Underlying reader or writer failed.
    Io(std::io::Error),
    /// An internal invariant was broken: a corrupted frame stack or an
    /// inconsistent registry. Not meant to be recovered from.
    Internal(String),
}

/// Coarse classification used for diagnostics.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(not(feature = "miette"), allow(dead_code))]
enum Kind {
    Cast,
    Registry,
    Wire,
    Internal,
}

impl Error {
    /// Shorthand for [`Error::NotWellFormed`].
    pub fn not_well_formed(kind: impl Into<String>, path: Path) -> Self {
        Error::NotWellFormed {
            kind: kind.into(),
            path,
        }
    }

    /// Shorthand for [`Error::WireDecode`].
    pub fn wire_decode(offset: u64, detail: impl Into<String>) -> Self {
        Error::WireDecode {
            offset,
            detail: detail.into(),
        }
    }

    /// The logical path of the fault, for errors that have one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::TypeMismatch { path, .. }
            | Error::RestrictionViolation { path, .. }
            | Error::NullNotAllowed { path, .. }
            | Error::MissingFields { path, .. }
            | Error::UnrecognizedField { path, .. }
            | Error::IllegalEnumValue { path, .. }
            | Error::NotWellFormed { path, .. }
            | Error::OutOfRange { path, .. }
            | Error::UnknownType { path, .. } => Some(path),
            Error::DuplicateType { .. }
            | Error::WireDecode { .. }
            | Error::WireEncode { .. }
            | Error::Io(_)
            | Error::Internal(_) => None,
        }
    }

    /// The byte offset of a wire decode fault.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::WireDecode { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// A stable identifier for this kind of error, e.g. `weft::cast::type_mismatch`.
    pub fn code(&self) -> &'static str {
        match self {
            Error::TypeMismatch { .. } => "weft::cast::type_mismatch",
            Error::RestrictionViolation { .. } => "weft::cast::restriction_violation",
            Error::NullNotAllowed { .. } => "weft::cast::null_not_allowed",
            Error::MissingFields { .. } => "weft::cast::missing_fields",
            Error::UnrecognizedField { .. } => "weft::cast::unrecognized_field",
            Error::IllegalEnumValue { .. } => "weft::cast::illegal_enum_value",
            Error::NotWellFormed { .. } => "weft::cast::not_well_formed",
            Error::OutOfRange { .. } => "weft::cast::out_of_range",
            Error::UnknownType { .. } => "weft::registry::unknown_type",
            Error::DuplicateType { .. } => "weft::registry::duplicate_type",
            Error::WireDecode { .. } => "weft::wire::decode",
            Error::WireEncode { .. } => "weft::wire::encode",
            Error::Io(_) => "weft::wire::io",
            Error::Internal(_) => "weft::internal",
        }
    }

    #[cfg_attr(not(feature = "miette"), allow(dead_code))]
    const fn kind(&self) -> Kind {
        match self {
            Error::UnknownType { .. } | Error::DuplicateType { .. } => Kind::Registry,
            Error::WireDecode { .. } | Error::WireEncode { .. } | Error::Io(_) => Kind::Wire,
            Error::Internal(_) => Kind::Internal,
            _ => Kind::Cast,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch {
                expected,
                actual,
                path,
            } => write!(f, "type mismatch at {path}: expected {expected}, got {actual}"),
            Error::RestrictionViolation {
                value,
                restriction,
                path,
            } => write!(f, "value {value} at {path} violates restriction {restriction}"),
            Error::NullNotAllowed { expected, path } => {
                write!(f, "null is not allowed at {path} (expected {expected})")
            }
            Error::MissingFields { fields, path } => {
                write!(f, "missing required fields at {path}: {}", fields.join(", "))
            }
            Error::UnrecognizedField {
                field,
                type_name,
                path,
            } => write!(f, "unrecognized field `{field}` for {type_name} at {path}"),
            Error::IllegalEnumValue {
                value,
                enum_type,
                path,
            } => write!(f, "illegal enum value `{value}` for {enum_type} at {path}"),
            Error::NotWellFormed { kind, path } => write!(f, "not well formed at {path}: {kind}"),
            Error::OutOfRange {
                value,
                target,
                path,
            } => write!(f, "value {value} at {path} is out of range for {target}"),
            Error::UnknownType { name, path } => write!(f, "unknown type `{name}` at {path}"),
            Error::DuplicateType { name } => write!(f, "type `{name}` is already registered"),
            Error::WireDecode { offset, detail } => {
                write!(f, "wire decode error at offset {offset}: {detail}")
            }
            Error::WireEncode { detail } => write!(f, "wire encode error: {detail}"),
            Error::Io(err) => write!(f, "IO error: {err}"),
            Error::Internal(detail) => write!(f, "internal invariant broken: {detail}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

#[cfg(feature = "miette")]
impl miette::Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code()))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.kind() {
            Kind::Registry => "check that every referenced type is registered exactly once",
            Kind::Wire => return None,
            Kind::Internal => "this is a bug in weft or in the type registry",
            Kind::Cast => match self {
                Error::MissingFields { .. } => {
                    "supply the fields, declare defaults for them, or make them nullable"
                }
                _ => return None,
            },
        };
        Some(Box::new(help))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_path::PathStep;

    #[test]
    fn test_display_restriction_violation() {
        weft_testhelpers::setup();

        let err = Error::RestrictionViolation {
            value: "11".into(),
            restriction: "[0,10]".into(),
            path: Path::from(vec![PathStep::Field("count".into())]),
        };
        insta::assert_snapshot!(err.to_string(), @"value 11 at count violates restriction [0,10]");
    }

    #[test]
    fn test_display_wire_decode() {
        weft_testhelpers::setup();

        let err = Error::wire_decode(0, "expected struct type code");
        insta::assert_snapshot!(err.to_string(), @"wire decode error at offset 0: expected struct type code");
        assert_eq!(err.offset(), Some(0));
        assert!(err.path().is_none());
    }

    #[test]
    fn test_codes_are_namespaced() {
        weft_testhelpers::setup();

        let err = Error::MissingFields {
            fields: vec!["f1".into()],
            path: Path::new(),
        };
        assert_eq!(err.code(), "weft::cast::missing_fields");
        assert_eq!(err.to_string(), "missing required fields at <root>: f1");
    }
}
