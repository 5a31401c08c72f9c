use core::cmp::Ordering;
use core::fmt;

use crate::{PrimitiveType, Value};

/// A post-coercion predicate attached to an atomic type.
#[derive(Debug, Clone, PartialEq)]
pub enum Restriction {
    /// The string form of the value must match this regular expression.
    Regex {
        /// Pattern in `regex` crate syntax
        pattern: String,
    },
    /// The value must fall inside an ordered range.
    Range(RangeRestriction),
}

impl Restriction {
    /// A regular expression restriction.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Restriction::Regex {
            pattern: pattern.into(),
        }
    }

    /// A range including both bounds, `[min,max]`.
    pub fn closed_range(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Restriction::Range(RangeRestriction {
            min: Some(min.into()),
            min_closed: true,
            max: Some(max.into()),
            max_closed: true,
        })
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::Regex { pattern } => write!(f, "{pattern:?}"),
            Restriction::Range(range) => fmt::Display::fmt(range, f),
        }
    }
}

/// An ordered range. A missing bound is unbounded on that side.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRestriction {
    /// Lower bound
    pub min: Option<Value>,
    /// Whether `min` itself is allowed
    pub min_closed: bool,
    /// Upper bound
    pub max: Option<Value>,
    /// Whether `max` itself is allowed
    pub max_closed: bool,
}

impl RangeRestriction {
    /// Check `value` against this range.
    ///
    /// Returns `None` when the value cannot be ordered against a bound (for
    /// example a string checked against numeric bounds).
    pub fn contains(&self, value: &Value) -> Option<bool> {
        if let Some(min) = &self.min {
            let ok = match value.compare(min)? {
                Ordering::Greater => true,
                Ordering::Equal => self.min_closed,
                Ordering::Less => false,
            };
            if !ok {
                return Some(false);
            }
        }
        if let Some(max) = &self.max {
            let ok = match value.compare(max)? {
                Ordering::Less => true,
                Ordering::Equal => self.max_closed,
                Ordering::Greater => false,
            };
            if !ok {
                return Some(false);
            }
        }
        Some(true)
    }
}

impl fmt::Display for RangeRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.min_closed { "[" } else { "(" })?;
        if let Some(min) = &self.min {
            write!(f, "{min}")?;
        }
        f.write_str(",")?;
        if let Some(max) = &self.max {
            write!(f, "{max}")?;
        }
        f.write_str(if self.max_closed { "]" } else { ")" })
    }
}

/// The declared shape a value is expected to have.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeReference {
    /// A named type: a primitive or anything in the registry.
    Atomic {
        /// Qualified type name
        name: String,
        /// Optional post-coercion restriction
        restriction: Option<Restriction>,
    },
    /// A homogeneous list.
    List {
        /// Element type
        element: Box<TypeReference>,
        /// Whether a list with no elements is acceptable
        allows_empty: bool,
    },
    /// The inner type, or null.
    Nullable(Box<TypeReference>),
    /// A reference to the inner type; transparent for casting.
    Pointer(Box<TypeReference>),
}

impl TypeReference {
    /// An unrestricted named type.
    pub fn atomic(name: impl Into<String>) -> Self {
        TypeReference::Atomic {
            name: name.into(),
            restriction: None,
        }
    }

    /// A named type carrying a restriction.
    pub fn restricted(name: impl Into<String>, restriction: Restriction) -> Self {
        TypeReference::Atomic {
            name: name.into(),
            restriction: Some(restriction),
        }
    }

    /// A primitive type.
    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self::atomic(primitive.name())
    }

    /// A list that may be empty.
    pub fn list(element: TypeReference) -> Self {
        TypeReference::List {
            element: Box::new(element),
            allows_empty: true,
        }
    }

    /// A list that must contain at least one element.
    pub fn non_empty_list(element: TypeReference) -> Self {
        TypeReference::List {
            element: Box::new(element),
            allows_empty: false,
        }
    }

    /// Wrap `inner` so that null is accepted.
    pub fn nullable(inner: TypeReference) -> Self {
        TypeReference::Nullable(Box::new(inner))
    }

    /// Wrap `inner` in a pointer.
    pub fn pointer(inner: TypeReference) -> Self {
        TypeReference::Pointer(Box::new(inner))
    }

    /// `Value?`: anything, including null. Used for fields of open maps.
    pub fn any() -> Self {
        Self::nullable(Self::primitive(PrimitiveType::Value))
    }

    /// Strip Pointer/Nullable wrappers.
    ///
    /// Returns the effective type and whether any Nullable layer was crossed
    /// on the way down.
    pub fn resolve_wrappers(&self) -> (&TypeReference, bool) {
        let mut current = self;
        let mut nullable = false;
        loop {
            match current {
                TypeReference::Nullable(inner) => {
                    nullable = true;
                    current = inner.as_ref();
                }
                TypeReference::Pointer(inner) => current = inner.as_ref(),
                other => return (other, nullable),
            }
        }
    }

    /// Whether null is an acceptable value for this type.
    pub fn is_nullable(&self) -> bool {
        self.resolve_wrappers().1
    }

    /// The name of the atomic type under any wrappers, if there is one.
    pub fn atomic_name(&self) -> Option<&str> {
        match self.resolve_wrappers().0 {
            TypeReference::Atomic { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeReference::Atomic { name, restriction } => {
                f.write_str(name)?;
                if let Some(restriction) = restriction {
                    write!(f, "~{restriction}")?;
                }
                Ok(())
            }
            TypeReference::List {
                element,
                allows_empty,
            } => write!(f, "{element}{}", if *allows_empty { "[]" } else { "*" }),
            TypeReference::Nullable(inner) => write!(f, "{inner}?"),
            TypeReference::Pointer(inner) => write!(f, "&{inner}"),
        }
    }
}
