#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

use core::fmt::{self, Write};

/// A single step in a path through a value tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathStep {
    /// Navigate to a struct or map field by name
    Field(String),
    /// Navigate to a list element by index
    Index(u32),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Field(name) => f.write_str(name),
            PathStep::Index(idx) => write!(f, "[{idx}]"),
        }
    }
}

/// A path from the document root, recorded as a series of steps.
///
/// The empty path designates the root value itself and is rendered as
/// `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    /// The sequence of [`PathStep`]s from the root.
    pub steps: Vec<PathStep>,
}

impl Path {
    /// Create a new empty path.
    pub const fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Create a path with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
        }
    }

    /// Push a step onto the path.
    pub fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }

    /// Pop the last step from the path.
    pub fn pop(&mut self) -> Option<PathStep> {
        self.steps.pop()
    }

    /// Get the steps in this path.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Get the length of this path.
    pub const fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if this path is empty.
    pub const fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The last step, if any.
    pub fn last(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// Return a copy of this path extended with a field step.
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.push(PathStep::Field(name.into()));
        child
    }

    /// Return a copy of this path extended with a list index step.
    pub fn index(&self, idx: u32) -> Self {
        let mut child = self.clone();
        child.push(PathStep::Index(idx));
        child
    }

    /// Format this path as a human-readable string.
    ///
    /// Returns a path like `outer.inner.items[3].name`.
    pub fn format(&self) -> String {
        let mut result = String::new();

        for step in &self.steps {
            match step {
                PathStep::Field(name) => {
                    if !result.is_empty() {
                        result.push('.');
                    }
                    result.push_str(name);
                }
                PathStep::Index(idx) => {
                    // Writing into a String cannot fail.
                    let _ = write!(result, "[{idx}]");
                }
            }
        }

        if result.is_empty() {
            result.push_str("<root>");
        }

        result
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromIterator<PathStep> for Path {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<PathStep>> for Path {
    fn from(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_roundtrip() {
        weft_testhelpers::setup();

        let mut path = Path::new();
        path.push(PathStep::Field("a".into()));
        path.push(PathStep::Index(2));
        assert_eq!(path.len(), 2);
        assert_eq!(path.pop(), Some(PathStep::Index(2)));
        assert_eq!(path.last(), Some(&PathStep::Field("a".into())));
    }

    #[test]
    fn test_child_helpers_leave_parent_untouched() {
        weft_testhelpers::setup();

        let parent = Path::new().field("items");
        let child = parent.index(4);
        assert_eq!(parent.len(), 1);
        assert_eq!(child.format(), "items[4]");
    }
}
