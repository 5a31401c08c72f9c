use core::fmt;

use weft_path::Path;

use crate::Value;

/// What an [`Event`] says about the value tree.
#[derive(Clone, PartialEq)]
pub enum EventKind {
    /// A complete leaf value.
    Value(Value),
    /// Beginning of a struct of the named type.
    StructStart(String),
    /// Beginning of an open, string-keyed map.
    MapStart,
    /// Name of the next field; exactly one value follows.
    FieldStart(String),
    /// Beginning of a list.
    ListStart,
    /// Closes the innermost open struct, map or list.
    End,
}

impl EventKind {
    /// Whether this event opens a container.
    pub const fn is_start(&self) -> bool {
        matches!(
            self,
            EventKind::StructStart(_) | EventKind::MapStart | EventKind::ListStart
        )
    }

    /// Whether this event closes a container.
    pub const fn is_end(&self) -> bool {
        matches!(self, EventKind::End)
    }

    /// Short description used as the "actual" side of type mismatches.
    pub fn describe(&self) -> String {
        match self {
            EventKind::Value(value) => format!("{} {value}", value.type_name()),
            EventKind::StructStart(name) => format!("struct {name}"),
            EventKind::MapStart => "map".to_string(),
            EventKind::FieldStart(name) => format!("field `{name}`"),
            EventKind::ListStart => "list".to_string(),
            EventKind::End => "end".to_string(),
        }
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Value(value) => f.debug_tuple("Value").field(value).finish(),
            EventKind::StructStart(name) => f.debug_tuple("StructStart").field(name).finish(),
            EventKind::MapStart => f.write_str("MapStart"),
            EventKind::FieldStart(name) => f.debug_tuple("FieldStart").field(name).finish(),
            EventKind::ListStart => f.write_str("ListStart"),
            EventKind::End => f.write_str("End"),
        }
    }
}

/// One node of a streamed value tree, optionally stamped with its path.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// What happened
    pub kind: EventKind,
    /// Where it happened, if a path-setting stage has run
    pub path: Option<Path>,
}

impl Event {
    /// An event without a path.
    pub const fn new(kind: EventKind) -> Self {
        Self { kind, path: None }
    }

    /// A leaf value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::new(EventKind::Value(value.into()))
    }

    /// A null leaf.
    pub const fn null() -> Self {
        Self::new(EventKind::Value(Value::Null))
    }

    /// Start of a struct of type `type_name`.
    pub fn struct_start(type_name: impl Into<String>) -> Self {
        Self::new(EventKind::StructStart(type_name.into()))
    }

    /// Start of an open map.
    pub const fn map_start() -> Self {
        Self::new(EventKind::MapStart)
    }

    /// A field name.
    pub fn field_start(name: impl Into<String>) -> Self {
        Self::new(EventKind::FieldStart(name.into()))
    }

    /// Start of a list.
    pub const fn list_start() -> Self {
        Self::new(EventKind::ListStart)
    }

    /// End of the innermost container.
    pub const fn end() -> Self {
        Self::new(EventKind::End)
    }

    /// Attach a path.
    pub fn with_path(mut self, path: Path) -> Self {
        self.path = Some(path);
        self
    }

    /// This event's path, or the root path when none was set.
    pub fn path_or_root(&self) -> Path {
        self.path.clone().unwrap_or_default()
    }

    /// Drop the path, leaving only the structural content.
    pub fn without_path(mut self) -> Self {
        self.path = None;
        self
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}
