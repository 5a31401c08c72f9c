//! Owned documents and their conversion to and from event streams.

use indexmap::IndexMap;
use weft_path::{Path, PathStep};

use crate::{Error, Event, EventKind, EventSink, Value};

/// A complete value, owned in memory.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTree {
    /// A leaf
    Value(Value),
    /// A struct of a named type
    Struct {
        /// Qualified type name
        type_name: String,
        /// Fields in stream order
        fields: IndexMap<String, ValueTree>,
    },
    /// An open map
    Map(IndexMap<String, ValueTree>),
    /// A list
    List(Vec<ValueTree>),
}

impl ValueTree {
    /// A struct built from `(name, value)` pairs.
    pub fn structure<I, K, V>(type_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ValueTree>,
    {
        ValueTree::Struct {
            type_name: type_name.into(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// A map built from `(name, value)` pairs.
    pub fn map<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ValueTree>,
    {
        ValueTree::Map(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// A list built from items.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ValueTree>,
    {
        ValueTree::List(items.into_iter().map(Into::into).collect())
    }

    /// The null leaf.
    pub const fn null() -> Self {
        ValueTree::Value(Value::Null)
    }

    /// Look up a field of a struct or map.
    pub fn get(&self, field: &str) -> Option<&ValueTree> {
        match self {
            ValueTree::Struct { fields, .. } | ValueTree::Map(fields) => fields.get(field),
            _ => None,
        }
    }

    /// The leaf value, if this is one.
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            ValueTree::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Feed this tree into `sink` as a well-formed event stream whose events
    /// carry paths relative to the root.
    pub fn feed(&self, sink: &mut dyn EventSink) -> Result<(), Error> {
        self.feed_at(&mut Path::new(), sink)
    }

    /// Like [`ValueTree::feed`], with paths continuing from `base`.
    pub fn feed_from(&self, base: &Path, sink: &mut dyn EventSink) -> Result<(), Error> {
        self.feed_at(&mut base.clone(), sink)
    }

    fn feed_at(&self, path: &mut Path, sink: &mut dyn EventSink) -> Result<(), Error> {
        match self {
            ValueTree::Value(v) => sink.accept(Event::value(v.clone()).with_path(path.clone())),
            ValueTree::Struct { type_name, fields } => {
                sink.accept(Event::struct_start(type_name.as_str()).with_path(path.clone()))?;
                feed_fields(fields, path, sink)?;
                sink.accept(Event::end().with_path(path.clone()))
            }
            ValueTree::Map(fields) => {
                sink.accept(Event::map_start().with_path(path.clone()))?;
                feed_fields(fields, path, sink)?;
                sink.accept(Event::end().with_path(path.clone()))
            }
            ValueTree::List(items) => {
                sink.accept(Event::list_start().with_path(path.clone()))?;
                for (idx, item) in items.iter().enumerate() {
                    path.push(PathStep::Index(idx as u32));
                    let res = item.feed_at(path, sink);
                    path.pop();
                    res?;
                }
                sink.accept(Event::end().with_path(path.clone()))
            }
        }
    }

    /// Collect this tree's event stream.
    pub fn events(&self) -> Vec<Event> {
        let mut events = Vec::new();
        // Recording into a Vec never fails.
        let _ = self.feed(&mut events);
        events
    }
}

fn feed_fields(
    fields: &IndexMap<String, ValueTree>,
    path: &mut Path,
    sink: &mut dyn EventSink,
) -> Result<(), Error> {
    for (name, value) in fields {
        path.push(PathStep::Field(name.clone()));
        let res = sink
            .accept(Event::field_start(name.as_str()).with_path(path.clone()))
            .and_then(|()| value.feed_at(path, sink));
        path.pop();
        res?;
    }
    Ok(())
}

macro_rules! leaf_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ValueTree {
                fn from(v: $ty) -> Self {
                    ValueTree::Value(v.into())
                }
            }
        )*
    };
}

leaf_from!(
    Value,
    bool,
    i32,
    i64,
    u32,
    u64,
    f32,
    f64,
    &str,
    String,
    Vec<u8>,
    chrono::DateTime<chrono::Utc>,
    crate::EnumValue,
);

enum Partial {
    Struct {
        type_name: String,
        fields: IndexMap<String, ValueTree>,
        pending: Option<String>,
    },
    Map {
        fields: IndexMap<String, ValueTree>,
        pending: Option<String>,
    },
    List(Vec<ValueTree>),
}

/// A sink that rebuilds a [`ValueTree`] from a well-formed event stream.
#[derive(Default)]
pub struct TreeBuilder {
    stack: Vec<Partial>,
    root: Option<ValueTree>,
}

impl TreeBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished tree.
    ///
    /// Fails if the stream ended before its root value closed.
    pub fn finish(self) -> Result<ValueTree, Error> {
        match (self.root, self.stack.is_empty()) {
            (Some(root), true) => Ok(root),
            _ => Err(Error::not_well_formed("incomplete document", Path::new())),
        }
    }

    fn attach(&mut self, tree: ValueTree, event: &Event) -> Result<(), Error> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(Error::not_well_formed(
                        "more than one root value",
                        event.path_or_root(),
                    ));
                }
                self.root = Some(tree);
                Ok(())
            }
            Some(Partial::List(items)) => {
                items.push(tree);
                Ok(())
            }
            Some(Partial::Struct {
                fields, pending, ..
            })
            | Some(Partial::Map { fields, pending }) => match pending.take() {
                Some(name) => {
                    fields.insert(name, tree);
                    Ok(())
                }
                None => Err(Error::not_well_formed(
                    "value without a field name",
                    event.path_or_root(),
                )),
            },
        }
    }
}

impl EventSink for TreeBuilder {
    fn accept(&mut self, event: Event) -> Result<(), Error> {
        match &event.kind {
            EventKind::Value(v) => self.attach(ValueTree::Value(v.clone()), &event),
            EventKind::StructStart(type_name) => {
                self.stack.push(Partial::Struct {
                    type_name: type_name.clone(),
                    fields: IndexMap::new(),
                    pending: None,
                });
                Ok(())
            }
            EventKind::MapStart => {
                self.stack.push(Partial::Map {
                    fields: IndexMap::new(),
                    pending: None,
                });
                Ok(())
            }
            EventKind::ListStart => {
                self.stack.push(Partial::List(Vec::new()));
                Ok(())
            }
            EventKind::FieldStart(name) => match self.stack.last_mut() {
                Some(Partial::Struct { pending, .. }) | Some(Partial::Map { pending, .. }) => {
                    *pending = Some(name.clone());
                    Ok(())
                }
                _ => Err(Error::not_well_formed(
                    "field name outside a struct or map",
                    event.path_or_root(),
                )),
            },
            EventKind::End => {
                let tree = match self.stack.pop() {
                    Some(Partial::Struct {
                        type_name, fields, ..
                    }) => ValueTree::Struct { type_name, fields },
                    Some(Partial::Map { fields, .. }) => ValueTree::Map(fields),
                    Some(Partial::List(items)) => ValueTree::List(items),
                    None => {
                        return Err(Error::not_well_formed(
                            "unbalanced end",
                            event.path_or_root(),
                        ));
                    }
                };
                self.attach(tree, &event)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValueTree {
        ValueTree::structure(
            "demo.Order",
            [
                ("id", ValueTree::from(7)),
                (
                    "tags",
                    ValueTree::list(["a", "b"]),
                ),
                ("meta", ValueTree::map([("note", ValueTree::null())])),
            ],
        )
    }

    #[test]
    fn test_feed_then_build_is_identity() {
        weft_testhelpers::setup();

        let tree = sample();
        let mut builder = TreeBuilder::new();
        tree.feed(&mut builder).unwrap();
        assert_eq!(builder.finish().unwrap(), tree);
    }

    #[test]
    fn test_feed_stamps_paths() {
        weft_testhelpers::setup();

        let events = sample().events();
        let paths: Vec<String> = events
            .iter()
            .map(|e| e.path.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "<root>", "id", "id", "tags", "tags", "tags[0]", "tags[1]", "tags", "meta",
                "meta", "meta.note", "meta.note", "meta", "<root>",
            ]
        );
    }

    #[test]
    fn test_incomplete_document() {
        weft_testhelpers::setup();

        let mut builder = TreeBuilder::new();
        builder.accept(Event::list_start()).unwrap();
        assert!(builder.finish().is_err());
    }
}
