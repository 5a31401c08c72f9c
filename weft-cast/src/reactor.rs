//! The stack-driven cast state machine.

use std::collections::BTreeSet;
use std::sync::Arc;

use weft_core::{
    DepthTracker, EnumDefinition, EnumValue, Error, Event, EventKind, EventProcessor, EventSink,
    Path, PathSetter, PrimitiveType, TypeDefinition, TypeReference, TypeRegistry,
    UnionDefinition, Value, ValueTree, WellFormedChecker, is_assignable,
};

use crate::CastOptions;
use crate::coerce::{coerce, describe};
use crate::restrict::RestrictionChecker;
use crate::typer::{DeclaredFields, FieldTyper, NarrowedFields, OpenFields};

/// Unions resolving to unions are followed at most this deep.
const MAX_UNION_NESTING: usize = 16;

/// An open struct or map being cast.
struct FieldSetFrame {
    awaiting: BTreeSet<String>,
    typer: Box<dyn FieldTyper>,
    path: Path,
}

impl FieldSetFrame {
    fn new(typer: Box<dyn FieldTyper>, path: Path) -> Self {
        let awaiting = typer.declared().iter().map(|f| f.name.clone()).collect();
        Self {
            awaiting,
            typer,
            path,
        }
    }

    /// Awaited fields that carry a default, in name order.
    fn pending_defaults(&self) -> Vec<(String, ValueTree)> {
        self.awaiting
            .iter()
            .filter_map(|name| {
                let field = self.typer.declared().iter().find(|f| &f.name == name)?;
                Some((name.clone(), field.default.clone()?))
            })
            .collect()
    }

    /// Awaited fields that cannot be left out.
    fn missing(&self) -> Vec<String> {
        self.awaiting
            .iter()
            .filter(|name| {
                !self
                    .typer
                    .field_type(name)
                    .is_some_and(|ty| ty.is_nullable())
            })
            .cloned()
            .collect()
    }
}

struct ListFrame {
    element: TypeReference,
    allows_empty: bool,
    saw_element: bool,
    path: Path,
}

enum Frame {
    /// The type the next value or container must have.
    Type(TypeReference),
    Fields(FieldSetFrame),
    List(ListFrame),
}

/// Casts an event stream to a target type, forwarding the repaired stream.
///
/// Expects well-formed, path-stamped input: its companions are a
/// [`WellFormedChecker`] and a [`PathSetter`].
pub struct CastReactor {
    registry: Arc<dyn TypeRegistry>,
    options: CastOptions,
    frames: Vec<Frame>,
    pass_through: Option<DepthTracker>,
    restrictions: RestrictionChecker,
}

impl CastReactor {
    /// A reactor expecting one value of type `target`.
    pub fn new(registry: Arc<dyn TypeRegistry>, target: TypeReference, options: CastOptions) -> Self {
        Self {
            registry,
            options,
            frames: vec![Frame::Type(target)],
            pass_through: None,
            restrictions: RestrictionChecker::default(),
        }
    }

    /// Whether the root value has been fully cast.
    pub fn is_done(&self) -> bool {
        self.frames.is_empty() && self.pass_through.is_none()
    }

    /// Take the type the next value or container must have.
    fn next_type(&mut self, path: &Path) -> Result<TypeReference, Error> {
        match self.frames.last_mut() {
            Some(Frame::Type(_)) => match self.frames.pop() {
                Some(Frame::Type(ty)) => Ok(ty),
                _ => Err(Error::Internal("type frame vanished".into())),
            },
            Some(Frame::List(list)) => {
                list.saw_element = true;
                Ok(list.element.clone())
            }
            Some(Frame::Fields(_)) => Err(Error::not_well_formed(
                "value without a field name",
                path.clone(),
            )),
            None => Err(Error::not_well_formed(
                "value after the root value closed",
                path.clone(),
            )),
        }
    }

    /// Open structs, maps and lists around the current position.
    fn container_depth(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| !matches!(f, Frame::Type(_)))
            .count()
    }

    fn match_union(
        &self,
        union: &UnionDefinition,
        incoming: &str,
        actual: &str,
        path: &Path,
        nesting: usize,
    ) -> Result<TypeReference, Error> {
        let registry: &dyn TypeRegistry = &*self.registry;
        let matched = if nesting >= MAX_UNION_NESTING {
            None
        } else {
            match self.options.union_matcher_for(&union.name) {
                Some(matcher) => matcher(union, incoming, registry),
                None => union.match_member(registry, incoming).cloned(),
            }
        };
        trace!(union = %union.name, incoming, matched = ?matched, "matched union member");
        matched.ok_or_else(|| Error::TypeMismatch {
            expected: union.name.clone(),
            actual: actual.to_string(),
            path: path.clone(),
        })
    }

    fn cast_value(
        &mut self,
        ty: &TypeReference,
        value: Value,
        path: &Path,
        nesting: usize,
    ) -> Result<Value, Error> {
        let (effective, nullable) = ty.resolve_wrappers();
        if value.is_null() {
            return if nullable {
                Ok(Value::Null)
            } else {
                Err(Error::NullNotAllowed {
                    expected: ty.to_string(),
                    path: path.clone(),
                })
            };
        }
        let TypeReference::Atomic { name, restriction } = effective else {
            return Err(mismatch(ty, describe(&value), path));
        };
        let cast = self.cast_atomic(ty, name, value, path, nesting)?;
        if let Some(restriction) = restriction {
            self.restrictions.check(restriction, &cast, path)?;
        }
        Ok(cast)
    }

    fn cast_atomic(
        &mut self,
        ty: &TypeReference,
        name: &str,
        value: Value,
        path: &Path,
        nesting: usize,
    ) -> Result<Value, Error> {
        if let Some(primitive) = PrimitiveType::from_name(name) {
            return coerce(primitive, value, path);
        }
        let registry = Arc::clone(&self.registry);
        match registry.lookup(name) {
            Some(TypeDefinition::Struct(def)) => {
                if def.constructor_types.iter().any(|c| c == value.type_name()) {
                    Ok(value)
                } else {
                    Err(mismatch(ty, describe(&value), path))
                }
            }
            Some(TypeDefinition::Enum(def)) => cast_enum(def, value, path),
            Some(TypeDefinition::Union(union)) => {
                let member =
                    self.match_union(union, value.type_name(), &describe(&value), path, nesting)?;
                self.cast_value(&member, value, path, nesting + 1)
            }
            Some(TypeDefinition::Schema(_) | TypeDefinition::Primitive(_)) => {
                Err(mismatch(ty, describe(&value), path))
            }
            None => Err(Error::UnknownType {
                name: name.to_string(),
                path: path.clone(),
            }),
        }
    }

    fn on_value(&mut self, value: Value, path: Path, downstream: &mut dyn EventSink) -> Result<(), Error> {
        if let Value::Enum(e) = &value
            && !matches!(self.registry.lookup(&e.type_name), Some(TypeDefinition::Enum(_)))
        {
            return Err(Error::not_well_formed("not an enum type", path));
        }
        let ty = self.next_type(&path)?;
        let cast = self.cast_value(&ty, value, &path, 0)?;
        downstream.accept(Event::value(cast).with_path(path))
    }

    fn on_start(&mut self, event: Event, downstream: &mut dyn EventSink) -> Result<(), Error> {
        let path = event.path_or_root();
        if let EventKind::StructStart(declared) = &event.kind
            && !matches!(self.registry.lookup(declared), Some(TypeDefinition::Struct(_)))
        {
            return Err(Error::not_well_formed("not a struct type", path));
        }
        let ty = self.next_type(&path)?;
        self.open_container(&ty, event, path, downstream, 0)
    }

    fn open_container(
        &mut self,
        ty: &TypeReference,
        event: Event,
        path: Path,
        downstream: &mut dyn EventSink,
        nesting: usize,
    ) -> Result<(), Error> {
        let (effective, _) = ty.resolve_wrappers();
        match (effective, &event.kind) {
            (
                TypeReference::List {
                    element,
                    allows_empty,
                },
                EventKind::ListStart,
            ) => {
                self.frames.push(Frame::List(ListFrame {
                    element: element.as_ref().clone(),
                    allows_empty: *allows_empty,
                    saw_element: false,
                    path,
                }));
                downstream.accept(event)
            }
            (TypeReference::Atomic { name, .. }, EventKind::ListStart)
                if name == PrimitiveType::Value.name() =>
            {
                self.frames.push(Frame::List(ListFrame {
                    element: TypeReference::any(),
                    allows_empty: true,
                    saw_element: false,
                    path,
                }));
                downstream.accept(event)
            }
            (TypeReference::Atomic { name, .. }, EventKind::ListStart) => {
                self.open_union_list(ty, name, event, path, downstream, nesting)
            }
            (TypeReference::Atomic { name, .. }, EventKind::StructStart(_) | EventKind::MapStart) => {
                self.open_fields(ty, name, event, path, downstream, nesting)
            }
            _ => Err(mismatch(ty, event.kind.describe(), &path)),
        }
    }

    /// A list against a union opens the union's first list-shaped member.
    fn open_union_list(
        &mut self,
        ty: &TypeReference,
        name: &str,
        event: Event,
        path: Path,
        downstream: &mut dyn EventSink,
        nesting: usize,
    ) -> Result<(), Error> {
        let registry = Arc::clone(&self.registry);
        let Some(TypeDefinition::Union(union)) = registry.lookup(name) else {
            return Err(mismatch(ty, event.kind.describe(), &path));
        };
        let member = if nesting < MAX_UNION_NESTING {
            union.list_member().cloned()
        } else {
            None
        };
        trace!(union = %union.name, matched = ?member, "matched union member for list");
        match member {
            Some(member) => self.open_container(&member, event, path, downstream, nesting + 1),
            None => Err(Error::TypeMismatch {
                expected: union.name.clone(),
                actual: event.kind.describe(),
                path,
            }),
        }
    }

    fn open_fields(
        &mut self,
        ty: &TypeReference,
        name: &str,
        event: Event,
        path: Path,
        downstream: &mut dyn EventSink,
        nesting: usize,
    ) -> Result<(), Error> {
        let declared = match &event.kind {
            EventKind::StructStart(declared) => Some(declared.clone()),
            _ => None,
        };

        if name == PrimitiveType::SymbolMap.name() || name == PrimitiveType::Value.name() {
            let typer: Box<dyn FieldTyper> =
                match self.options.narrowed_fields(self.container_depth(), &path) {
                    Some(fields) => Box::new(NarrowedFields::new(fields)),
                    None => Box::new(OpenFields),
                };
            let forwarded = if name == PrimitiveType::SymbolMap.name() {
                Event::map_start().with_path(path.clone())
            } else {
                event
            };
            self.frames.push(Frame::Fields(FieldSetFrame::new(typer, path)));
            return downstream.accept(forwarded);
        }
        if PrimitiveType::from_name(name).is_some() {
            return Err(mismatch(ty, event.kind.describe(), &path));
        }

        let registry = Arc::clone(&self.registry);
        match registry.lookup(name) {
            Some(TypeDefinition::Struct(def)) => {
                if let Some(declared) = declared.as_deref()
                    && declared != def.name
                {
                    if def.constructor_types.iter().any(|c| c == declared)
                        && let Some(TypeDefinition::Struct(ctor)) = registry.lookup(declared)
                    {
                        debug!(declared, target = %def.name, "casting as constructor type");
                        self.frames.push(Frame::Fields(FieldSetFrame::new(
                            Box::new(DeclaredFields::for_struct(ctor)),
                            path,
                        )));
                        return downstream.accept(event);
                    }
                    let same_fields = match registry.lookup(declared) {
                        Some(TypeDefinition::Struct(other)) => {
                            field_names(&other.fields) == field_names(&def.fields)
                        }
                        _ => false,
                    };
                    if !same_fields {
                        return Err(mismatch(ty, event.kind.describe(), &path));
                    }
                }
                self.frames.push(Frame::Fields(FieldSetFrame::new(
                    Box::new(DeclaredFields::for_struct(def)),
                    path.clone(),
                )));
                downstream.accept(Event::struct_start(def.name.as_str()).with_path(path))
            }
            Some(TypeDefinition::Schema(schema)) => {
                if let Some(declared) = declared.as_deref()
                    && !is_assignable(&*registry, declared, &schema.name)
                {
                    return Err(mismatch(ty, event.kind.describe(), &path));
                }
                self.frames.push(Frame::Fields(FieldSetFrame::new(
                    Box::new(DeclaredFields::for_schema(schema)),
                    path.clone(),
                )));
                downstream.accept(Event::map_start().with_path(path))
            }
            Some(TypeDefinition::Union(union)) => {
                let incoming = declared
                    .as_deref()
                    .unwrap_or(PrimitiveType::SymbolMap.name());
                let member =
                    self.match_union(union, incoming, &event.kind.describe(), &path, nesting)?;
                self.open_container(&member, event, path, downstream, nesting + 1)
            }
            Some(TypeDefinition::Enum(_) | TypeDefinition::Primitive(_)) => {
                Err(mismatch(ty, event.kind.describe(), &path))
            }
            None => Err(Error::UnknownType {
                name: name.to_string(),
                path,
            }),
        }
    }

    fn on_field(&mut self, event: Event, downstream: &mut dyn EventSink) -> Result<(), Error> {
        let EventKind::FieldStart(name) = &event.kind else {
            return Err(Error::Internal("on_field called with a non-field event".into()));
        };
        let Some(Frame::Fields(frame)) = self.frames.last_mut() else {
            return Err(Error::not_well_formed(
                format!("field `{name}` outside a struct or map"),
                event.path_or_root(),
            ));
        };
        frame.awaiting.remove(name.as_str());

        if self.options.is_pass_through(frame.typer.type_name(), name) {
            debug!(field = %name, "forwarding pass-through field");
            self.pass_through = Some(DepthTracker::new());
            return downstream.accept(event);
        }

        let Some(ty) = frame.typer.field_type(name) else {
            return Err(Error::UnrecognizedField {
                field: name.clone(),
                type_name: frame.typer.type_name().to_string(),
                path: event.path_or_root(),
            });
        };
        self.frames.push(Frame::Type(ty));
        downstream.accept(event)
    }

    fn on_end(&mut self, event: Event, downstream: &mut dyn EventSink) -> Result<(), Error> {
        match self.frames.last() {
            Some(Frame::Fields(_)) => self.close_fields(event, downstream),
            Some(Frame::List(list)) => {
                if !list.saw_element && !list.allows_empty {
                    return Err(Error::not_well_formed("empty list", list.path.clone()));
                }
                self.frames.pop();
                downstream.accept(event)
            }
            Some(Frame::Type(_)) => Err(Error::not_well_formed(
                "container closed after a field name without a value",
                event.path_or_root(),
            )),
            None => Err(Error::not_well_formed("unbalanced end", event.path_or_root())),
        }
    }

    fn close_fields(&mut self, event: Event, downstream: &mut dyn EventSink) -> Result<(), Error> {
        let (base, defaults) = match self.frames.last() {
            Some(Frame::Fields(frame)) => (frame.path.clone(), frame.pending_defaults()),
            _ => return Err(Error::Internal("field set frame vanished".into())),
        };

        // Defaults go back through the reactor so they are cast like input.
        for (name, default) in defaults {
            let path = base.field(name.as_str());
            debug!(field = %name, path = %path, "synthesizing default");
            self.process(Event::field_start(name).with_path(path.clone()), downstream)?;
            default.feed_from(
                &path,
                &mut Reentry {
                    reactor: self,
                    downstream: &mut *downstream,
                },
            )?;
        }

        let Some(Frame::Fields(frame)) = self.frames.pop() else {
            return Err(Error::Internal("field set frame vanished".into()));
        };
        let missing = frame.missing();
        if !missing.is_empty() {
            return Err(Error::MissingFields {
                fields: missing,
                path: frame.path,
            });
        }
        downstream.accept(event)
    }
}

impl EventProcessor for CastReactor {
    fn name(&self) -> &'static str {
        "cast-reactor"
    }

    fn process(&mut self, event: Event, downstream: &mut dyn EventSink) -> Result<(), Error> {
        trace!(event = ?event.kind, depth = self.frames.len(), "cast");

        if let Some(tracker) = &mut self.pass_through {
            tracker.observe(&event)?;
            if tracker.is_complete() {
                self.pass_through = None;
            }
            return downstream.accept(event);
        }

        match event.kind {
            EventKind::Value(value) => self.on_value(value, event.path.unwrap_or_default(), downstream),
            EventKind::StructStart(_) | EventKind::MapStart | EventKind::ListStart => {
                self.on_start(event, downstream)
            }
            EventKind::FieldStart(_) => self.on_field(event, downstream),
            EventKind::End => self.on_end(event, downstream),
        }
    }

    fn companions(&self) -> Vec<Box<dyn EventProcessor>> {
        vec![
            Box::new(WellFormedChecker::new()),
            Box::new(PathSetter::new()),
        ]
    }
}

/// Feeds synthesized events back into the reactor.
struct Reentry<'a> {
    reactor: &'a mut CastReactor,
    downstream: &'a mut dyn EventSink,
}

impl EventSink for Reentry<'_> {
    fn accept(&mut self, event: Event) -> Result<(), Error> {
        self.reactor.process(event, &mut *self.downstream)
    }
}

fn mismatch(expected: &TypeReference, actual: String, path: &Path) -> Error {
    Error::TypeMismatch {
        expected: expected.to_string(),
        actual,
        path: path.clone(),
    }
}

fn field_names(fields: &[weft_core::FieldDefinition]) -> BTreeSet<&str> {
    fields.iter().map(|f| f.name.as_str()).collect()
}

fn cast_enum(def: &EnumDefinition, value: Value, path: &Path) -> Result<Value, Error> {
    let member = match &value {
        Value::String(s) => s.as_str(),
        Value::Enum(e) if e.type_name == def.name => e.member.as_str(),
        _ => {
            return Err(Error::TypeMismatch {
                expected: def.name.clone(),
                actual: describe(&value),
                path: path.clone(),
            });
        }
    };
    if def.contains(member) {
        Ok(Value::Enum(EnumValue::new(def.name.as_str(), member)))
    } else {
        Err(Error::IllegalEnumValue {
            value: member.to_string(),
            enum_type: def.name.clone(),
            path: path.clone(),
        })
    }
}
