//! Small processors other stages ask to have run ahead of them.

use weft_path::{Path, PathStep};

use crate::{Error, Event, EventKind, EventProcessor, EventSink};

#[derive(Debug, Clone, Copy)]
enum OpenKind {
    Fields,
    List { next_index: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Open {
    kind: OpenKind,
    /// Whether entering this container pushed a step that closing it must pop.
    owns_step: bool,
}

/// Stamps every event with its path from the document root.
///
/// Existing paths are overwritten. Tolerates malformed streams: it never
/// fails, leaving structural complaints to [`WellFormedChecker`].
#[derive(Debug, Default)]
pub struct PathSetter {
    path: Path,
    open: Vec<Open>,
    field_pending: bool,
}

impl PathSetter {
    /// A path setter positioned at the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Step into the position of the next value, returning whether a step
    /// was pushed.
    fn enter_position(&mut self) -> bool {
        match self.open.last_mut() {
            Some(Open {
                kind: OpenKind::List { next_index },
                ..
            }) => {
                self.path.push(PathStep::Index(*next_index));
                *next_index += 1;
                true
            }
            Some(Open {
                kind: OpenKind::Fields,
                ..
            }) => core::mem::take(&mut self.field_pending),
            None => false,
        }
    }
}

impl EventProcessor for PathSetter {
    fn name(&self) -> &'static str {
        "path-setter"
    }

    fn process(&mut self, mut event: Event, downstream: &mut dyn EventSink) -> Result<(), Error> {
        match &event.kind {
            EventKind::FieldStart(name) => {
                if self.field_pending {
                    self.path.pop();
                }
                self.path.push(PathStep::Field(name.clone()));
                self.field_pending = true;
                event.path = Some(self.path.clone());
            }
            EventKind::Value(_) => {
                let owns_step = self.enter_position();
                event.path = Some(self.path.clone());
                if owns_step {
                    self.path.pop();
                }
            }
            EventKind::StructStart(_) | EventKind::MapStart | EventKind::ListStart => {
                let owns_step = self.enter_position();
                event.path = Some(self.path.clone());
                let kind = if matches!(event.kind, EventKind::ListStart) {
                    OpenKind::List { next_index: 0 }
                } else {
                    OpenKind::Fields
                };
                self.open.push(Open { kind, owns_step });
            }
            EventKind::End => {
                event.path = Some(self.path.clone());
                if let Some(open) = self.open.pop()
                    && open.owns_step
                {
                    self.path.pop();
                }
                self.field_pending = false;
            }
        }
        downstream.accept(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Fields { awaiting_value: bool },
    List,
}

/// Rejects structurally invalid event streams before later stages see them.
///
/// Checks that every `End` closes something, that field names only appear
/// directly inside a struct or map and are each followed by exactly one
/// value, and that nothing follows the root value.
#[derive(Debug, Default)]
pub struct WellFormedChecker {
    open: Vec<Container>,
    root_done: bool,
}

impl WellFormedChecker {
    /// A checker expecting a fresh document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a complete root value has been seen.
    pub const fn is_complete(&self) -> bool {
        self.root_done
    }

    fn enter_position(&mut self, event: &Event) -> Result<(), Error> {
        match self.open.last_mut() {
            Some(Container::Fields { awaiting_value }) => {
                if !*awaiting_value {
                    return Err(Error::not_well_formed(
                        format!("{} without a field name", event.kind.describe()),
                        event.path_or_root(),
                    ));
                }
                *awaiting_value = false;
                Ok(())
            }
            Some(Container::List) | None => Ok(()),
        }
    }
}

impl EventProcessor for WellFormedChecker {
    fn name(&self) -> &'static str {
        "well-formed-checker"
    }

    fn process(&mut self, event: Event, downstream: &mut dyn EventSink) -> Result<(), Error> {
        if self.root_done {
            return Err(Error::not_well_formed(
                format!("{} after the root value closed", event.kind.describe()),
                event.path_or_root(),
            ));
        }
        match &event.kind {
            EventKind::Value(_) => {
                self.enter_position(&event)?;
                if self.open.is_empty() {
                    self.root_done = true;
                }
            }
            EventKind::StructStart(_) | EventKind::MapStart => {
                self.enter_position(&event)?;
                self.open.push(Container::Fields {
                    awaiting_value: false,
                });
            }
            EventKind::ListStart => {
                self.enter_position(&event)?;
                self.open.push(Container::List);
            }
            EventKind::FieldStart(name) => match self.open.last_mut() {
                Some(Container::Fields { awaiting_value }) if !*awaiting_value => {
                    *awaiting_value = true;
                }
                Some(Container::Fields { .. }) => {
                    return Err(Error::not_well_formed(
                        format!("field `{name}` follows a field name without a value"),
                        event.path_or_root(),
                    ));
                }
                Some(Container::List) | None => {
                    return Err(Error::not_well_formed(
                        format!("field `{name}` outside a struct or map"),
                        event.path_or_root(),
                    ));
                }
            },
            EventKind::End => match self.open.pop() {
                Some(Container::Fields {
                    awaiting_value: true,
                }) => {
                    return Err(Error::not_well_formed(
                        "container closed after a field name without a value",
                        event.path_or_root(),
                    ));
                }
                Some(_) => {
                    if self.open.is_empty() {
                        self.root_done = true;
                    }
                }
                None => {
                    return Err(Error::not_well_formed(
                        "unbalanced end",
                        event.path_or_root(),
                    ));
                }
            },
        }
        downstream.accept(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pipeline;

    fn paths_of(events: Vec<Event>) -> Vec<String> {
        let mut pipeline = Pipeline::builder().stage(PathSetter::new()).build(Vec::new());
        pipeline.feed_all(events).unwrap();
        pipeline
            .into_sink()
            .into_iter()
            .map(|e| e.path.unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_paths_for_nested_document() {
        weft_testhelpers::setup();

        let paths = paths_of(vec![
            Event::struct_start("demo.Order"),
            Event::field_start("id"),
            Event::value(7),
            Event::field_start("lines"),
            Event::list_start(),
            Event::map_start(),
            Event::field_start("sku"),
            Event::value("A-1"),
            Event::end(),
            Event::value(3),
            Event::end(),
            Event::end(),
        ]);
        assert_eq!(
            paths,
            vec![
                "<root>",
                "id",
                "id",
                "lines",
                "lines",
                "lines[0]",
                "lines[0].sku",
                "lines[0].sku",
                "lines[0]",
                "lines[1]",
                "lines",
                "<root>",
            ]
        );
    }

    fn check(events: Vec<Event>) -> Result<(), Error> {
        let mut pipeline = Pipeline::builder()
            .stage(WellFormedChecker::new())
            .build(crate::Discard);
        pipeline.feed_all(events)
    }

    #[test]
    fn test_accepts_well_formed() {
        weft_testhelpers::setup();

        check(vec![
            Event::map_start(),
            Event::field_start("a"),
            Event::list_start(),
            Event::end(),
            Event::end(),
        ])
        .unwrap();
    }

    #[test]
    fn test_rejects_value_without_field() {
        weft_testhelpers::setup();

        let err = check(vec![Event::struct_start("demo.Point"), Event::value(1)]).unwrap_err();
        assert!(matches!(err, Error::NotWellFormed { .. }), "{err}");
    }

    #[test]
    fn test_rejects_field_in_list() {
        weft_testhelpers::setup();

        let err = check(vec![Event::list_start(), Event::field_start("x")]).unwrap_err();
        assert!(err.to_string().contains("outside a struct or map"), "{err}");
    }

    #[test]
    fn test_rejects_dangling_field() {
        weft_testhelpers::setup();

        let err = check(vec![
            Event::map_start(),
            Event::field_start("x"),
            Event::end(),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("without a value"), "{err}");
    }

    #[test]
    fn test_rejects_trailing_events() {
        weft_testhelpers::setup();

        let err = check(vec![Event::value(1), Event::value(2)]).unwrap_err();
        assert!(err.to_string().contains("after the root value closed"), "{err}");
    }
}
