use crate::{Error, Event, EventKind};

/// Counts container nesting across an event stream.
///
/// Feed it every event of a subtree; once the subtree has fully closed,
/// [`DepthTracker::is_complete`] turns true. A lone leaf value is a complete
/// subtree on its own.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DepthTracker {
    depth: usize,
    started: bool,
}

impl DepthTracker {
    /// A tracker that has seen nothing yet.
    pub const fn new() -> Self {
        Self {
            depth: 0,
            started: false,
        }
    }

    /// Observe one event and return the depth after it.
    pub fn observe(&mut self, event: &Event) -> Result<usize, Error> {
        match &event.kind {
            kind if kind.is_start() => self.depth += 1,
            EventKind::End => {
                if self.depth == 0 {
                    return Err(Error::not_well_formed(
                        "unbalanced end",
                        event.path_or_root(),
                    ));
                }
                self.depth -= 1;
            }
            EventKind::FieldStart(_) => {
                if self.depth == 0 {
                    return Err(Error::not_well_formed(
                        "field name outside a struct or map",
                        event.path_or_root(),
                    ));
                }
            }
            _ => {}
        }
        self.started = true;
        Ok(self.depth)
    }

    /// Current nesting depth.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Whether at least one event was observed and every container it opened
    /// has closed again.
    pub const fn is_complete(&self) -> bool {
        self.started && self.depth == 0
    }
}
