//! The synchronous processor chain every codec and the cast reactor plug into.

use crate::{Error, Event};

/// A terminal consumer of events.
pub trait EventSink {
    /// Accept one event. An error aborts the whole feed.
    fn accept(&mut self, event: Event) -> Result<(), Error>;
}

/// A pipeline stage.
///
/// This is intentionally event-ish: a processor sees one event at a time and
/// decides what reaches `downstream`. It may forward the event verbatim,
/// forward a transformed event, swallow it, or synthesize additional events.
pub trait EventProcessor {
    /// Stable name, used for logging and companion de-duplication.
    fn name(&self) -> &'static str;

    /// Process one event.
    fn process(&mut self, event: Event, downstream: &mut dyn EventSink) -> Result<(), Error>;

    /// Processors this one needs to run ahead of it.
    ///
    /// Called once during pipeline assembly. Companions whose name is already
    /// present earlier in the chain are not inserted again.
    fn companions(&self) -> Vec<Box<dyn EventProcessor>> {
        Vec::new()
    }
}

impl EventSink for Vec<Event> {
    fn accept(&mut self, event: Event) -> Result<(), Error> {
        self.push(event);
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn accept(&mut self, event: Event) -> Result<(), Error> {
        (**self).accept(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn accept(&mut self, event: Event) -> Result<(), Error> {
        (**self).accept(event)
    }
}

/// A sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl EventSink for Discard {
    fn accept(&mut self, _event: Event) -> Result<(), Error> {
        Ok(())
    }
}

/// The remainder of a pipeline, as seen by one stage.
struct Chain<'a> {
    stages: &'a mut [Box<dyn EventProcessor>],
    sink: &'a mut dyn EventSink,
}

impl EventSink for Chain<'_> {
    fn accept(&mut self, event: Event) -> Result<(), Error> {
        match self.stages.split_first_mut() {
            Some((head, rest)) => {
                let mut next = Chain {
                    stages: rest,
                    sink: &mut *self.sink,
                };
                head.process(event, &mut next)
            }
            None => self.sink.accept(event),
        }
    }
}

/// An ordered chain of processors ending in a sink.
pub struct Pipeline<S> {
    stages: Vec<Box<dyn EventProcessor>>,
    sink: S,
}

impl Pipeline<Discard> {
    /// Start assembling a pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }
}

impl<S: EventSink> Pipeline<S> {
    /// Push one event through every stage.
    pub fn feed(&mut self, event: Event) -> Result<(), Error> {
        Chain {
            stages: &mut self.stages,
            sink: &mut self.sink,
        }
        .accept(event)
    }

    /// Push a sequence of events, stopping at the first error.
    pub fn feed_all(&mut self, events: impl IntoIterator<Item = Event>) -> Result<(), Error> {
        events.into_iter().try_for_each(|event| self.feed(event))
    }

    /// Names of the assembled stages, head first.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the pipeline, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: EventSink> EventSink for Pipeline<S> {
    fn accept(&mut self, event: Event) -> Result<(), Error> {
        self.feed(event)
    }
}

/// Assembles a [`Pipeline`], inserting each stage's companions ahead of it.
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Box<dyn EventProcessor>>,
}

impl PipelineBuilder {
    /// Append a stage.
    pub fn stage(self, stage: impl EventProcessor + 'static) -> Self {
        self.boxed_stage(Box::new(stage))
    }

    /// Append an already boxed stage.
    pub fn boxed_stage(mut self, stage: Box<dyn EventProcessor>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Finish assembly, terminating the chain in `sink`.
    pub fn build<S: EventSink>(self, sink: S) -> Pipeline<S> {
        let mut assembled: Vec<Box<dyn EventProcessor>> = Vec::with_capacity(self.stages.len());
        for stage in self.stages {
            for companion in stage.companions() {
                if assembled.iter().any(|s| s.name() == companion.name()) {
                    trace!(
                        companion = companion.name(),
                        "companion already present, skipping"
                    );
                    continue;
                }
                debug!(
                    companion = companion.name(),
                    stage = stage.name(),
                    "inserting companion"
                );
                assembled.push(companion);
            }
            assembled.push(stage);
        }
        Pipeline {
            stages: assembled,
            sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventKind, Value};

    /// Doubles every Int32 it sees and counts what passed through.
    struct Doubler {
        seen: usize,
    }

    impl EventProcessor for Doubler {
        fn name(&self) -> &'static str {
            "doubler"
        }

        fn process(&mut self, event: Event, downstream: &mut dyn EventSink) -> Result<(), Error> {
            self.seen += 1;
            match event.kind {
                EventKind::Value(Value::Int32(v)) => downstream.accept(Event::value(v * 2)),
                _ => downstream.accept(event),
            }
        }
    }

    struct Needy;

    impl EventProcessor for Needy {
        fn name(&self) -> &'static str {
            "needy"
        }

        fn process(&mut self, event: Event, downstream: &mut dyn EventSink) -> Result<(), Error> {
            downstream.accept(event)
        }

        fn companions(&self) -> Vec<Box<dyn EventProcessor>> {
            vec![Box::new(Doubler { seen: 0 })]
        }
    }

    struct Fails;

    impl EventProcessor for Fails {
        fn name(&self) -> &'static str {
            "fails"
        }

        fn process(&mut self, _event: Event, _downstream: &mut dyn EventSink) -> Result<(), Error> {
            Err(Error::Internal("boom".into()))
        }
    }

    #[test]
    fn test_stages_run_in_order() {
        weft_testhelpers::setup();

        let mut pipeline = Pipeline::builder()
            .stage(Doubler { seen: 0 })
            .stage(Doubler { seen: 0 })
            .build(Vec::new());
        pipeline.feed(Event::value(3)).unwrap();
        assert_eq!(pipeline.into_sink(), vec![Event::value(12)]);
    }

    #[test]
    fn test_companions_are_inserted_once() {
        weft_testhelpers::setup();

        let pipeline = Pipeline::builder()
            .stage(Needy)
            .stage(Needy)
            .build(Discard);
        assert_eq!(pipeline.stage_names(), vec!["doubler", "needy", "needy"]);
    }

    #[test]
    fn test_error_aborts_feed() {
        weft_testhelpers::setup();

        let mut pipeline = Pipeline::builder().stage(Fails).build(Vec::new());
        let err = pipeline
            .feed_all([Event::value(1), Event::value(2)])
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert!(pipeline.sink().is_empty());
    }
}
