#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

/// Trace-level logging macro that forwards to `tracing::trace!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

/// Trace-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// Debug-level logging macro that forwards to `tracing::debug!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

/// Debug-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[allow(unused_imports)]
pub(crate) use debug;
#[allow(unused_imports)]
pub(crate) use trace;

mod companions;
mod depth;
mod error;
mod event;
mod pipeline;
mod registry;
mod tree;
mod types;
mod value;

pub use companions::{PathSetter, WellFormedChecker};
pub use depth::DepthTracker;
pub use error::Error;
pub use event::{Event, EventKind};
pub use pipeline::{Discard, EventProcessor, EventSink, Pipeline, PipelineBuilder};
pub use registry::{
    EnumDefinition, FieldDefinition, InMemoryRegistry, SchemaDefinition, StructDefinition,
    TypeDefinition, TypeRegistry, UnionDefinition, UnionMatchRule, is_assignable,
};
pub use tree::{TreeBuilder, ValueTree};
pub use types::{RangeRestriction, Restriction, TypeReference};
pub use value::{EnumValue, PrimitiveType, Value};

pub use weft_path::{Path, PathStep};
