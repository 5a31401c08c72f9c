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

mod coerce;
mod options;
mod reactor;
mod restrict;
mod typer;

use std::sync::Arc;

pub use options::{CastOptions, FieldSetFactory, UnionMatcher};
pub use reactor::CastReactor;
pub use typer::{DeclaredFields, FieldTyper, NarrowedFields, OpenFields};

use weft_core::{Error, Pipeline, TreeBuilder, TypeReference, TypeRegistry, ValueTree};

/// Cast a whole document to `target`.
///
/// Assembles a pipeline of [`CastReactor`] (with its checking and
/// path-stamping companions) ending in a [`TreeBuilder`], and feeds `tree`
/// through it.
pub fn cast(
    registry: Arc<dyn TypeRegistry>,
    target: TypeReference,
    tree: &ValueTree,
    options: CastOptions,
) -> Result<ValueTree, Error> {
    let mut pipeline = Pipeline::builder()
        .stage(CastReactor::new(registry, target, options))
        .build(TreeBuilder::new());
    tree.feed(&mut pipeline)?;
    pipeline.into_sink().finish()
}
