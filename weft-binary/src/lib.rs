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

pub mod codes;
mod decoder;
mod encoder;
mod reader;

use std::io::{Read, Write};

pub use decoder::{BinaryDecoder, DecodeOptions};
pub use encoder::BinaryEncoder;
pub use reader::OffsetReader;

use weft_core::{Error, Pipeline, TreeBuilder, ValueTree, WellFormedChecker};

/// Encode `tree` to `writer`.
///
/// The top-level value must be a struct.
pub fn to_writer<W: Write>(tree: &ValueTree, writer: W) -> Result<(), Error> {
    let mut pipeline = Pipeline::builder()
        .stage(WellFormedChecker::new())
        .build(BinaryEncoder::new(writer));
    tree.feed(&mut pipeline)?;
    if !pipeline.sink().is_complete() {
        return Err(Error::WireEncode {
            detail: "document ended before the root struct closed".into(),
        });
    }
    Ok(())
}

/// Encode `tree` into a new byte vector.
pub fn to_vec(tree: &ValueTree) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    to_writer(tree, &mut bytes)?;
    Ok(bytes)
}

/// Decode one document from `reader`.
pub fn from_reader<R: Read>(reader: R) -> Result<ValueTree, Error> {
    let mut builder = TreeBuilder::new();
    BinaryDecoder::new(reader).decode(&mut builder)?;
    builder.finish()
}

/// Decode one document from a byte slice.
pub fn from_slice(bytes: &[u8]) -> Result<ValueTree, Error> {
    from_reader(bytes)
}
