#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub use weft_core::*;

pub use weft_cast::{
    CastOptions, CastReactor, DeclaredFields, FieldSetFactory, FieldTyper, NarrowedFields,
    OpenFields, UnionMatcher, cast,
};

pub use weft_binary::{
    BinaryDecoder, BinaryEncoder, DecodeOptions, OffsetReader, codes, from_reader, from_slice,
    to_vec, to_writer,
};
