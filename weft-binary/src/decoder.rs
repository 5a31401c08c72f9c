use std::io::Read;

use chrono::DateTime;
use weft_core::{EnumValue, Error, Event, EventSink, Value};

use crate::codes;
use crate::reader::OffsetReader;

/// Limits applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest container nesting accepted; the root struct is depth 1.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

impl DecodeOptions {
    /// Default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deepest accepted nesting.
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Reads the binary wire format and emits the events it describes.
pub struct BinaryDecoder<R> {
    reader: OffsetReader<R>,
    options: DecodeOptions,
}

impl<R: Read> BinaryDecoder<R> {
    /// A decoder with default options.
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecodeOptions::default())
    }

    /// A decoder with explicit options.
    pub const fn with_options(reader: R, options: DecodeOptions) -> Self {
        Self {
            reader: OffsetReader::new(reader),
            options,
        }
    }

    /// Decode one root struct into `sink`.
    ///
    /// Fails if the input does not start with a struct, or if anything
    /// follows the root struct.
    pub fn decode(mut self, sink: &mut dyn EventSink) -> Result<(), Error> {
        match self.reader.try_read_u8()? {
            Some(codes::STRUCT) => {}
            _ => return Err(Error::wire_decode(0, "expected struct type code")),
        }
        self.decode_container(codes::STRUCT, 0, 1, sink)?;

        let offset = self.reader.offset();
        if self.reader.try_read_u8()?.is_some() {
            return Err(Error::wire_decode(
                offset,
                "trailing bytes after the root struct",
            ));
        }
        debug!(bytes = offset, "decoded root struct");
        Ok(())
    }

    fn read_length(&mut self) -> Result<usize, Error> {
        let offset = self.reader.offset();
        let len = self.reader.read_i32()?;
        usize::try_from(len).map_err(|_| Error::wire_decode(offset, format!("negative length {len}")))
    }

    fn read_utf8(&mut self) -> Result<String, Error> {
        let offset = self.reader.offset();
        let code = self.reader.read_u8()?;
        if code != codes::UTF8_STRING {
            return Err(Error::wire_decode(
                offset,
                format!("expected utf8 string type code, found {code:#04x}"),
            ));
        }
        let len = self.read_length()?;
        let start = self.reader.offset();
        let bytes = self.reader.read_vec(len)?;
        String::from_utf8(bytes).map_err(|e| {
            Error::wire_decode(start + e.utf8_error().valid_up_to() as u64, "invalid UTF-8")
        })
    }

    /// Decode the value whose type code `code` began at `offset`.
    fn decode_value(
        &mut self,
        code: u8,
        offset: u64,
        depth: usize,
        sink: &mut dyn EventSink,
    ) -> Result<(), Error> {
        trace!(code = codes::name(code), offset, depth, "type code");
        let value = match code {
            codes::BOOLEAN => Value::Boolean(self.reader.read_u8()? != 0),
            codes::INT32 => Value::Int32(self.reader.read_i32()?),
            codes::UINT32 => Value::Uint32(self.reader.read_u32()?),
            codes::INT64 => Value::Int64(self.reader.read_i64()?),
            codes::UINT64 => Value::Uint64(self.reader.read_u64()?),
            codes::FLOAT32 => Value::Float32(self.reader.read_f32()?),
            codes::FLOAT64 => Value::Float64(self.reader.read_f64()?),
            codes::STRING => Value::String(self.read_utf8()?),
            codes::BUFFER => {
                let len = self.read_length()?;
                Value::Buffer(self.reader.read_vec(len)?)
            }
            codes::TIMESTAMP => {
                let secs = self.reader.read_i64()?;
                let nanos = self.reader.read_u32()?;
                let ts = DateTime::from_timestamp(secs, nanos)
                    .ok_or_else(|| Error::wire_decode(offset, "timestamp out of range"))?;
                Value::Timestamp(ts)
            }
            codes::ENUM => {
                let type_name = self.read_utf8()?;
                let member = self.read_utf8()?;
                Value::Enum(EnumValue::new(type_name, member))
            }
            codes::NULL => Value::Null,
            codes::STRUCT | codes::SYMBOL_MAP | codes::LIST => {
                return self.decode_container(code, offset, depth + 1, sink);
            }
            other => {
                return Err(Error::wire_decode(
                    offset,
                    format!("unexpected {} type code {other:#04x}", codes::name(other)),
                ));
            }
        };
        sink.accept(Event::value(value))
    }

    /// Decode a container whose type code has already been read.
    fn decode_container(
        &mut self,
        code: u8,
        offset: u64,
        depth: usize,
        sink: &mut dyn EventSink,
    ) -> Result<(), Error> {
        if depth > self.options.max_depth {
            return Err(Error::wire_decode(
                offset,
                format!("nesting deeper than {}", self.options.max_depth),
            ));
        }
        match code {
            codes::STRUCT => {
                // size placeholder
                self.reader.read_i32()?;
                let type_name = self.read_utf8()?;
                trace!(%type_name, offset, depth, "struct");
                sink.accept(Event::struct_start(type_name))?;
                self.decode_fields(depth, sink)?;
            }
            codes::SYMBOL_MAP => {
                sink.accept(Event::map_start())?;
                self.decode_fields(depth, sink)?;
            }
            _ => {
                // size placeholder
                self.reader.read_i32()?;
                sink.accept(Event::list_start())?;
                loop {
                    let offset = self.reader.offset();
                    let code = self.reader.read_u8()?;
                    if code == codes::END {
                        break;
                    }
                    self.decode_value(code, offset, depth, sink)?;
                }
            }
        }
        sink.accept(Event::end())
    }

    fn decode_fields(&mut self, depth: usize, sink: &mut dyn EventSink) -> Result<(), Error> {
        loop {
            let offset = self.reader.offset();
            match self.reader.read_u8()? {
                codes::END => return Ok(()),
                codes::FIELD => {
                    let name = self.read_utf8()?;
                    sink.accept(Event::field_start(name))?;
                    let offset = self.reader.offset();
                    let code = self.reader.read_u8()?;
                    self.decode_value(code, offset, depth, sink)?;
                }
                other => {
                    return Err(Error::wire_decode(
                        offset,
                        format!("expected field or end type code, found {other:#04x}"),
                    ));
                }
            }
        }
    }
}
