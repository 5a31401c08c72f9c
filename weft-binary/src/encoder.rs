use std::io::Write;

use weft_core::{
    DepthTracker, Error, Event, EventKind, EventProcessor, EventSink, Value, WellFormedChecker,
};

use crate::codes;

/// Writes events in the binary wire format.
///
/// Used as a pipeline stage it writes each event and forwards it unchanged;
/// used as a sink it only writes.
pub struct BinaryEncoder<W> {
    writer: W,
    depth: DepthTracker,
    started: bool,
}

impl<W: Write> BinaryEncoder<W> {
    /// An encoder writing to `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            depth: DepthTracker::new(),
            started: false,
        }
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Whether the root struct has been completely written.
    pub const fn is_complete(&self) -> bool {
        self.depth.is_complete()
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn put_len(&mut self, len: usize) -> Result<(), Error> {
        let len = i32::try_from(len).map_err(|_| Error::WireEncode {
            detail: format!("length {len} does not fit in an int32"),
        })?;
        self.put(&len.to_le_bytes())
    }

    fn put_utf8(&mut self, s: &str) -> Result<(), Error> {
        self.put(&[codes::UTF8_STRING])?;
        self.put_len(s.len())?;
        self.put(s.as_bytes())
    }

    fn put_value(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Boolean(v) => self.put(&[codes::BOOLEAN, u8::from(*v)]),
            Value::Int32(v) => {
                self.put(&[codes::INT32])?;
                self.put(&v.to_le_bytes())
            }
            Value::Int64(v) => {
                self.put(&[codes::INT64])?;
                self.put(&v.to_le_bytes())
            }
            Value::Uint32(v) => {
                self.put(&[codes::UINT32])?;
                self.put(&v.to_le_bytes())
            }
            Value::Uint64(v) => {
                self.put(&[codes::UINT64])?;
                self.put(&v.to_le_bytes())
            }
            Value::Float32(v) => {
                self.put(&[codes::FLOAT32])?;
                self.put(&v.to_le_bytes())
            }
            Value::Float64(v) => {
                self.put(&[codes::FLOAT64])?;
                self.put(&v.to_le_bytes())
            }
            Value::String(s) => {
                self.put(&[codes::STRING])?;
                self.put_utf8(s)
            }
            Value::Buffer(bytes) => {
                self.put(&[codes::BUFFER])?;
                self.put_len(bytes.len())?;
                self.put(bytes)
            }
            Value::Timestamp(ts) => {
                self.put(&[codes::TIMESTAMP])?;
                self.put(&ts.timestamp().to_le_bytes())?;
                self.put(&ts.timestamp_subsec_nanos().to_le_bytes())
            }
            Value::Enum(e) => {
                self.put(&[codes::ENUM])?;
                self.put_utf8(&e.type_name)?;
                self.put_utf8(&e.member)
            }
            Value::Null => self.put(&[codes::NULL]),
        }
    }

    fn write_event(&mut self, event: &Event) -> Result<(), Error> {
        if !self.started && !matches!(event.kind, EventKind::StructStart(_)) {
            return Err(Error::WireEncode {
                detail: format!("top-level value must be a struct, got {}", event.kind.describe()),
            });
        }
        if self.started && self.depth.depth() == 0 {
            return Err(Error::WireEncode {
                detail: format!("{} after the root struct closed", event.kind.describe()),
            });
        }
        self.started = true;
        self.depth.observe(event)?;
        trace!(event = ?event.kind, depth = self.depth.depth(), "encoding");

        match &event.kind {
            EventKind::Value(value) => self.put_value(value),
            EventKind::StructStart(type_name) => {
                self.put(&[codes::STRUCT])?;
                self.put(&codes::UNKNOWN_SIZE.to_le_bytes())?;
                self.put_utf8(type_name)
            }
            EventKind::MapStart => self.put(&[codes::SYMBOL_MAP]),
            EventKind::FieldStart(name) => {
                self.put(&[codes::FIELD])?;
                self.put_utf8(name)
            }
            EventKind::ListStart => {
                self.put(&[codes::LIST])?;
                self.put(&codes::UNKNOWN_SIZE.to_le_bytes())
            }
            EventKind::End => {
                self.put(&[codes::END])?;
                if self.depth.is_complete() {
                    self.writer.flush()?;
                }
                Ok(())
            }
        }
    }
}

impl<W: Write> EventSink for BinaryEncoder<W> {
    fn accept(&mut self, event: Event) -> Result<(), Error> {
        self.write_event(&event)
    }
}

impl<W: Write> EventProcessor for BinaryEncoder<W> {
    fn name(&self) -> &'static str {
        "binary-encoder"
    }

    fn process(&mut self, event: Event, downstream: &mut dyn EventSink) -> Result<(), Error> {
        self.write_event(&event)?;
        downstream.accept(event)
    }

    fn companions(&self) -> Vec<Box<dyn EventProcessor>> {
        vec![Box::new(WellFormedChecker::new())]
    }
}
