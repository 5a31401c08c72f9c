use std::io::{ErrorKind, Read};

use weft_core::Error;

/// A reader that knows how many bytes it has consumed.
///
/// Every read either completes or fails with a [`Error::WireDecode`] citing
/// the offset at which that read began.
#[derive(Debug)]
pub struct OffsetReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> OffsetReader<R> {
    /// Wrap `inner`, starting at offset zero.
    pub const fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Bytes consumed so far.
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` completely.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let start = self.offset;
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(Error::wire_decode(
                start,
                format!("unexpected end of input reading {} bytes", buf.len()),
            )),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Read exactly `len` bytes into a new buffer.
    ///
    /// The buffer grows with the input rather than trusting `len` up front.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let start = self.offset;
        let mut buf = Vec::new();
        let read = (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(Error::Io)?;
        if read < len {
            return Err(Error::wire_decode(
                start,
                format!("unexpected end of input reading {len} bytes"),
            ));
        }
        self.offset += len as u64;
        Ok(buf)
    }

    /// Read one byte, or `None` at a clean end of input.
    pub fn try_read_u8(&mut self) -> Result<Option<u8>, Error> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32, Error> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64, Error> {
        self.read_array().map(i64::from_le_bytes)
    }

    /// Read a little-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, Error> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Read a little-endian `f32`.
    pub fn read_f32(&mut self) -> Result<f32, Error> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read a little-endian `f64`.
    pub fn read_f64(&mut self) -> Result<f64, Error> {
        self.read_array().map(f64::from_le_bytes)
    }
}
