//! Bounds-checked read access over the database buffer.
//!
//! [`ByteStore`] never keeps a read position of its own. Every method takes
//! the offset it reads from, so one store can be shared by any number of
//! concurrent lookups and scans.
//!
//! Plain [`ByteStore::read`] clips to the end of the buffer instead of
//! failing. The typed readers on top of it (`read_u24`, `read_cstring`, ...)
//! report a short read as a decode error, which callers confine to the field
//! being decoded.

use crate::error::{Error, Result};
use bytes::Bytes;

/// Size of the file header: two little-endian `u32` index offsets
pub const HEADER_LEN: usize = 8;

/// Immutable, cheaply cloneable view over the raw database bytes
#[derive(Debug, Clone)]
pub struct ByteStore {
    data: Bytes,
}

impl ByteStore {
    /// Wraps a buffer without copying it
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Total length of the buffer in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the whole buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Reads up to `length` bytes at `offset`, clipped to the buffer end.
    ///
    /// Returns an empty slice when `offset` lies past the end.
    pub fn read(&self, offset: usize, length: usize) -> &[u8] {
        let len = self.data.len();
        if offset > len {
            return &[];
        }
        let end = offset.saturating_add(length).min(len);
        &self.data[offset..end]
    }

    /// Reads exactly `length` bytes or fails with [`Error::OutOfBounds`]
    fn read_exact(&self, offset: usize, length: usize) -> Result<&[u8]> {
        let bytes = self.read(offset, length);
        if bytes.len() < length {
            return Err(Error::out_of_bounds(offset, length, self.data.len()));
        }
        Ok(bytes)
    }

    /// Reads a single byte, typically a redirect tag
    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.read_exact(offset, 1)?[0])
    }

    /// Reads a 3-byte little-endian unsigned value
    pub fn read_u24(&self, offset: usize) -> Result<u32> {
        let b = self.read_exact(offset, 3)?;
        Ok(u32::from(b[0]) | u32::from(b[1]) << 8 | u32::from(b[2]) << 16)
    }

    /// Reads a 4-byte little-endian unsigned value
    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        let b = self.read_exact(offset, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads the header, returning `(index_start, index_end)`
    pub fn read_header(&self) -> Result<(u32, u32)> {
        Ok((self.read_u32(0)?, self.read_u32(4)?))
    }

    /// Reads a nul-terminated string, excluding the terminator.
    ///
    /// Reaching the end of the buffer before a nul byte is reported as
    /// [`Error::UnterminatedString`] rather than returning what was scanned.
    pub fn read_cstring(&self, offset: usize) -> Result<&[u8]> {
        let tail = self.read(offset, usize::MAX);
        match tail.iter().position(|&b| b == 0) {
            Some(n) => Ok(&tail[..n]),
            None => Err(Error::UnterminatedString { offset }),
        }
    }
}
