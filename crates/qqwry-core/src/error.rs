//! Error types for the qqwry-core library.
//!
//! Errors fall into two groups. Format errors are raised while loading a
//! database and are fatal for that buffer. Decode errors are raised while
//! resolving a single record and only ever degrade the affected field.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for qqwry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all qqwry operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read the database file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Buffer is too short to hold the 8-byte header
    #[error("database too small: {len} bytes, need at least 8")]
    BufferTooSmall {
        /// Length of the rejected buffer
        len: usize,
    },

    /// Header index bounds are inconsistent with each other or the buffer
    #[error("invalid database header (index {index_start}..={index_end}): {details}")]
    InvalidHeader {
        /// Offset of the first index entry
        index_start: u32,
        /// Offset of the last index entry
        index_end: u32,
        /// Detailed description of the issue
        details: String,
    },

    /// A read ran past the end of the buffer
    #[error("read of {needed} bytes at offset {offset} runs past end of buffer ({len} bytes)")]
    OutOfBounds {
        /// Byte offset where the read started
        offset: usize,
        /// Number of bytes the read required
        needed: usize,
        /// Total buffer length
        len: usize,
    },

    /// A nul-terminated string reached the end of the buffer
    #[error("unterminated string at offset {offset}")]
    UnterminatedString {
        /// Byte offset where the string started
        offset: usize,
    },

    /// Redirect chain exceeded the format's hop limit
    #[error("redirect chain starting at offset {offset} exceeds {max_hops} hops")]
    RedirectLimit {
        /// Record offset the chain started from
        offset: u32,
        /// Hop limit that was exceeded
        max_hops: usize,
    },

    /// Input is not a dotted-quad IPv4 address
    #[error("invalid IPv4 address: '{0}'")]
    InvalidAddress(String),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new header error
    pub fn invalid_header(index_start: u32, index_end: u32, details: impl Into<String>) -> Self {
        Self::InvalidHeader {
            index_start,
            index_end,
            details: details.into(),
        }
    }

    /// Creates a new out-of-bounds read error
    pub fn out_of_bounds(offset: usize, needed: usize, len: usize) -> Self {
        Self::OutOfBounds {
            offset,
            needed,
            len,
        }
    }

    /// Creates a new invalid address error
    pub fn invalid_address(input: impl Into<String>) -> Self {
        Self::InvalidAddress(input.into())
    }

    /// Returns true if this error only affects a single lookup or field
    /// and the database as a whole remains usable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. }
                | Self::UnterminatedString { .. }
                | Self::RedirectLimit { .. }
                | Self::InvalidAddress(_)
        )
    }
}
