//! Index table parsing and binary search.
//!
//! ## Layout
//!
//! The header stores the byte offsets of the first and the last index entry.
//! Every entry is [`INDEX_LEN`] bytes: a little-endian `u32` start address
//! followed by a little-endian 24-bit offset into the record region. Entries
//! are sorted by start address and each one covers the addresses up to the
//! next entry's start.
//!
//! ## Search
//!
//! [`IndexSearcher`] halves a byte window `[start, end]` on entry boundaries
//! until an exact hit or until only two adjacent entries remain. The first
//! entry also covers every address below it and the last entry covers every
//! address from its start upwards.

use crate::error::{Error, Result};
use crate::store::{ByteStore, HEADER_LEN};
use std::cmp::Ordering;
use std::net::Ipv4Addr;

/// Width of one index entry: 4-byte start address + 3-byte record offset
pub const INDEX_LEN: usize = 7;

/// Validated header of a database buffer.
///
/// Only [`IndexHeader::parse`] constructs one, so `index_start <= index_end`
/// and the span between them is a whole number of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    index_start: u32,
    index_end: u32,
}

impl IndexHeader {
    /// Parses and validates the header against the buffer it came from
    pub fn parse(store: &ByteStore) -> Result<Self> {
        if store.len() < HEADER_LEN {
            return Err(Error::BufferTooSmall { len: store.len() });
        }
        let (index_start, index_end) = store.read_header()?;

        if index_end < index_start {
            return Err(Error::invalid_header(
                index_start,
                index_end,
                "index end precedes index start",
            ));
        }
        if (index_end - index_start) as usize % INDEX_LEN != 0 {
            return Err(Error::invalid_header(
                index_start,
                index_end,
                format!("index span is not a multiple of {INDEX_LEN} bytes"),
            ));
        }
        if (index_start as usize) < HEADER_LEN {
            return Err(Error::invalid_header(
                index_start,
                index_end,
                "index overlaps the file header",
            ));
        }
        if index_end as usize + INDEX_LEN > store.len() {
            return Err(Error::invalid_header(
                index_start,
                index_end,
                format!("index table runs past end of buffer ({} bytes)", store.len()),
            ));
        }

        Ok(Self {
            index_start,
            index_end,
        })
    }

    /// Byte offset of the first index entry
    pub fn index_start(&self) -> u32 {
        self.index_start
    }

    /// Byte offset of the last index entry
    pub fn index_end(&self) -> u32 {
        self.index_end
    }

    /// Number of entries in the index table
    pub fn entry_count(&self) -> usize {
        self.index_end.saturating_sub(self.index_start) as usize / INDEX_LEN + 1
    }

    /// Byte offset of the entry at `index`, if it exists
    pub fn entry_offset(&self, index: usize) -> Option<usize> {
        if index >= self.entry_count() {
            return None;
        }
        Some(self.index_start as usize + index * INDEX_LEN)
    }
}

/// A single row of the index table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    /// First address covered by this entry
    pub start_ip: u32,
    /// Offset of the record holding this range's location and owner
    pub record_offset: u32,
}

impl IndexEntry {
    /// Reads the entry stored at byte `offset`
    pub fn read(store: &ByteStore, offset: usize) -> Result<Self> {
        Ok(Self {
            start_ip: store.read_u32(offset)?,
            record_offset: store.read_u24(offset + 4)?,
        })
    }

    /// Start address as an [`Ipv4Addr`]
    pub fn start_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.start_ip)
    }
}

/// Binary search over the index table of one buffer
#[derive(Debug, Clone, Copy)]
pub struct IndexSearcher<'a> {
    store: &'a ByteStore,
    header: IndexHeader,
}

impl<'a> IndexSearcher<'a> {
    /// Creates a searcher over a store whose header was already validated
    pub fn new(store: &'a ByteStore, header: IndexHeader) -> Self {
        Self { store, header }
    }

    /// Finds the entry whose range covers `ip`.
    ///
    /// Every address is covered by some entry; whether that entry points at
    /// a usable record is up to the caller.
    pub fn search(&self, ip: u32) -> Result<IndexEntry> {
        let last = self.header.index_end as usize;
        let mut start = self.header.index_start as usize;
        let mut end = last;

        if end <= start {
            return IndexEntry::read(self.store, start);
        }

        loop {
            if end - start == INDEX_LEN {
                let candidate = IndexEntry::read(self.store, start)?;
                let next = IndexEntry::read(self.store, end)?;
                // `end` only moves below `last` onto an entry above `ip`, so
                // failing this check means `next` is the final entry.
                if ip < next.start_ip || end != last {
                    return Ok(candidate);
                }
                return Ok(next);
            }

            let mid = middle(start, end);
            if mid == start {
                // Window narrower than two entries but not exactly one stride
                return IndexEntry::read(self.store, start);
            }
            let entry = IndexEntry::read(self.store, mid)?;
            match ip.cmp(&entry.start_ip) {
                Ordering::Equal => return Ok(entry),
                Ordering::Less => end = mid,
                Ordering::Greater => start = mid,
            }
        }
    }
}

/// Midpoint of a window, rounded down to an entry boundary
fn middle(start: usize, end: usize) -> usize {
    start + (end - start) / (INDEX_LEN * 2) * INDEX_LEN
}
