//! Database handle and lookups.
//!
//! A [`Database`] owns a shared, immutable buffer together with its
//! validated header. All lookups and scans borrow it immutably, so a single
//! handle (or cheap clones of it) can serve any number of threads.
//!
//! ```no_run
//! use qqwry_core::Database;
//!
//! let db = Database::open("./data/qqwry.dat")?;
//! let result = db.lookup("223.247.9.0");
//! println!("{} {} {}", result.ip, result.info.location, result.info.owner);
//! # Ok::<(), qqwry_core::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::index::{IndexEntry, IndexHeader, IndexSearcher};
use crate::record::RecordDecoder;
use crate::scan::{Entries, Scan};
use crate::store::ByteStore;
use crate::text::TextEncoding;
use bytes::Bytes;
use std::fmt;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Location and owner of an address range
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IpInfo {
    /// Country / region / city text
    pub location: String,
    /// Network operator text
    pub owner: String,
}

impl IpInfo {
    /// Returns true if neither field carries text
    pub fn is_empty(&self) -> bool {
        self.location.is_empty() && self.owner.is_empty()
    }
}

/// Result of resolving one address
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LookupResult {
    /// The address as it was queried (or, for scans, the range start)
    pub ip: String,
    /// Resolved location and owner; empty when nothing matched
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub info: IpInfo,
}

impl LookupResult {
    /// A result carrying only the queried address
    pub fn empty(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            info: IpInfo::default(),
        }
    }
}

impl fmt::Display for LookupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.ip, self.info.location, self.info.owner)
    }
}

/// Size and index bounds of a loaded database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DatabaseStats {
    /// Buffer length in bytes
    pub size: usize,
    /// Number of index entries
    pub entry_count: usize,
    /// Byte offset of the first index entry
    pub index_start: u32,
    /// Byte offset of the last index entry
    pub index_end: u32,
}

/// Configuration for decoding record text
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Encoding of the record strings
    pub encoding: TextEncoding,
    /// Strip leading and trailing whitespace from decoded fields
    pub trim: bool,
}

impl DatabaseConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text encoding
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets whether decoded fields are trimmed
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

/// Loaded, read-only QQWry database
#[derive(Debug, Clone)]
pub struct Database {
    store: ByteStore,
    header: IndexHeader,
    config: DatabaseConfig,
}

impl Database {
    /// Validates `data` and wraps it without copying.
    ///
    /// Fails if the buffer cannot hold a header or if the header's index
    /// bounds are inconsistent with each other or with the buffer.
    pub fn load(data: impl Into<Bytes>) -> Result<Self> {
        let store = ByteStore::new(data);
        let header = IndexHeader::parse(&store)?;
        debug!(
            "Loaded database: {} bytes, {} entries (index {}..={})",
            store.len(),
            header.entry_count(),
            header.index_start(),
            header.index_end()
        );
        Ok(Self {
            store,
            header,
            config: DatabaseConfig::default(),
        })
    }

    /// Reads a database file into memory and loads it
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
        debug!("Read {} bytes from {}", data.len(), path.display());
        Self::load(data)
    }

    /// Replaces the decoding configuration
    pub fn with_config(mut self, config: DatabaseConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the decoding configuration
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Returns the validated header
    pub fn header(&self) -> IndexHeader {
        self.header
    }

    /// Number of index entries
    pub fn entry_count(&self) -> usize {
        self.header.entry_count()
    }

    /// Returns buffer size and index bounds
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            size: self.store.len(),
            entry_count: self.header.entry_count(),
            index_start: self.header.index_start(),
            index_end: self.header.index_end(),
        }
    }

    /// Returns the index entry at position `index`
    pub fn entry(&self, index: usize) -> Option<IndexEntry> {
        let offset = self.header.entry_offset(index)?;
        IndexEntry::read(&self.store, offset).ok()
    }

    /// Iterates over the raw index table in order
    pub fn entries(&self) -> Entries<'_> {
        Entries::new(&self.store, self.header)
    }

    /// Finds the index entry whose range covers `ip`
    pub fn find(&self, ip: u32) -> Option<IndexEntry> {
        match IndexSearcher::new(&self.store, self.header).search(ip) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("index search for {} failed: {}", Ipv4Addr::from(ip), e);
                None
            }
        }
    }

    /// Finds the record offset for `ip`.
    ///
    /// Returns `None` when the covering entry carries the null offset.
    pub fn find_offset(&self, ip: u32) -> Option<u32> {
        self.find(ip)
            .map(|entry| entry.record_offset)
            .filter(|&offset| offset != 0)
    }

    /// Decodes the record at `offset` into text.
    ///
    /// Offset `0` and unreadable fields produce empty strings.
    pub fn record(&self, offset: u32) -> IpInfo {
        if offset == 0 {
            return IpInfo::default();
        }
        let raw = RecordDecoder::new(&self.store).decode_lossy(offset);
        IpInfo {
            location: self.text(raw.location),
            owner: self.text(raw.owner),
        }
    }

    /// Resolves a numeric address
    pub fn lookup_ipv4(&self, addr: Ipv4Addr) -> IpInfo {
        match self.find_offset(u32::from(addr)) {
            Some(offset) => self.record(offset),
            None => {
                trace!("no record for {}", addr);
                IpInfo::default()
            }
        }
    }

    /// Resolves a dotted-quad address.
    ///
    /// Malformed input is echoed back with empty fields rather than failing.
    pub fn lookup(&self, ip: &str) -> LookupResult {
        match parse_ipv4(ip) {
            Ok(addr) => LookupResult {
                ip: ip.to_string(),
                info: self.lookup_ipv4(addr),
            },
            Err(e) => {
                debug!("{}", e);
                LookupResult::empty(ip)
            }
        }
    }

    /// Info of the final index entry, which QQWry files use to carry the
    /// publisher and release date
    pub fn version(&self) -> IpInfo {
        self.entry(self.entry_count() - 1)
            .map(|entry| self.record(entry.record_offset))
            .unwrap_or_default()
    }

    /// Starts a full scan over every index entry.
    ///
    /// Each call returns an independent iterator starting from the first
    /// entry.
    pub fn scan(&self) -> Scan<'_> {
        Scan::new(self)
    }

    fn text(&self, bytes: &[u8]) -> String {
        let text = self.config.encoding.decode(bytes);
        if self.config.trim {
            text.trim().to_string()
        } else {
            text.into_owned()
        }
    }
}

/// Parses a dotted-quad IPv4 address.
///
/// The input must contain exactly three dots and four decimal octets.
pub fn parse_ipv4(input: &str) -> Result<Ipv4Addr> {
    if input.matches('.').count() != 3 {
        return Err(Error::invalid_address(input));
    }
    input
        .parse::<Ipv4Addr>()
        .map_err(|_| Error::invalid_address(input))
}
