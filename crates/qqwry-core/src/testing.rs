//! Builder for small synthetic databases used by the unit tests.

use crate::record::{REDIRECT_BOTH, REDIRECT_COUNTRY};

/// Placeholder for the end address stored at the head of every record
const RECORD_END_IP: [u8; 4] = [0xFF; 4];

/// Appends records, then lays out the index and patches the header
pub(crate) struct FixtureBuilder {
    data: Vec<u8>,
    entries: Vec<(u32, u32)>,
    sorted: bool,
}

impl FixtureBuilder {
    pub(crate) fn new() -> Self {
        Self {
            data: vec![0; 8],
            entries: Vec::new(),
            sorted: true,
        }
    }

    /// Appends raw bytes and returns where they start
    pub(crate) fn bytes(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(bytes);
        offset
    }

    /// Appends a nul-terminated string
    pub(crate) fn text(&mut self, text: &str) -> u32 {
        self.bytes(&cstr(text.as_bytes()))
    }

    /// Appends a record with inline location and owner
    pub(crate) fn direct(&mut self, location: &str, owner: &str) -> u32 {
        self.direct_bytes(location.as_bytes(), owner.as_bytes())
    }

    pub(crate) fn direct_bytes(&mut self, location: &[u8], owner: &[u8]) -> u32 {
        let mut record = RECORD_END_IP.to_vec();
        record.extend(cstr(location));
        record.extend(cstr(owner));
        self.bytes(&record)
    }

    /// Appends a 0x02 record; `owner` is the raw owner field at `offset + 8`
    pub(crate) fn redirect_both(&mut self, location_at: u32, owner: &[u8]) -> u32 {
        let mut record = RECORD_END_IP.to_vec();
        record.extend(redirect(REDIRECT_BOTH, location_at));
        record.extend_from_slice(owner);
        self.bytes(&record)
    }

    /// Appends a 0x01 record pointing at a country block
    pub(crate) fn redirect_country(&mut self, target: u32) -> u32 {
        let mut record = RECORD_END_IP.to_vec();
        record.extend(redirect(REDIRECT_COUNTRY, target));
        self.bytes(&record)
    }

    /// Adds an index entry; entries are sorted on build
    pub(crate) fn entry(&mut self, start_ip: u32, record_offset: u32) {
        self.entries.push((start_ip, record_offset));
    }

    /// Adds an index entry kept in insertion order
    pub(crate) fn entry_unsorted(&mut self, start_ip: u32, record_offset: u32) {
        self.sorted = false;
        self.entries.push((start_ip, record_offset));
    }

    pub(crate) fn build(mut self) -> Vec<u8> {
        assert!(!self.entries.is_empty(), "fixture needs at least one entry");
        if self.sorted {
            self.entries.sort_unstable();
        }

        let index_start = self.data.len() as u32;
        let index_end = index_start + 7 * (self.entries.len() as u32 - 1);
        for &(ip, offset) in &self.entries {
            self.data.extend_from_slice(&ip.to_le_bytes());
            self.data.extend_from_slice(&offset.to_le_bytes()[..3]);
        }
        self.data[0..4].copy_from_slice(&index_start.to_le_bytes());
        self.data[4..8].copy_from_slice(&index_end.to_le_bytes());
        self.data
    }
}

/// A nul-terminated copy of `bytes`
pub(crate) fn cstr(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out.push(0);
    out
}

/// A tag byte followed by a 3-byte little-endian pointer
pub(crate) fn redirect(tag: u8, target: u32) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&target.to_le_bytes()[..3]);
    out
}
