//! Record decoding.
//!
//! A record starts with the 4-byte end address of its range, followed by the
//! location field and the owner field. Both fields may be redirected
//! elsewhere in the buffer (see [`RecordMode`]).
//!
//! ## Resolution
//!
//! Location resolution is a small state machine:
//!
//! ```text
//! Record(offset+4) --0x01--> Country(ptr) --0x02--> Text(ptr', owner at ptr+4)
//!        |                        \--other--> Text(ptr, owner after text)
//!        |--0x02--> Text(ptr, owner at offset+8)
//!        \--other--> Text(offset+4, owner after text)
//! ```
//!
//! Each pointer followed is one hop and the walk stops after
//! [`MAX_HOPS`]. The owner field allows a single redirect, with a null
//! pointer meaning "no owner".

mod mode;

use crate::error::{Error, Result};
use crate::store::ByteStore;
use tracing::debug;

pub use mode::{RecordMode, REDIRECT_BOTH, REDIRECT_COUNTRY, REDIRECT_LEN};

/// Maximum number of pointers followed while resolving a location
pub const MAX_HOPS: usize = 2;

/// Bytes of end address preceding the fields of every record
const RECORD_IP_LEN: usize = 4;

/// Location and owner bytes of one record, still in the file's encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawRecord<'a> {
    /// Location (country / region) text
    pub location: &'a [u8],
    /// Owner (network operator) text
    pub owner: &'a [u8],
}

/// A resolved location and the position of the owner field that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    /// Location text
    pub text: &'a [u8],
    /// Position of the owner field belonging to this record
    pub owner_pos: usize,
}

/// Where the owner field sits relative to the location text
#[derive(Debug, Clone, Copy)]
enum OwnerAt {
    AfterText,
    At(usize),
}

#[derive(Debug, Clone, Copy)]
enum State {
    /// Location field of the record itself
    Record(usize),
    /// Location block reached through a 0x01 redirect
    Country(usize),
    /// Inline location text
    Text { at: usize, owner: OwnerAt },
}

/// Decodes records out of a shared [`ByteStore`]
#[derive(Debug, Clone, Copy)]
pub struct RecordDecoder<'a> {
    store: &'a ByteStore,
}

impl<'a> RecordDecoder<'a> {
    /// Creates a decoder over `store`
    pub fn new(store: &'a ByteStore) -> Self {
        Self { store }
    }

    fn mode(&self, pos: usize) -> Result<RecordMode> {
        Ok(RecordMode::from(self.store.read_u8(pos)?))
    }

    /// Reads the pointer that follows the tag byte at `tag_pos`
    fn pointer(&self, tag_pos: usize) -> Result<usize> {
        Ok(self.store.read_u24(tag_pos + 1)? as usize)
    }

    /// Resolves the location of the record at `offset`
    pub fn location(&self, offset: u32) -> Result<Location<'a>> {
        let record = offset as usize;
        let mut state = State::Record(record + RECORD_IP_LEN);

        for _ in 0..=MAX_HOPS {
            state = match state {
                State::Record(pos) => match self.mode(pos)? {
                    RecordMode::Direct => State::Text {
                        at: pos,
                        owner: OwnerAt::AfterText,
                    },
                    RecordMode::RedirectBoth => State::Text {
                        at: self.pointer(pos)?,
                        owner: OwnerAt::At(record + RECORD_IP_LEN + REDIRECT_LEN),
                    },
                    RecordMode::RedirectCountry => State::Country(self.pointer(pos)?),
                },
                State::Country(pos) => match self.mode(pos)? {
                    RecordMode::RedirectBoth => State::Text {
                        at: self.pointer(pos)?,
                        owner: OwnerAt::At(pos + REDIRECT_LEN),
                    },
                    _ => State::Text {
                        at: pos,
                        owner: OwnerAt::AfterText,
                    },
                },
                State::Text { at, owner } => {
                    let text = self.store.read_cstring(at)?;
                    let owner_pos = match owner {
                        OwnerAt::AfterText => at + text.len() + 1,
                        OwnerAt::At(pos) => pos,
                    };
                    return Ok(Location { text, owner_pos });
                }
            };
        }

        Err(Error::RedirectLimit {
            offset,
            max_hops: MAX_HOPS,
        })
    }

    /// Reads the owner field at `pos`
    pub fn owner(&self, pos: usize) -> Result<&'a [u8]> {
        if !self.mode(pos)?.is_redirect() {
            return self.store.read_cstring(pos);
        }
        match self.pointer(pos)? {
            0 => Ok(&[]),
            target => self.store.read_cstring(target),
        }
    }

    /// Decodes both fields, failing on the first bad read
    pub fn decode(&self, offset: u32) -> Result<RawRecord<'a>> {
        let location = self.location(offset)?;
        Ok(RawRecord {
            location: location.text,
            owner: self.owner(location.owner_pos)?,
        })
    }

    /// Decodes both fields, emptying any field that cannot be read.
    ///
    /// A broken location leaves the owner empty too, since its position
    /// is only known once the location has been resolved.
    pub fn decode_lossy(&self, offset: u32) -> RawRecord<'a> {
        let location = match self.location(offset) {
            Ok(location) => location,
            Err(e) => {
                debug!("record at {offset}: unreadable location: {e}");
                return RawRecord::default();
            }
        };
        let owner = self.owner(location.owner_pos).unwrap_or_else(|e| {
            debug!("record at {offset}: unreadable owner: {e}");
            &[]
        });
        RawRecord {
            location: location.text,
            owner,
        }
    }
}
