//! Text decoding for location and owner fields.
//!
//! QQWry files store their strings in GBK. Decoding is always lossy:
//! malformed sequences become U+FFFD so a bad field never fails a lookup.

use encoding_rs::{Encoding, GBK, UTF_8};
use std::borrow::Cow;
use tracing::trace;

/// Character encoding of the strings stored in the record region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// GBK, the encoding used by published QQWry files.
    ///
    /// Decoding uses the GB18030 decoder, so four-byte GB18030 sequences
    /// also come out intact.
    #[default]
    Gbk,
    /// UTF-8, for re-encoded databases
    Utf8,
}

impl TextEncoding {
    fn encoding(self) -> &'static Encoding {
        match self {
            TextEncoding::Gbk => GBK,
            TextEncoding::Utf8 => UTF_8,
        }
    }

    /// Returns the canonical label of this encoding
    pub fn name(self) -> &'static str {
        self.encoding().name()
    }

    /// Decodes `bytes`, replacing malformed sequences
    pub fn decode(self, bytes: &[u8]) -> Cow<'_, str> {
        let (text, had_errors) = self.encoding().decode_without_bom_handling(bytes);
        if had_errors {
            trace!("lossy {} decode of {} bytes", self.name(), bytes.len());
        }
        text
    }
}
