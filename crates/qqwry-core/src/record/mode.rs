//! Redirect tags of the record region.
//!
//! A field either holds nul-terminated text directly or starts with one of
//! two tag bytes followed by a 3-byte little-endian pointer:
//!
//! - `0x01`: the location (and everything after it) lives at the pointer
//! - `0x02`: only the location text lives at the pointer; the owner field
//!   follows the 4-byte redirect in place

/// Tag byte: location and owner both continue at the pointer target
pub const REDIRECT_COUNTRY: u8 = 0x01;

/// Tag byte: only the location text is at the pointer target
pub const REDIRECT_BOTH: u8 = 0x02;

/// Size of a redirect field: tag byte + 3-byte pointer
pub const REDIRECT_LEN: usize = 4;

/// How the field at a given position is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    /// Inline nul-terminated text
    Direct,
    /// Tag `0x01`: location block stored elsewhere
    RedirectCountry,
    /// Tag `0x02`: location text stored elsewhere
    RedirectBoth,
}

impl RecordMode {
    /// Returns true for either redirect tag
    pub fn is_redirect(self) -> bool {
        !matches!(self, RecordMode::Direct)
    }
}

impl From<u8> for RecordMode {
    fn from(tag: u8) -> Self {
        match tag {
            REDIRECT_COUNTRY => RecordMode::RedirectCountry,
            REDIRECT_BOTH => RecordMode::RedirectBoth,
            _ => RecordMode::Direct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_tag() {
        assert_eq!(RecordMode::from(0x01), RecordMode::RedirectCountry);
        assert_eq!(RecordMode::from(0x02), RecordMode::RedirectBoth);
        assert_eq!(RecordMode::from(0x00), RecordMode::Direct);
        assert_eq!(RecordMode::from(0xD6), RecordMode::Direct);
        assert!(RecordMode::RedirectBoth.is_redirect());
        assert!(!RecordMode::Direct.is_redirect());
    }
}
