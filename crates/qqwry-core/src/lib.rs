//! # qqwry-core
//!
//! A library for decoding and querying QQWry (纯真) IPv4 location databases.
//!
//! This crate provides the core functionality for:
//! - Validating a database buffer and its index header
//! - Binary searching the index for the range covering an address
//! - Following the record region's redirect pointers to the location and
//!   owner strings
//! - Decoding GBK text and walking the whole index for bulk export
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`store`]: Bounds-checked reads over the shared buffer
//! - [`index`]: Header validation and index binary search
//! - [`record`]: Record decoding and redirect resolution
//! - [`text`]: GBK / UTF-8 text decoding
//! - [`scan`]: Full-index iterators with early stop
//! - [`database`]: The [`Database`] handle tying them together
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use qqwry_core::{Database, DatabaseConfig};
//!
//! let db = Database::open("./data/qqwry.dat")?
//!     .with_config(DatabaseConfig::new().trim(true));
//!
//! let result = db.lookup("223.247.9.0");
//! println!("{}: {} / {}", result.ip, result.info.location, result.info.owner);
//!
//! for result in db.scan().take(10) {
//!     println!("{result}");
//! }
//! # Ok::<(), qqwry_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod database;
pub mod error;
pub mod index;
pub mod record;
pub mod scan;
pub mod store;
pub mod text;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience
pub use database::{parse_ipv4, Database, DatabaseConfig, DatabaseStats, IpInfo, LookupResult};
pub use error::{Error, Result};
pub use index::{IndexEntry, IndexHeader, INDEX_LEN};
pub use scan::{Entries, Scan, StopHandle};
pub use text::TextEncoding;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
