//! Sequential walks over the index table.
//!
//! [`Entries`] yields the raw index rows; [`Scan`] resolves each row into a
//! [`LookupResult`]. Both are plain pull-based iterators holding their own
//! position, so any number of them can run over one database at once.
//!
//! A scan can be stopped early from the consuming side with [`Scan::stop`],
//! or from elsewhere through a [`StopHandle`]:
//!
//! ```no_run
//! use qqwry_core::Database;
//!
//! let db = Database::open("./data/qqwry.dat")?;
//! let mut scan = db.scan();
//! let handle = scan.stop_handle();
//!
//! std::thread::scope(|s| {
//!     s.spawn(move || {
//!         std::thread::sleep(std::time::Duration::from_secs(1));
//!         handle.stop();
//!     });
//!     for result in scan.by_ref() {
//!         println!("{result}");
//!     }
//! });
//! # Ok::<(), qqwry_core::Error>(())
//! ```

use crate::database::{Database, LookupResult};
use crate::index::{IndexEntry, IndexHeader};
use crate::store::ByteStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Iterator over the rows of the index table, in file order
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    store: &'a ByteStore,
    header: IndexHeader,
    next: usize,
}

impl<'a> Entries<'a> {
    pub(crate) fn new(store: &'a ByteStore, header: IndexHeader) -> Self {
        Self {
            store,
            header,
            next: 0,
        }
    }
}

impl Iterator for Entries<'_> {
    type Item = IndexEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.header.entry_offset(self.next)?;
        self.next += 1;
        match IndexEntry::read(self.store, offset) {
            Ok(entry) => Some(entry),
            Err(e) => {
                // Unreachable for a validated header
                warn!("index entry at {offset}: {e}");
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.header.entry_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Entries<'_> {}

/// Cloneable flag that ends a [`Scan`] from another thread
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// Requests the scan to end before its next item
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// Returns true once [`stop`](Self::stop) has been called
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// Full scan resolving every index entry into a [`LookupResult`].
///
/// The `ip` of each result is the start address of the entry's range.
/// Results come out in index order, which is ascending by address.
#[derive(Debug)]
pub struct Scan<'a> {
    db: &'a Database,
    entries: Entries<'a>,
    stop: StopHandle,
    yielded: usize,
}

impl<'a> Scan<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self {
            db,
            entries: db.entries(),
            stop: StopHandle::default(),
            yielded: 0,
        }
    }

    /// Ends the scan; subsequent calls to `next` return `None`
    pub fn stop(&mut self) {
        self.stop.stop();
    }

    /// Returns a handle that can end this scan from elsewhere
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Number of results produced so far
    pub fn yielded(&self) -> usize {
        self.yielded
    }
}

impl Iterator for Scan<'_> {
    type Item = LookupResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stop.is_stopped() {
            debug!("scan stopped after {} entries", self.yielded);
            return None;
        }
        let entry = self.entries.next()?;
        self.yielded += 1;
        Some(LookupResult {
            ip: entry.start_addr().to_string(),
            info: self.db.record(entry.record_offset),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.stop.is_stopped() {
            return (0, Some(0));
        }
        (0, self.entries.size_hint().1)
    }
}
