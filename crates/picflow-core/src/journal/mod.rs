//! Failure journal: albums whose most recent attempt failed.
//!
//! The journal is an in-memory map keyed by album id, holding the minimized
//! album (no headers, no payload). Workers record failures and remove ids
//! that succeed on retry; the map is written to disk as pretty JSON by
//! [`FailureJournal::flush`], periodically and at shutdown. One journal is
//! opened per process and shared by `Arc`.

mod error;
mod flush;
mod persist;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::album::Album;

pub use error::JournalError;
pub use flush::spawn_periodic_flush;

#[derive(Debug, Default)]
struct Entries {
    albums: BTreeMap<String, Album>,
    /// Bumped on every mutation; compared against `FailureJournal::flushed`.
    generation: u64,
}

/// Lock-guarded failure index backed by a JSON file.
#[derive(Debug)]
pub struct FailureJournal {
    path: PathBuf,
    entries: Mutex<Entries>,
    /// Serializes writers so an older snapshot never lands after a newer one.
    write_lock: Mutex<()>,
    flushed: AtomicU64,
}

impl FailureJournal {
    fn with_albums(path: PathBuf, albums: BTreeMap<String, Album>) -> Self {
        Self {
            path,
            entries: Mutex::new(Entries {
                albums,
                generation: 0,
            }),
            write_lock: Mutex::new(()),
            flushed: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// File this journal flushes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current failures.
    pub fn get(&self) -> BTreeMap<String, Album> {
        self.lock().albums.clone()
    }

    /// Record a failed album (minimized), replacing any earlier entry for its id.
    pub fn record(&self, album: &Album) {
        let snapshot = album.minimized();
        let mut entries = self.lock();
        entries.albums.insert(snapshot.id.clone(), snapshot);
        entries.generation += 1;
    }

    /// Forget `id`. No-op when absent. Returns whether an entry was removed.
    pub fn remove(&self, id: &str) -> bool {
        let mut entries = self.lock();
        let removed = entries.albums.remove(id).is_some();
        if removed {
            entries.generation += 1;
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().albums.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().albums.is_empty()
    }

    /// Every journaled album, flagged as a retry, ordered by (tag, id).
    pub fn retry_albums(&self) -> Vec<Album> {
        let mut albums: Vec<Album> = self
            .lock()
            .albums
            .values()
            .cloned()
            .map(Album::into_retry)
            .collect();
        albums.sort_by(|a, b| (&a.tag, &a.id).cmp(&(&b.tag, &b.id)));
        albums
    }

    /// True when the in-memory map changed since the last successful flush.
    pub fn is_dirty(&self) -> bool {
        self.lock().generation != self.flushed.load(Ordering::Acquire)
    }
}
