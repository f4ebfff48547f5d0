//! # skipkv
//!
//! An ordered in-memory key-value store built on a probabilistic skip
//! list over a single growable byte arena.
//!
//! Keys and values are opaque byte strings. Lookup, insertion, update,
//! and deletion are logarithmic-expected in the number of distinct
//! keys. The store is meant to be the mutable in-memory tier of a
//! larger storage stack: cheap writes and point reads, plus the
//! accounting (live byte size, entry count, spare arena capacity) a
//! surrounding layer needs to decide when to flush or roll the
//! table.
//!
//! The index holds integer offsets into the arena rather than pointers
//! or borrowed views, so the arena is free to reallocate as it grows.
//! A single readers-writer lock guards the whole store: writers
//! serialize while readers run concurrently. Nothing is reclaimed
//! until the store is dropped.
//!
//! ## Example
//!
//! ```rust
//! use skipkv::Store;
//!
//! let store = Store::new();
//! store.write(b"hello", b"world").unwrap();
//!
//! assert_eq!(store.read(b"hello").unwrap(), b"world");
//! assert_eq!(store.entry_count(), 1);
//! assert_eq!(store.live_size(), 10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod arena;
mod skiplist;

#[cfg(test)]
mod proptests;

use parking_lot::RwLock;
use thiserror::Error;

use skiplist::SkipList;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by store operations.
///
/// The taxonomy is flat: bad input and absence. Allocation failure is
/// fatal and not part of the recoverable domain.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The caller passed an empty key.
    #[error("missing key parameter")]
    MissingKey,
    /// The key is not present in the table.
    #[error("key not found")]
    KeyNotFound,
}

/// Configuration for constructing a [`Store`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial physical capacity of the byte arena. The arena starts
    /// logically empty and grows past this without bound.
    pub capacity: usize,
    /// Seed for the tower-height generator. The default keeps height
    /// sequences identical across runs; override it only when that
    /// reproducibility is unwanted.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 2048,
            seed: skiplist::DEFAULT_SEED,
        }
    }
}

/// Thread-safe ordered byte-key store.
///
/// A [`Store`] wraps the skip-list index in a single
/// [`parking_lot::RwLock`]. [`write`](Store::write) takes the
/// exclusive guard; reads and accounting take the shared guard, so any
/// number of readers proceed in parallel while no writer is active.
/// Input validation happens before the lock is touched, and every
/// operation either fully applies or leaves the store unchanged.
pub struct Store {
    inner: RwLock<SkipList>,
}

impl Store {
    /// Creates a store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a store with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: RwLock::new(SkipList::new(&config)),
        }
    }

    /// Inserts `key` with `value`, or replaces the value if the key is
    /// already present. Replacement leaves the entry count unchanged.
    ///
    /// Fails with [`StoreError::MissingKey`] if `key` is empty.
    pub fn write(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::MissingKey);
        }
        self.inner.write().write(key, value);
        Ok(())
    }

    /// Returns a copy of the value stored under `key`.
    ///
    /// The index hands out slices borrowed from the arena, but such a
    /// borrow is only valid while the read guard is held, so the public
    /// surface returns an owned copy instead.
    ///
    /// Fails with [`StoreError::MissingKey`] if `key` is empty and
    /// [`StoreError::KeyNotFound`] if the key is absent.
    pub fn read(&self, key: &[u8]) -> Result<Vec<u8>> {
        if key.is_empty() {
            return Err(StoreError::MissingKey);
        }
        self.inner
            .read()
            .get(key)
            .map(<[u8]>::to_vec)
            .ok_or(StoreError::KeyNotFound)
    }

    /// True if `key` is present. Never allocates.
    #[allow(dead_code)]
    pub(crate) fn contains(&self, key: &[u8]) -> bool {
        !key.is_empty() && self.inner.read().contains(key)
    }

    /// Removes `key` from the table.
    ///
    /// Part of the core contract but deliberately not public yet; the
    /// surrounding stack discards whole tables instead of deleting
    /// through them.
    #[allow(dead_code)]
    pub(crate) fn delete(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::MissingKey);
        }
        if self.inner.write().delete(key) {
            Ok(())
        } else {
            Err(StoreError::KeyNotFound)
        }
    }

    /// Spare arena capacity, in bytes, before the next reallocation.
    pub fn available(&self) -> usize {
        self.inner.read().available()
    }

    /// Total key plus value bytes across live entries. Dead bytes from
    /// updates and deletes are not counted, so this can diverge far
    /// below the arena length; that divergence is the caller's signal
    /// to roll the table.
    pub fn live_size(&self) -> usize {
        self.inner.read().live_size()
    }

    /// Number of live distinct keys.
    pub fn entry_count(&self) -> usize {
        self.inner.read().entry_count()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
