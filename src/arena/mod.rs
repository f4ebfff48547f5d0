//! Append-only byte arena backing all key and value storage.
//!
//! The arena is a single contiguous buffer. Appends return the offset at
//! which the bytes were written, and offsets stay valid for the lifetime
//! of the arena even though the backing allocation may move on growth.
//! Nothing is ever freed; dead bytes from updates and deletes remain
//! until the whole arena is dropped.

use tracing::debug;

/// Growable append-only byte buffer.
///
/// The index layer stores integer offsets into this buffer, never
/// references, so growth is free to reallocate.
pub struct Arena {
    buf: Vec<u8>,
}

impl Arena {
    /// Creates an arena with the given initial physical capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Appends `key` followed by `value`, returning the offset at which
    /// the key bytes begin.
    ///
    /// If the combined length would exceed the current capacity, the
    /// arena reallocates to at least twice the new total length, so a
    /// run of appends costs amortized O(1) per byte.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> usize {
        let offset = self.buf.len();
        let total = offset + key.len() + value.len();
        if total > self.buf.capacity() {
            self.grow(total);
        }
        self.buf.extend_from_slice(key);
        self.buf.extend_from_slice(value);
        offset
    }

    fn grow(&mut self, total: usize) {
        let mut next = Vec::with_capacity(total * 2);
        next.extend_from_slice(&self.buf);
        debug!(
            len = self.buf.len(),
            old_capacity = self.buf.capacity(),
            new_capacity = next.capacity(),
            "growing arena"
        );
        self.buf = next;
    }

    /// Borrows `len` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range was never written. The index layer only asks
    /// for ranges it recorded from [`Arena::append`].
    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.buf[offset..offset + len]
    }

    /// Logical length: total bytes appended so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Spare physical capacity before the next reallocation.
    pub fn available(&self) -> usize {
        self.buf.capacity() - self.buf.len()
    }
}
