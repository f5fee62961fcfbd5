use std::sync::Arc;

use crate::error::{Error, Result};
use crate::piece::{BufferId, ADDED_BUFFER_ID};

/// Original chunks are split at load time to at most this many bytes
/// each.
pub(crate) const ORIGINAL_BUFFER_SIZE: usize = 65_536;

/// Starting capacity of the added buffer; it doubles from here as
/// content is appended.
pub(crate) const INITIAL_ADDED_CAPACITY: usize = 1_024;

/// Owns the buffer's backing memory: a list of immutable original
/// chunks (produced once, at load time) and one append-only added
/// buffer. Both are plain in-memory allocations — there's no
/// file-backed, mmap-cached original buffer or lock-free append list
/// here, since streaming very large files and concurrent writers are
/// explicit non-goals; the borrow checker alone already gives callers
/// the "don't retain a slice across a later mutation" contract for
/// `buffer_id == 0`, since `slice` borrows `&self` and growth needs
/// `&mut self`.
#[derive(Debug, Clone)]
pub(crate) struct BufferStore {
    original: Vec<Arc<[u8]>>,
    added: Vec<u8>,
}

impl BufferStore {
    pub fn new() -> BufferStore {
        BufferStore {
            original: Vec::new(),
            added: Vec::with_capacity(INITIAL_ADDED_CAPACITY),
        }
    }

    /// Split `text` into chunks of at most `ORIGINAL_BUFFER_SIZE` bytes
    /// and append them to the original chunk list. Returns the buffer id
    /// of the first chunk and the number of chunks created (0 if `text`
    /// is empty).
    pub fn load_original(&mut self, text: &[u8]) -> (BufferId, usize) {
        let first_id = self.original.len() as BufferId + 1;
        let mut count = 0;
        for chunk in text.chunks(ORIGINAL_BUFFER_SIZE) {
            self.original.push(Arc::from(chunk));
            count += 1;
        }
        (first_id, count)
    }

    /// Append `text` to the added buffer, growing its capacity by
    /// doubling when needed. Returns the start offset of `text` within
    /// the added buffer.
    pub fn append_added(&mut self, text: &[u8]) -> u64 {
        let start = self.added.len() as u64;
        let needed = self.added.len() + text.len();
        if needed > self.added.capacity() {
            let mut new_cap = self.added.capacity().max(INITIAL_ADDED_CAPACITY);
            while new_cap < needed {
                new_cap *= 2;
            }
            log::trace!(
                "growing added buffer: {} -> {new_cap} bytes ({} already written)",
                self.added.capacity(),
                self.added.len()
            );
            self.added.reserve(new_cap - self.added.len());
        }
        self.added.extend_from_slice(text);
        start
    }

    /// Borrow the byte range `[start, start+length)` of `buffer_id`.
    pub fn slice(&self, buffer_id: BufferId, start: u64, length: u64) -> Result<&[u8]> {
        let buf = self.buffer(buffer_id)?;
        let start = start as usize;
        let end = start + length as usize;
        buf.get(start..end).ok_or_else(|| {
            Error::OutOfRange(end as u64, buf.len() as u64)
        })
    }

    pub fn buffer_len(&self, buffer_id: BufferId) -> Result<u64> {
        Ok(self.buffer(buffer_id)?.len() as u64)
    }

    fn buffer(&self, buffer_id: BufferId) -> Result<&[u8]> {
        if buffer_id == ADDED_BUFFER_ID {
            Ok(&self.added)
        } else {
            self.original
                .get(buffer_id as usize - 1)
                .map(|chunk| chunk.as_ref())
                .ok_or_else(|| Error::InvalidArgument(format!("unknown buffer id {buffer_id}")))
        }
    }

    /// Drop all original chunks and reset the added buffer to empty,
    /// retaining its allocation (the delete-everything fast path).
    pub fn reset(&mut self) {
        self.original.clear();
        self.added.clear();
    }
}

impl Default for BufferStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_original_splits_into_chunks() {
        let mut store = BufferStore::new();
        let text = vec![b'a'; ORIGINAL_BUFFER_SIZE * 2 + 10];
        let (first_id, count) = store.load_original(&text);
        assert_eq!(first_id, 1);
        assert_eq!(count, 3);
        assert_eq!(store.buffer_len(1).unwrap(), ORIGINAL_BUFFER_SIZE as u64);
        assert_eq!(store.buffer_len(3).unwrap(), 10);
    }

    #[test]
    fn append_added_returns_start_offsets() {
        let mut store = BufferStore::new();
        let a = store.append_added(b"hello");
        let b = store.append_added(b" world");
        assert_eq!(a, 0);
        assert_eq!(b, 5);
        assert_eq!(store.slice(ADDED_BUFFER_ID, 0, 11).unwrap(), b"hello world");
    }

    #[test]
    fn slice_out_of_range_errors() {
        let mut store = BufferStore::new();
        store.append_added(b"ab");
        assert!(store.slice(ADDED_BUFFER_ID, 0, 5).is_err());
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = BufferStore::new();
        store.load_original(b"hello");
        store.append_added(b"world");
        store.reset();
        assert_eq!(store.buffer_len(ADDED_BUFFER_ID).unwrap(), 0);
        assert!(store.buffer(1).is_err());
    }
}
