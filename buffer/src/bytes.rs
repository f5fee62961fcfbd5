use std::ops::Range;

use crate::chunks::{Chunk, Chunks};
use crate::store::BufferStore;
use crate::tree::Tree;

/// Byte-at-a-time cursor built on top of [`Chunks`], used by line/column
/// scans and literal search where piece boundaries should be invisible
/// to the caller.
#[derive(Debug, Clone)]
pub(crate) struct Bytes<'a> {
    range: Range<u64>,
    chunks: Chunks<'a>,
    chunk: Option<Chunk<'a>>,
    chunk_pos: u64,
    chunk_len: u64,
    pos: u64, // position relative to the current chunk
}

impl<'a> Bytes<'a> {
    #[inline]
    pub(crate) fn new(tree: &'a Tree, store: &'a BufferStore, len: u64, at: u64) -> Self {
        let chunks = Chunks::new(tree, store, len, at);
        let chunk = chunks.get();
        let pos = chunk.as_ref().map(|(pos, _)| at - pos).unwrap_or(0);
        let chunk_pos = chunk.as_ref().map(|(p, _)| *p).unwrap_or(len);
        let chunk_len = chunk.as_ref().map(|(_, c)| c.len() as u64).unwrap_or(0);
        let chunk = chunk.map(|(_, c)| c);
        Bytes {
            chunks,
            chunk,
            chunk_pos,
            chunk_len,
            pos,
            range: 0..len,
        }
    }

    #[inline]
    pub(crate) fn new_bounded(
        tree: &'a Tree,
        store: &'a BufferStore,
        len: u64,
        at: u64,
        range: Range<u64>,
    ) -> Self {
        let chunks = Chunks::new_bounded(tree, store, len, at, range.clone());
        let chunk = chunks.get();
        let chunk_pos = chunk
            .as_ref()
            .map(|(p, _)| *p)
            .unwrap_or(range.end - range.start);
        let pos = chunk.as_ref().map(|(pos, _)| at - pos).unwrap_or(0);
        let chunk_len = chunk.as_ref().map(|(_, c)| c.len() as u64).unwrap_or(0);
        let chunk = chunk.map(|(_, c)| c);
        Bytes {
            chunks,
            chunk,
            chunk_pos,
            chunk_len,
            pos,
            range,
        }
    }

    #[inline]
    pub(crate) fn next(&mut self) -> Option<u8> {
        if self.pos >= self.chunk_len {
            self.pos = 0;
            let (chunk, pos, len) = self
                .chunks
                .next()
                .map(|(pos, chunk)| (Some(chunk), pos, chunk.len() as u64))
                .unwrap_or((None, self.range.end - self.range.start, 0));
            self.chunk = chunk;
            self.chunk_pos = pos;
            self.chunk_len = len;
        }

        let chunk = self.chunk?;
        let byte = chunk[self.pos as usize];
        self.pos += 1;
        Some(byte)
    }

    #[inline]
    pub(crate) fn prev(&mut self) -> Option<u8> {
        if self.pos != 0 {
            self.pos -= 1;
        } else {
            let (pos, chunk) = self.chunks.prev()?;
            let len = chunk.len() as u64;
            self.pos = len.saturating_sub(1);
            self.chunk_pos = pos;
            self.chunk_len = len;
            self.chunk = Some(chunk);
        }

        let chunk = self.chunk?;
        Some(chunk[self.pos as usize])
    }

    #[inline]
    pub(crate) fn pos(&self) -> u64 {
        self.chunk_pos + self.pos
    }

    /// Random-access read at absolute position `pos` (relative to this
    /// cursor's range start), reseeking the cursor there first. Used by
    /// the Boyer-Moore-Horspool searcher, which jumps back and forth
    /// across the window while probing for a match.
    pub(crate) fn byte_at(&mut self, pos: u64) -> u8 {
        let spos = self.pos();

        if spos == pos {
            return self.next().unwrap();
        }

        if spos != 0 && spos - 1 == pos {
            return self.prev().unwrap();
        }

        while self.pos() < pos {
            self.next();
        }
        while self.pos() > pos {
            self.prev();
        }

        self.next().unwrap()
    }
}
