//! Bridges the piece-tree's chunk iterator to `regex_cursor::Cursor` so the
//! `regex-cursor` / `regex-automata` engines can run directly over piecewise
//! content without materializing it. Grounded in `PTRegexCursor` from the
//! teacher's `core/src/search.rs`.

use crate::chunks::{Chunk, Chunks};
use crate::piece_tree::PieceTree;

pub(crate) struct TreeCursor<'a> {
    len: u64,
    chunks: Chunks<'a>,
    chunk: Option<(u64, Chunk<'a>)>,
}

impl<'a> TreeCursor<'a> {
    /// A cursor over `range`, positioned at `range.start` (`regex-cursor`
    /// always begins scanning from offset 0 of the range it's given).
    pub(crate) fn new(pt: &'a PieceTree, range: std::ops::Range<u64>) -> Self {
        let len = range.end - range.start;
        let mut chunks = pt.chunks_range(range);
        let chunk = chunks.get();
        TreeCursor { len, chunks, chunk }
    }
}

impl<'a> regex_cursor::Cursor for TreeCursor<'a> {
    fn chunk(&self) -> &[u8] {
        match &self.chunk {
            Some((_, chunk)) => chunk,
            None => &[],
        }
    }

    fn advance(&mut self) -> bool {
        if let Some(chunk) = self.chunks.next() {
            self.chunk = Some(chunk);
            true
        } else {
            false
        }
    }

    fn backtrack(&mut self) -> bool {
        if let Some(chunk) = self.chunks.prev() {
            self.chunk = Some(chunk);
            true
        } else {
            false
        }
    }

    fn total_bytes(&self) -> Option<usize> {
        Some(self.len as usize)
    }

    fn offset(&self) -> usize {
        match &self.chunk {
            Some((pos, _)) => *pos as usize,
            None => 0,
        }
    }

    fn utf8_aware(&self) -> bool {
        false
    }
}
