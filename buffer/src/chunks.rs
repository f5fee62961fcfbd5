use std::ops::Range;

use crate::piece::Piece;
use crate::store::BufferStore;
use crate::tree::pieces::BoundedPieceIter;
use crate::tree::Tree;

/// One piece's worth of bytes, borrowed straight out of the backing
/// [`BufferStore`] — no copy.
pub(crate) type Chunk<'a> = &'a [u8];

/// Restartable, bidirectional iterator over the document's chunks (one
/// chunk per piece, or a fragment of one at a bound). The building block
/// `text()`, `text_range`, and the search sliding window are all built
/// from.
#[derive(Debug, Clone)]
pub(crate) struct Chunks<'a> {
    store: &'a BufferStore,
    pieces: BoundedPieceIter<'a>,
}

impl<'a> Chunks<'a> {
    #[inline]
    pub(crate) fn new(tree: &'a Tree, store: &'a BufferStore, len: u64, at: u64) -> Self {
        Chunks {
            store,
            pieces: BoundedPieceIter::new(tree, at, len),
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
        Chunks {
            store,
            pieces: BoundedPieceIter::new_bounded(tree, len, at, range),
        }
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<(u64, Chunk<'a>)> {
        let (pos, piece) = self.pieces.get()?;
        let chunk = read_piece(self.store, &piece)?;
        Some((pos, chunk))
    }

    #[inline]
    pub(crate) fn next(&mut self) -> Option<(u64, Chunk<'a>)> {
        let (pos, piece) = self.pieces.next()?;
        let chunk = read_piece(self.store, &piece)?;
        Some((pos, chunk))
    }

    #[inline]
    pub(crate) fn prev(&mut self) -> Option<(u64, Chunk<'a>)> {
        let (pos, piece) = self.pieces.prev()?;
        let chunk = read_piece(self.store, &piece)?;
        Some((pos, chunk))
    }
}

#[inline(always)]
fn read_piece<'a>(store: &'a BufferStore, piece: &Piece) -> Option<Chunk<'a>> {
    store.slice(piece.buffer_id, piece.start, piece.len).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::ADDED_BUFFER_ID;

    fn build() -> (Tree, BufferStore, u64) {
        let mut store = BufferStore::new();
        let mut tree = Tree::new();

        let s1 = store.append_added(b"foo");
        tree.insert(0, Piece::new(ADDED_BUFFER_ID, s1, 3, Vec::new()), false);
        let s2 = store.append_added(b"bar");
        tree.insert(3, Piece::new(ADDED_BUFFER_ID, s2, 3, Vec::new()), false);

        (tree, store, 6)
    }

    #[test]
    fn iterates_forward_and_backward() {
        let (tree, store, len) = build();
        let mut chunks = Chunks::new(&tree, &store, len, 0);

        assert_eq!(chunks.get(), Some((0, b"foo".as_ref())));
        assert_eq!(chunks.next(), Some((3, b"bar".as_ref())));
        assert_eq!(chunks.next(), None);

        assert_eq!(chunks.prev(), Some((3, b"bar".as_ref())));
        assert_eq!(chunks.prev(), Some((0, b"foo".as_ref())));
        assert_eq!(chunks.prev(), None);
    }
}
