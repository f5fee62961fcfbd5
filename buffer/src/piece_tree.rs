use crate::bytes::Bytes;
use crate::chunks::Chunks;
use crate::eol;
use crate::error::{Error, Result};
use crate::piece::{Piece, ADDED_BUFFER_ID};
use crate::store::BufferStore;
use crate::tree::Tree;

/// The piece-tree itself: an augmented red-black tree of pieces plus the
/// buffer memory they point into. This is the structure CoordinateMap,
/// Editor, and SearchEngine all read and mutate; `Document` (crate::lib)
/// layers EOL policy, history, and snapshots on top of it.
#[derive(Debug, Clone)]
pub(crate) struct PieceTree {
    pub(crate) tree: Tree,
    pub(crate) store: BufferStore,
    len: u64,
}

impl PieceTree {
    pub fn new() -> PieceTree {
        PieceTree {
            tree: Tree::new(),
            store: BufferStore::new(),
            len: 0,
        }
    }

    /// Build a piece-tree whose initial content is `text`, split into
    /// original chunks at load time.
    pub fn from_bytes(text: &[u8]) -> PieceTree {
        let mut pt = PieceTree::new();
        if text.is_empty() {
            return pt;
        }

        let (first_id, count) = pt.store.load_original(text);
        let mut offset_in_text = 0u64;
        let mut pos = 0u64;
        for i in 0..count {
            let chunk_len = std::cmp::min(
                crate::store::ORIGINAL_BUFFER_SIZE as u64,
                text.len() as u64 - offset_in_text,
            );
            let chunk_bytes = &text[offset_in_text as usize..(offset_in_text + chunk_len) as usize];
            let line_starts = eol::compute_line_starts(chunk_bytes);
            let piece = Piece::new(first_id + i as u32, 0, chunk_len, line_starts);
            pt.tree.insert(pos, piece, false);
            pos += chunk_len;
            offset_in_text += chunk_len;
        }
        pt.len = pos;
        pt
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bytes_at(&self, at: u64) -> Bytes<'_> {
        Bytes::new(&self.tree, &self.store, self.len, at)
    }

    pub fn chunks_at(&self, at: u64) -> Chunks<'_> {
        Chunks::new(&self.tree, &self.store, self.len, at)
    }

    /// Chunks over `range`, positions reported relative to `range.start`.
    /// Building block for the search cursor.
    pub fn chunks_range(&self, range: std::ops::Range<u64>) -> Chunks<'_> {
        Chunks::new_bounded(&self.tree, &self.store, self.len, range.start, range)
    }

    /// Bytes over `range`, positions reported relative to `range.start`.
    pub fn bytes_range(&self, at: u64, range: std::ops::Range<u64>) -> Bytes<'_> {
        Bytes::new_bounded(&self.tree, &self.store, self.len, at, range)
    }

    /// Number of pieces (tree nodes) currently in the document. Exposed
    /// for tests and benchmarks.
    pub fn piece_count(&self) -> usize {
        self.tree.node_count
    }

    /// Materialize `[start, end)` into an owned byte vector. Used by
    /// `text_range`, `line_content`, and the search window builder.
    pub fn slice_bytes(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        if start > end || end > self.len {
            return Err(Error::OutOfRange(end, self.len));
        }

        let mut out = Vec::with_capacity((end - start) as usize);
        let mut chunks = crate::chunks::Chunks::new_bounded(
            &self.tree,
            &self.store,
            self.len,
            start,
            start..end,
        );
        while let Some((_, bytes)) = chunks.get() {
            out.extend_from_slice(bytes);
            if chunks.next().is_none() {
                break;
            }
        }
        Ok(out)
    }

    /// Insert `text` (already EOL-normalized by the caller) so that its
    /// first byte lands at document offset `at`.
    pub fn insert(&mut self, at: u64, text: &[u8]) -> Result<()> {
        if at > self.len {
            return Err(Error::OutOfRange(at, self.len));
        }
        if text.is_empty() {
            return Ok(());
        }

        let start = self.store.append_added(text);
        let line_starts = eol::compute_line_starts(text);
        let piece = Piece::new(ADDED_BUFFER_ID, start, text.len() as u64, line_starts);
        self.tree.insert(at, piece, true);
        self.len += text.len() as u64;
        Ok(())
    }

    /// Remove `[start, end)`.
    pub fn remove(&mut self, start: u64, end: u64) -> Result<()> {
        if start > end || end > self.len {
            return Err(Error::OutOfRange(end, self.len));
        }
        if start == end {
            return Ok(());
        }

        if start == 0 && end == self.len {
            self.tree = Tree::new();
            self.store.reset();
            self.len = 0;
            return Ok(());
        }

        self.tree.remove(start..end);
        self.len -= end - start;
        Ok(())
    }
}

impl Default for PieceTree {
    fn default() -> Self {
        Self::new()
    }
}
