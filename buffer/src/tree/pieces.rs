use std::ops::Range;

use super::node::internal_node::InternalNode;
use super::node::Node;
use super::Tree;
use crate::piece::Piece;

/// In-order piece iterator, restartable and finite.
/// Holds the root-to-current-node ancestor stack so both directions can
/// step in amortized O(1) without parent pointers — the Okasaki-style
/// `Arc<Node>` tree has none.
#[derive(Debug, Clone)]
pub(crate) struct PieceIter<'a> {
    tree: &'a Tree,
    len: u64,
    stack: Vec<&'a InternalNode>,
    pos: u64,
}

impl<'a> PieceIter<'a> {
    #[inline]
    pub(crate) fn new(tree: &'a Tree, at: u64, len: u64) -> Self {
        let (stack, pos) = if at == len {
            (Vec::with_capacity(tree.max_height()), at)
        } else {
            tree.find_node(at)
        };
        PieceIter {
            tree,
            len,
            stack,
            pos,
        }
    }

    fn tree_next(&mut self) -> Option<&Piece> {
        let mut node = *self.stack.last()?;

        if let Node::Internal(right) = node.right.as_ref() {
            self.stack.push(right);
            node = right;

            while let Node::Internal(left) = node.left.as_ref() {
                self.stack.push(left);
                node = left;
            }

            Some(&node.piece)
        } else {
            self.stack.pop()?;

            while !self.stack.is_empty() {
                let left = self.stack.last()?.left.as_ref();

                if left
                    .internal_ref()
                    .map_or(false, |left| std::ptr::eq(left, node))
                {
                    return Some(&self.stack.last()?.piece);
                }

                node = self.stack.pop()?;
            }

            None
        }
    }

    fn tree_prev(&mut self) -> Option<&Piece> {
        let mut node = *self.stack.last()?;

        if let Node::Internal(left) = node.left.as_ref() {
            self.stack.push(left);
            node = left;

            while let Node::Internal(right) = node.right.as_ref() {
                self.stack.push(right);
                node = right;
            }

            Some(&node.piece)
        } else {
            self.stack.pop()?;

            while !self.stack.is_empty() {
                let right = self.stack.last()?.right.as_ref();

                if right
                    .internal_ref()
                    .map_or(false, |right| std::ptr::eq(right, node))
                {
                    return Some(&self.stack.last()?.piece);
                }

                node = self.stack.pop()?;
            }

            None
        }
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<(u64, Piece)> {
        let piece = self.stack.last().map(|&node| node.piece.clone())?;
        Some((self.pos, piece))
    }

    #[inline]
    pub(crate) fn next(&mut self) -> Option<(u64, Piece)> {
        let prev_len = self.get()?.1.len;

        if let Some(p) = self.tree_next().cloned() {
            self.pos += prev_len;
            Some((self.pos, p))
        } else {
            self.pos = self.len;
            None
        }
    }

    #[inline]
    pub(crate) fn prev(&mut self) -> Option<(u64, Piece)> {
        if self.pos == 0 {
            return None;
        }

        if let Some(p) = self.tree_prev().cloned() {
            self.pos -= p.len;
            Some((self.pos, p))
        } else {
            let (stack, pos) = self.tree.find_node(self.len);
            self.stack = stack;
            self.pos = pos;
            self.get()
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> u64 {
        self.pos
    }
}

/// A [`PieceIter`] clamped to `range`, yielding only the portions of
/// pieces that fall inside it (pieces straddling a bound are split on
/// the fly into throwaway halves — the tree itself is untouched since
/// `Piece::split_left`/`split_right` take `&mut self` on a local clone).
#[derive(Debug, Clone)]
pub(crate) struct BoundedPieceIter<'a> {
    range: Range<u64>,
    iter: PieceIter<'a>,
}

impl<'a> BoundedPieceIter<'a> {
    #[inline]
    pub(crate) fn new(tree: &'a Tree, at: u64, len: u64) -> Self {
        let iter = PieceIter::new(tree, at, len);
        BoundedPieceIter { range: 0..len, iter }
    }

    #[inline]
    pub(crate) fn new_bounded(tree: &'a Tree, len: u64, at: u64, range: Range<u64>) -> Self {
        let iter = PieceIter::new(tree, range.start + at, len);
        BoundedPieceIter { range, iter }
    }

    fn shrink_to_range(&self, pos_piece: (u64, Piece)) -> Option<(u64, Piece)> {
        let (mut p_start, mut piece) = pos_piece;
        let p_end = p_start + piece.len;
        let Range { start, end } = self.range;

        if p_start < start {
            let diff = start - p_start;
            piece.split_right(diff);
            p_start += diff;
        }

        if end < p_end {
            piece.split_left(piece.len.saturating_sub(p_end - end));
        }

        if piece.len == 0 {
            return None;
        }

        Some((p_start - start, piece))
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<(u64, Piece)> {
        let pos_piece = self.iter.get()?;
        self.shrink_to_range(pos_piece)
    }

    #[inline]
    pub(crate) fn next(&mut self) -> Option<(u64, Piece)> {
        let (p_start, _) = self.iter.get()?;
        if self.range.end < p_start {
            return None;
        }

        let pos_piece = self.iter.next()?;
        self.shrink_to_range(pos_piece)
    }

    #[inline]
    pub(crate) fn prev(&mut self) -> Option<(u64, Piece)> {
        if let Some((p_start, _)) = self.iter.get() {
            if p_start <= self.range.start {
                return None;
            }
        }

        let pos_piece = self.iter.prev()?;
        self.shrink_to_range(pos_piece)
    }
}
