use std::mem;
use std::sync::Arc;

use crate::piece::Piece;
use crate::tree::color::Color;

use super::Node;

/// Internal (non-leaf) red-black tree node.
///
/// Besides the usual `left`/`right`/`color`, every node caches two
/// aggregates over its left subtree only: `left_subtree_len` (sum of piece
/// lengths) and `left_subtree_lf_count` (sum of piece line-break counts).
/// Both make offset and line descent logarithmic and both must
/// be kept in lock-step through every rotation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct InternalNode {
    pub(crate) left: Arc<Node>,
    pub(crate) right: Arc<Node>,
    pub(crate) color: Color,

    pub(crate) piece: Piece,
    pub(crate) left_subtree_len: u64,
    pub(crate) left_subtree_lf_count: u64,
}

impl InternalNode {
    pub fn new(color: Color, piece: Piece) -> InternalNode {
        InternalNode {
            left: Arc::new(Node::Leaf),
            right: Arc::new(Node::Leaf),
            color,
            piece,
            left_subtree_len: 0,
            left_subtree_lf_count: 0,
        }
    }

    /// Matt Might's deletion fixup: bubble a double-black child up by
    /// reddening both children and re-blackening self, then rebalance.
    pub fn bubble(&mut self) {
        use Color::BlackBlack as BB;

        if self.left.color() == BB || self.right.color() == BB {
            self.blacken();

            let left = Arc::make_mut(&mut self.left);
            left.redden();

            let right = Arc::make_mut(&mut self.right);
            right.redden();
        }

        self.balance();
    }

    #[inline]
    pub fn blacken(&mut self) {
        self.color.blacken();
    }

    #[inline]
    pub fn redden(&mut self) {
        self.color.redden();
    }

    #[inline]
    pub fn take_left(&mut self) -> Arc<Node> {
        mem::replace(&mut self.left, Arc::new(Node::Leaf))
    }

    #[inline]
    pub fn take_right(&mut self) -> Arc<Node> {
        mem::replace(&mut self.right, Arc::new(Node::Leaf))
    }

    /// Insert `piece` as the new rightmost descendant of `self.left`
    /// (used when the insertion offset equals this node's document start,
    /// i.e. the new piece should sit immediately before it).
    pub fn insert_left(&mut self, piece: Piece) {
        fn ins_right(node: &mut InternalNode, piece: Piece) {
            let right = Arc::make_mut(&mut node.right);
            match right {
                Node::Internal(r) => {
                    ins_right(r, piece);
                    r.balance();
                }
                _ => {
                    node.right = Arc::new(InternalNode::new(Color::Red, piece).into());
                }
            }
        }

        let left = Arc::make_mut(&mut self.left);
        match left {
            Node::Internal(l) => {
                ins_right(l, piece);
                l.balance();
            }
            _ => {
                self.left = Arc::new(InternalNode::new(Color::Red, piece).into());
            }
        }
    }

    /// Insert `piece` as the new leftmost descendant of `self.right`
    /// (used when the insertion offset equals this node's end, i.e. the
    /// new piece should sit immediately after it but before its successor).
    pub fn insert_right(&mut self, piece: Piece) {
        fn ins_left(node: &mut InternalNode, piece: Piece) {
            node.left_subtree_len += piece.len;
            node.left_subtree_lf_count += piece.lf_count();

            let left = Arc::make_mut(&mut node.left);
            match left {
                Node::Internal(l) => {
                    ins_left(l, piece);
                    l.balance();
                }
                _ => {
                    node.left = Arc::new(InternalNode::new(Color::Red, piece).into());
                }
            }
        }

        let right = Arc::make_mut(&mut self.right);
        match right {
            Node::Internal(r) => {
                ins_left(r, piece);
                r.balance();
            }
            _ => {
                self.right = Arc::new(InternalNode::new(Color::Red, piece).into());
            }
        }
    }

    /// Okasaki's insertion rebalancing cases combined with Matt Might's
    /// deletion cases (they share the same four red-red / black-black
    /// shape tests). Every rotation swaps `left_subtree_len` and
    /// `left_subtree_lf_count` together so the two aggregates never drift
    /// apart.
    pub fn balance(&mut self) {
        use Color::{Black as B, NegativeBlack as NB, Red as R};

        #[inline]
        fn internal_color(n: &Arc<Node>) -> Option<Color> {
            match n.as_ref() {
                Node::Internal(n) => Some(n.color),
                _ => None,
            }
        }

        #[inline]
        fn internal_tree_colors(n: &Arc<Node>) -> (Option<Color>, Option<Color>, Option<Color>) {
            match n.as_ref() {
                Node::Internal(n) => {
                    let left = internal_color(&n.left);
                    let right = internal_color(&n.right);
                    (Some(n.color), left, right)
                }
                _ => (None, None, None),
            }
        }

        if self.color == R || self.color == NB {
            return;
        }

        let (color_l, color_l_l, color_l_r) = internal_tree_colors(&self.left);
        let (color_r, color_r_l, color_r_r) = internal_tree_colors(&self.right);

        match (color_l, color_l_l, color_l_r, color_r, color_r_l, color_r_r) {
            // left-left red-red
            (Some(R), Some(R), ..) => {
                let mut y_ptr = self.take_left();
                let y = Arc::make_mut(&mut y_ptr).internal();
                let mut x_ptr = y.take_left();
                let x = Arc::make_mut(&mut x_ptr).internal();

                self.color.redden();
                y.color = B;
                x.color = B;

                self.left_subtree_len -= y.piece.len + y.left_subtree_len;
                self.left_subtree_lf_count -= y.piece.lf_count() + y.left_subtree_lf_count;

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.left_subtree_len, &mut y.left_subtree_len);
                mem::swap(&mut self.left_subtree_lf_count, &mut y.left_subtree_lf_count);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut self.right, &mut y.right);

                self.left = x_ptr;
                self.right = y_ptr;
            }
            // left-right red-red
            (Some(R), _, Some(R), ..) => {
                let mut x_ptr = self.take_left();
                let x = Arc::make_mut(&mut x_ptr).internal();
                let mut y_ptr = x.take_right();
                let y = Arc::make_mut(&mut y_ptr).internal();

                self.redden();
                x.color = B;
                y.color = B;

                self.left_subtree_len -=
                    x.piece.len + x.left_subtree_len + y.left_subtree_len + y.piece.len;
                self.left_subtree_lf_count -= x.piece.lf_count()
                    + x.left_subtree_lf_count
                    + y.left_subtree_lf_count
                    + y.piece.lf_count();

                y.left_subtree_len += x.piece.len + x.left_subtree_len;
                y.left_subtree_lf_count += x.piece.lf_count() + x.left_subtree_lf_count;

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.left_subtree_len, &mut y.left_subtree_len);
                mem::swap(&mut self.left_subtree_lf_count, &mut y.left_subtree_lf_count);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut x.right, &mut y.right);
                mem::swap(&mut self.right, &mut y.right);

                self.right = y_ptr;
                self.left = x_ptr;
            }
            // right-left red-red
            (.., Some(R), Some(R), _) => {
                let mut z_ptr = self.take_right();
                let z = Arc::make_mut(&mut z_ptr).internal();
                let mut y_ptr = z.take_left();
                let y = Arc::make_mut(&mut y_ptr).internal();

                self.color.redden();
                z.color = B;
                y.color = B;

                z.left_subtree_len -= y.left_subtree_len + y.piece.len;
                z.left_subtree_lf_count -= y.left_subtree_lf_count + y.piece.lf_count();

                y.left_subtree_len += self.left_subtree_len + self.piece.len;
                y.left_subtree_lf_count += self.left_subtree_lf_count + self.piece.lf_count();

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.left_subtree_len, &mut y.left_subtree_len);
                mem::swap(&mut self.left_subtree_lf_count, &mut y.left_subtree_lf_count);
                mem::swap(&mut z.left, &mut y.right);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut self.left, &mut y.left);

                self.left = y_ptr;
                self.right = z_ptr;
            }
            // right-right red-red
            (.., Some(R), _, Some(R)) => {
                let mut y_ptr = self.take_right();
                let y = Arc::make_mut(&mut y_ptr).internal();
                let mut z_ptr = y.take_right();
                let z = Arc::make_mut(&mut z_ptr).internal();

                self.color.redden();
                y.color = B;
                z.color = B;

                y.left_subtree_len += self.left_subtree_len + self.piece.len;
                y.left_subtree_lf_count += self.left_subtree_lf_count + self.piece.lf_count();

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.left_subtree_len, &mut y.left_subtree_len);
                mem::swap(&mut self.left_subtree_lf_count, &mut y.left_subtree_lf_count);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut self.left, &mut y.left);

                self.right = z_ptr;
                self.left = y_ptr;
            }
            // double black, mirror right
            (.., Some(NB), Some(B), Some(B)) => {
                let mut z_ptr = self.take_right();
                let z = Arc::make_mut(&mut z_ptr).internal();
                let mut y_ptr = z.take_left();
                let y = Arc::make_mut(&mut y_ptr).internal();
                let mut w_ptr = z.take_right();
                let w = Arc::make_mut(&mut w_ptr).internal();

                self.color = B;
                z.color = B;
                y.color = B;
                w.color = R;

                z.left_subtree_len -= y.piece.len + y.left_subtree_len;
                z.left_subtree_lf_count -= y.piece.lf_count() + y.left_subtree_lf_count;

                y.left_subtree_len = self.left_subtree_len + y.left_subtree_len + self.piece.len;
                y.left_subtree_lf_count =
                    self.left_subtree_lf_count + y.left_subtree_lf_count + self.piece.lf_count();

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.left_subtree_len, &mut y.left_subtree_len);
                mem::swap(&mut self.left_subtree_lf_count, &mut y.left_subtree_lf_count);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut y.left, &mut self.left);

                mem::swap(&mut self.left, &mut z.left);

                z.right = w_ptr;
                z.balance();

                self.left = y_ptr;
                self.right = z_ptr;
            }
            // double black, mirror left
            (Some(NB), Some(B), Some(B), ..) => {
                let mut x_ptr = self.take_left();
                let x = Arc::make_mut(&mut x_ptr).internal();
                let mut w_ptr = x.take_left();
                let w = Arc::make_mut(&mut w_ptr).internal();
                let mut y_ptr = x.take_right();
                let y = Arc::make_mut(&mut y_ptr).internal();

                self.color = B;
                x.color = B;
                y.color = B;
                w.color = R;

                self.left_subtree_len -=
                    x.piece.len + x.left_subtree_len + y.piece.len + y.left_subtree_len;
                self.left_subtree_lf_count -= x.piece.lf_count()
                    + x.left_subtree_lf_count
                    + y.piece.lf_count()
                    + y.left_subtree_lf_count;

                y.left_subtree_len += x.piece.len + x.left_subtree_len;
                y.left_subtree_lf_count += x.piece.lf_count() + x.left_subtree_lf_count;

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.left_subtree_len, &mut y.left_subtree_len);
                mem::swap(&mut self.left_subtree_lf_count, &mut y.left_subtree_lf_count);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut self.right, &mut y.right);
                mem::swap(&mut self.right, &mut x.right);

                x.left = w_ptr;
                x.balance();

                self.left = x_ptr;
                self.right = y_ptr;
            }
            _ => {}
        }
    }
}
