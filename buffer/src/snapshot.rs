//! Frozen, restorable document state.
//!
//! The tree itself is an `Arc`-based copy-on-write structure
//! (`tree::Tree`), so cloning a [`PieceTree`] to freeze it is already
//! cheap on the tree side; only the added buffer's bytes are actually
//! copied.

use crate::eol::EolPolicy;
use crate::piece_tree::PieceTree;

/// An immutable value capturing a document's content and EOL policy at
/// a point in time, restorable with [`crate::Document::restore_snapshot`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    pt: PieceTree,
    eol: EolPolicy,
    normalize_eol: bool,
}

impl Snapshot {
    pub(crate) fn new(pt: PieceTree, eol: EolPolicy, normalize_eol: bool) -> Snapshot {
        Snapshot {
            pt,
            eol,
            normalize_eol,
        }
    }

    pub(crate) fn piece_tree(&self) -> &PieceTree {
        &self.pt
    }

    pub(crate) fn eol(&self) -> EolPolicy {
        self.eol
    }

    pub(crate) fn normalize_eol(&self) -> bool {
        self.normalize_eol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let pt = PieceTree::from_bytes(b"hello");
        let snap = Snapshot::new(pt.clone(), EolPolicy::Lf, true);

        let mut mutated = pt;
        mutated.insert(5, b" world").unwrap();

        assert_eq!(snap.piece_tree().len(), 5);
        assert_eq!(mutated.len(), 11);
    }
}
