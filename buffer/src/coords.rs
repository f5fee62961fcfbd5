//! Offset <-> (line, column) translation and line/substring extraction
//!. Lines and columns are 1-based; offsets are 0-based.

use crate::error::{Error, Result};
use crate::piece_tree::PieceTree;

/// 1-based (line, column) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u64,
    pub column: u64,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };
}

impl PieceTree {
    /// Total line-break count across all pieces, plus one if the
    /// document is non-empty and does not end in a terminator.
    pub fn line_count(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }

        // `find_node_with_lines(len)` lands on the rightmost piece and
        // accumulates every break that precedes it; adding that piece's
        // own break count yields the document total.
        let (stack, _, preceding) = self.tree.find_node_with_lines(self.len());
        let total_breaks = preceding
            + stack
                .last()
                .map(|n| n.piece.lf_count())
                .unwrap_or(0);

        let ends_with_terminator = self
            .slice_bytes(self.len().saturating_sub(1), self.len())
            .map(|b| matches!(b.as_slice(), [b'\n'] | [b'\r']))
            .unwrap_or(false);

        if ends_with_terminator {
            total_breaks
        } else {
            total_breaks + 1
        }
    }

    /// Translate an absolute `offset` to a 1-based (line, column).
    pub fn position_at(&self, offset: u64) -> Result<Position> {
        if offset > self.len() {
            return Err(Error::OutOfRange(offset, self.len()));
        }
        if self.is_empty() {
            return Ok(Position::START);
        }

        let (stack, node_start, preceding_lines) = self.tree.find_node_with_lines(offset);
        let node = *stack
            .last()
            .expect("non-empty tree always yields a node for a valid offset");
        let local = offset - node_start;

        let local_line = node.piece.line_starts.partition_point(|&s| s <= local) as u64;
        let last_break = if local_line == 0 {
            0
        } else {
            node.piece.line_starts[local_line as usize - 1]
        };

        Ok(Position {
            line: preceding_lines + local_line + 1,
            column: local - last_break + 1,
        })
    }

    /// Translate a 1-based (line, column) to an absolute offset. A
    /// column past the line's end clamps to the line's end; it never
    /// overflows into the next line.
    pub fn offset_at(&self, line: u64, column: u64) -> Result<u64> {
        if line == 0 || column == 0 {
            return Err(Error::InvalidArgument(
                "line and column are 1-based and must be >= 1".into(),
            ));
        }

        let line_start = self.line_start_offset(line)?;
        if column == 1 {
            return Ok(line_start);
        }

        let mut bytes = self.bytes_at(line_start);
        let mut pos = line_start;
        for _ in 1..column {
            match bytes.next() {
                Some(b'\n') | Some(b'\r') | None => break,
                Some(_) => pos += 1,
            }
        }
        Ok(pos)
    }

    /// Absolute offset of the first code unit of `line` (1-based).
    fn line_start_offset(&self, line: u64) -> Result<u64> {
        if line == 1 {
            return Ok(0);
        }

        let break_index = line - 2; // 0-indexed line terminator that begins `line`
        let (stack, node_start, preceding_breaks) = self.tree.find_node_by_line(break_index);
        let node = stack.last().ok_or(Error::OutOfRange(line, self.line_count()))?;

        let local_idx = break_index - preceding_breaks;
        let local_starts = &node.piece.line_starts;
        if local_idx as usize >= local_starts.len() {
            return Err(Error::OutOfRange(line, self.line_count()));
        }

        Ok(node_start + local_starts[local_idx as usize])
    }

    /// The code units of `line` (1-based), terminator excluded.
    pub fn line_content(&self, line: u64) -> Result<Vec<u8>> {
        let (start, end) = self.line_range(line)?;
        self.slice_bytes(start, end)
    }

    /// `(start, end)` of `line`'s content, terminator excluded.
    pub fn line_range(&self, line: u64) -> Result<(u64, u64)> {
        let start = self.line_start_offset(line)?;
        let mut end = start;
        let mut bytes = self.bytes_at(start);
        loop {
            match bytes.next() {
                None | Some(b'\n') | Some(b'\r') => break,
                Some(_) => end += 1,
            }
        }
        Ok((start, end))
    }

    /// Concatenated content of lines `from..=to` (1-based, inclusive),
    /// each line's terminator included except possibly the last.
    pub fn lines_content(&self, from: u64, to: u64) -> Result<Vec<u8>> {
        if from == 0 || to < from {
            return Err(Error::InvalidArgument("invalid line range".into()));
        }
        let start = self.line_start_offset(from)?;
        let end = if to >= self.line_count() {
            self.len()
        } else {
            self.line_start_offset(to + 1)?
        };
        self.slice_bytes(start, end)
    }

    /// `text_range(start, end)`: concatenation of every piece slice
    /// intersecting `[start, end)`.
    pub fn text_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        self.slice_bytes(start, end)
    }
}
