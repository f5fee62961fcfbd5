//! A red-black piece-tree text buffer: insert/delete at piece
//! granularity, bidirectional offset<->(line,column) translation,
//! regex/literal search, snapshotting, and a command-pattern undo/redo
//! stack, all in O(log n) per piece operation.
//!
//! [`Document`] is the composition root: it wires the internal
//! [`piece_tree::PieceTree`] (tree + buffer storage), EOL policy, and
//! [`history::History`] together behind the public surface named in the
//! buffer core's external interface.

mod bytes;
mod chunks;
mod coords;
mod cursor;
mod eol;
mod error;
mod history;
mod piece;
mod piece_tree;
mod search;
mod snapshot;
mod tree;
mod store;

use std::io;

pub use coords::Position;
pub use eol::EolPolicy;
pub use error::{Error, Result};
pub use history::{HistoryEvent, ListenerId};
pub use search::{SearchMatch, SearchOptions};
pub use snapshot::Snapshot;

use history::{Command, History};
use piece_tree::PieceTree;

/// The buffer core's public entry point: owns one document's content,
/// EOL policy, and undo/redo history.
///
/// Every mutating method goes through [`History`], so every edit is
/// undoable by default: callers invoke a `Document` method, `Document`
/// wraps the mutation as a `Command`, and `History` applies and records
/// it.
pub struct Document {
    pt: PieceTree,
    eol: EolPolicy,
    normalize_eol: bool,
    history: History,
}

impl Document {
    /// An empty document. EOL policy starts at `EolPolicy::None`
    /// (nothing to normalize yet); `init_from_string`/`init_from_chunks`
    /// set a concrete policy from their argument.
    pub fn new() -> Document {
        Document {
            pt: PieceTree::new(),
            eol: EolPolicy::None,
            normalize_eol: false,
            history: History::new(),
        }
    }

    /// Load `text` as the document's initial content under `eol_policy`.
    /// `EolPolicy::None` leaves the content as written and detects a
    /// nominal policy from it (CRLF, else LF, else CR, default LF); any
    /// other policy rewrites every terminator to its own on ingress.
    pub fn init_from_string(text: &str, eol_policy: EolPolicy) -> Document {
        let mut doc = Document::new();
        doc.load(text.as_bytes(), eol_policy);
        doc
    }

    /// Load a document's initial content from a reader. Unbounded
    /// streaming is out of scope, so this reads `chunk_source` to
    /// completion rather than keeping the tree partially loaded; callers
    /// needing to yield between chunks can still do so in their own
    /// `Read` implementation.
    pub fn init_from_chunks<R: io::Read>(mut chunk_source: R, eol_policy: EolPolicy) -> Result<Document> {
        let mut bytes = Vec::new();
        chunk_source
            .read_to_end(&mut bytes)
            .map_err(|e| Error::Resource(e.to_string()))?;
        let mut doc = Document::new();
        doc.load(&bytes, eol_policy);
        Ok(doc)
    }

    fn load(&mut self, bytes: &[u8], policy: EolPolicy) {
        let (content, resolved_policy, normalize) = match policy {
            EolPolicy::None => (bytes.to_vec(), eol::detect(bytes), false),
            other => (eol::normalize(bytes, other), other, true),
        };
        self.pt = PieceTree::from_bytes(&content);
        self.eol = resolved_policy;
        self.normalize_eol = normalize;
        self.history = History::new();
    }

    /// Discard all content and history, keeping the current EOL policy.
    pub fn reset(&mut self) {
        self.pt = PieceTree::new();
        self.history = History::new();
    }

    fn normalize(&self, bytes: &[u8]) -> Vec<u8> {
        if self.normalize_eol {
            eol::normalize(bytes, self.eol)
        } else {
            bytes.to_vec()
        }
    }

    // ---- Editing -----------------------------------------------------

    /// Append `text` at the document's end.
    pub fn append(&mut self, text: &str) -> Result<()> {
        let at = self.pt.len();
        self.insert(at, text)
    }

    /// Insert `text` so its first byte lands at absolute `offset`.
    pub fn insert(&mut self, offset: u64, text: &str) -> Result<()> {
        if offset > self.pt.len() {
            return Err(Error::OutOfRange(offset, self.pt.len()));
        }
        if text.is_empty() {
            return Ok(());
        }
        let normalized = self.normalize(text.as_bytes());
        self.history
            .execute(&mut self.pt, Command::Insert { offset, text: normalized })?;
        Ok(())
    }

    /// Insert `text` at a 1-based `(line, column)` position.
    pub fn insert_at(&mut self, line: u64, column: u64, text: &str) -> Result<()> {
        let offset = self.pt.offset_at(line, column)?;
        self.insert(offset, text)
    }

    /// Remove `[start, end)`.
    pub fn delete(&mut self, start: u64, end: u64) -> Result<()> {
        if start > end || end > self.pt.len() {
            return Err(Error::OutOfRange(end, self.pt.len()));
        }
        if start == end {
            return Ok(());
        }
        let removed = self.pt.slice_bytes(start, end)?;
        self.history
            .execute(&mut self.pt, Command::Delete { offset: start, removed })?;
        Ok(())
    }

    /// Replace `[start, end)` with `text`, as one atomic, one-undo-entry
    /// operation.
    pub fn replace(&mut self, start: u64, end: u64, text: &str) -> Result<()> {
        if start > end || end > self.pt.len() {
            return Err(Error::OutOfRange(end, self.pt.len()));
        }
        let removed = self.pt.slice_bytes(start, end)?;
        let inserted = self.normalize(text.as_bytes());
        self.history.execute(
            &mut self.pt,
            Command::Replace {
                offset: start,
                removed,
                inserted,
            },
        )?;
        Ok(())
    }

    /// Replace the first match of `query` (from the document start)
    /// with `text`. Returns the matched range that was replaced, or
    /// `None` if `query` did not match.
    pub fn replace_first(
        &mut self,
        query: &str,
        options: &SearchOptions,
        text: &str,
    ) -> Result<Option<SearchMatch>> {
        let found = search::find_next(&self.pt, query, 0, options)?;
        if let Some(m) = &found {
            self.replace(m.start, m.end, text)?;
        }
        Ok(found)
    }

    /// Replace every match of `query` (up to `max_count`) with `text`,
    /// as a single grouped undo entry.
    pub fn replace_all(
        &mut self,
        query: &str,
        options: &SearchOptions,
        text: &str,
        max_count: usize,
    ) -> Result<usize> {
        let matches = search::find_all(&self.pt, query, 0, options, max_count)?;
        if matches.is_empty() {
            return Ok(0);
        }

        let replacement = self.normalize(text.as_bytes());
        self.history.begin_group("Replace All");
        let mut shift: i64 = 0;
        for m in &matches {
            let start = (m.start as i64 + shift) as u64;
            let end = (m.end as i64 + shift) as u64;
            let removed = self.pt.slice_bytes(start, end)?;
            let command = Command::Replace {
                offset: start,
                removed,
                inserted: replacement.clone(),
            };
            if let Err(e) = self.history.execute(&mut self.pt, command) {
                // `execute` already cleared history on failure; the
                // group frame it was pushed under no longer exists, so
                // there's nothing left to close.
                return Err(e);
            }
            shift += replacement.len() as i64 - (end - start) as i64;
        }
        self.history.end_group()?;
        Ok(matches.len())
    }

    // ---- Inspection ----------------------------------------------------

    pub fn length(&self) -> u64 {
        self.pt.len()
    }

    pub fn line_count(&self) -> u64 {
        self.pt.line_count()
    }

    pub fn line_content(&self, line: u64) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.pt.line_content(line)?).into_owned())
    }

    /// Concatenated content of lines `from..=to` (1-based, inclusive),
    /// each line's own terminator included except possibly the last.
    pub fn lines_content(&self, from: u64, to: u64) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.pt.lines_content(from, to)?).into_owned())
    }

    pub fn line_length(&self, line: u64) -> Result<u64> {
        let (start, end) = self.pt.line_range(line)?;
        Ok(end - start)
    }

    /// Half-open offset range of `line`'s content, terminator excluded.
    pub fn line_range(&self, line: u64) -> Result<(u64, u64)> {
        self.pt.line_range(line)
    }

    /// The code unit at `offset`, or `None` at end-of-document.
    pub fn char_at(&self, offset: u64) -> Option<u8> {
        if offset >= self.pt.len() {
            return None;
        }
        self.pt.slice_bytes(offset, offset + 1).ok()?.first().copied()
    }

    /// The code unit at a 1-based `(line, column)` position.
    pub fn char_at_position(&self, line: u64, column: u64) -> Option<u8> {
        let offset = self.pt.offset_at(line, column).ok()?;
        self.char_at(offset)
    }

    pub fn text_range(&self, start: u64, end: u64) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.pt.text_range(start, end)?).into_owned())
    }

    pub fn position_at(&self, offset: u64) -> Result<Position> {
        self.pt.position_at(offset)
    }

    pub fn offset_at(&self, line: u64, column: u64) -> Result<u64> {
        self.pt.offset_at(line, column)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.pt.slice_bytes(0, self.pt.len()).unwrap_or_default())
            .into_owned()
    }

    /// The document's content with every terminator rewritten to
    /// `policy`'s (without mutating the stored content or policy).
    pub fn text_with_eol(&self, policy: EolPolicy) -> String {
        let raw = self.pt.slice_bytes(0, self.pt.len()).unwrap_or_default();
        String::from_utf8_lossy(&eol::normalize(&raw, policy)).into_owned()
    }

    // ---- Search --------------------------------------------------------

    pub fn find_all(
        &self,
        query: &str,
        start: u64,
        options: &SearchOptions,
        max_matches: usize,
    ) -> Result<Vec<SearchMatch>> {
        search::find_all(&self.pt, query, start, options, max_matches)
    }

    pub fn find_next(&self, query: &str, start: u64, options: &SearchOptions) -> Result<Option<SearchMatch>> {
        search::find_next(&self.pt, query, start, options)
    }

    pub fn find_previous(
        &self,
        query: &str,
        end: u64,
        options: &SearchOptions,
    ) -> Result<Option<SearchMatch>> {
        search::find_previous(&self.pt, query, end, options)
    }

    // ---- History ---------------------------------------------------------

    /// Undo the most recent command, returning the offset a cursor
    /// should move to, or `None` if there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<u64>> {
        self.history.undo(&mut self.pt)
    }

    pub fn redo(&mut self) -> Result<Option<u64>> {
        self.history.redo(&mut self.pt)
    }

    pub fn begin_group(&mut self, description: impl Into<String>) {
        self.history.begin_group(description)
    }

    pub fn end_group(&mut self) -> Result<()> {
        self.history.end_group()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }

    pub fn clear_history(&mut self) {
        self.history.clear()
    }

    pub fn undo_size(&self) -> usize {
        self.history.undo_size()
    }

    pub fn redo_size(&self) -> usize {
        self.history.redo_size()
    }

    pub fn set_max_undo_levels(&mut self, n: usize) {
        self.history.set_max_undo_levels(n)
    }

    pub fn add_listener(&mut self, listener: impl FnMut(HistoryEvent) + 'static) -> ListenerId {
        self.history.add_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.history.remove_listener(id)
    }

    // ---- Snapshot --------------------------------------------------------

    pub fn create_snapshot(&self) -> Snapshot {
        Snapshot::new(self.pt.clone(), self.eol, self.normalize_eol)
    }

    /// Restore a previously captured state. Clears history, since
    /// recorded commands are offsets into a document that may no longer
    /// exist once the content underneath them has been replaced wholesale.
    pub fn restore_snapshot(&mut self, snapshot: &Snapshot) {
        self.pt = snapshot.piece_tree().clone();
        self.eol = snapshot.eol();
        self.normalize_eol = snapshot.normalize_eol();
        self.history.clear();
    }

    // ---- EOL policy --------------------------------------------------------

    pub fn get_eol(&self) -> EolPolicy {
        self.eol
    }

    pub fn set_eol(&mut self, policy: EolPolicy) {
        self.eol = policy;
    }

    pub fn is_normalize_eol(&self) -> bool {
        self.normalize_eol
    }

    pub fn set_normalize_eol(&mut self, flag: bool) {
        self.normalize_eol = flag;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_hello_insertion() {
        let mut doc = Document::init_from_string("Initial text", EolPolicy::None);
        doc.insert_at(1, 1, "Hello, ").unwrap();
        doc.append("World!").unwrap();

        assert_eq!(doc.text(), "Hello, Initial textWorld!");
        assert_eq!(doc.length(), 25);
        assert_eq!(doc.line_count(), 1);
    }

    #[test]
    fn s2_multi_line_line_access() {
        let doc = Document::init_from_string("ab\ncd\r\nef\rgh", EolPolicy::None);

        assert_eq!(doc.line_count(), 4);
        assert_eq!(doc.line_content(1).unwrap(), "ab");
        assert_eq!(doc.line_content(2).unwrap(), "cd");
        assert_eq!(doc.line_content(3).unwrap(), "ef");
        assert_eq!(doc.line_content(4).unwrap(), "gh");
        assert_eq!(doc.offset_at(3, 1).unwrap(), 7);
        assert_eq!(doc.position_at(7).unwrap(), Position { line: 3, column: 1 });
    }

    #[test]
    fn s3_delete_spanning_pieces() {
        let mut doc = Document::init_from_string("abcdef", EolPolicy::None);
        doc.insert(3, "XY").unwrap();
        assert_eq!(doc.text(), "abcXYdef");

        doc.delete(2, 6).unwrap();
        assert_eq!(doc.text(), "abef");
        assert_eq!(doc.length(), 4);
    }

    #[test]
    fn s4_undo_redo_of_replace() {
        let mut doc = Document::init_from_string("The quick brown fox", EolPolicy::None);
        doc.replace(4, 9, "slow").unwrap();
        assert_eq!(doc.text(), "The slow brown fox");

        doc.undo().unwrap();
        assert_eq!(doc.text(), "The quick brown fox");

        doc.redo().unwrap();
        assert_eq!(doc.text(), "The slow brown fox");
    }

    #[test]
    fn s5_eol_normalization() {
        let doc = Document::init_from_string("a\r\nb\rc\nd", EolPolicy::Lf);

        assert_eq!(doc.text(), "a\nb\nc\nd");
        assert_eq!(doc.line_count(), 4);
        assert_eq!(doc.text_with_eol(EolPolicy::Crlf), "a\r\nb\r\nc\r\nd");
    }

    #[test]
    fn s6_find_all_cap() {
        let text = "x".repeat(2_000);
        let doc = Document::init_from_string(&text, EolPolicy::None);
        let opts = SearchOptions {
            case_sensitive: true,
            ..Default::default()
        };

        let matches = doc.find_all("x", 0, &opts, 1_000).unwrap();
        assert_eq!(matches.len(), 1_000);
        for pair in matches.windows(2) {
            assert!(pair[0].start < pair[1].start);
        }

        let next = doc.find_next("x", matches[999].end, &opts).unwrap().unwrap();
        assert_eq!(next.start, 1_000);
    }

    #[test]
    fn replace_all_is_one_undo_entry() {
        let mut doc = Document::init_from_string("cat cat cat", EolPolicy::None);
        let opts = SearchOptions {
            case_sensitive: true,
            ..Default::default()
        };

        let n = doc.replace_all("cat", &opts, "dog", 10).unwrap();
        assert_eq!(n, 3);
        assert_eq!(doc.text(), "dog dog dog");
        assert_eq!(doc.undo_size(), 1);

        doc.undo().unwrap();
        assert_eq!(doc.text(), "cat cat cat");
    }

    #[test]
    fn replace_first_reports_the_replaced_range() {
        let mut doc = Document::init_from_string("foo bar foo", EolPolicy::None);
        let opts = SearchOptions {
            case_sensitive: true,
            ..Default::default()
        };

        let replaced = doc.replace_first("foo", &opts, "baz").unwrap().unwrap();
        assert_eq!((replaced.start, replaced.end), (0, 3));
        assert_eq!(doc.text(), "baz bar foo");
    }

    #[test]
    fn snapshot_round_trips_through_edits() {
        let mut doc = Document::init_from_string("hello", EolPolicy::None);
        let snap = doc.create_snapshot();

        doc.append(" world").unwrap();
        doc.delete(0, 5).unwrap();
        assert_eq!(doc.text(), " world");

        doc.restore_snapshot(&snap);
        assert_eq!(doc.text(), "hello");
    }

    #[test]
    fn insert_past_end_is_out_of_range() {
        let mut doc = Document::init_from_string("abc", EolPolicy::None);
        assert!(matches!(doc.insert(10, "x"), Err(Error::OutOfRange(_, _))));
    }

    #[test]
    fn init_from_chunks_reads_a_reader_to_completion() {
        let reader = std::io::Cursor::new(b"hello world".to_vec());
        let doc = Document::init_from_chunks(reader, EolPolicy::None).unwrap();
        assert_eq!(doc.text(), "hello world");
    }
}
