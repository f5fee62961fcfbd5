//! Command-pattern undo/redo stack.
//!
//! A [`Command`] is one of `Insert`/`Delete`/`Replace`/`Composite`: a
//! tagged variant dispatched on in `apply`/`unapply`/`describe` rather
//! than a trait object per command kind.

use std::collections::{HashMap, VecDeque};

use crate::error::{Error, Result};
use crate::piece_tree::PieceTree;

/// Default cap on the undo stack depth.
pub(crate) const DEFAULT_MAX_UNDO_LEVELS: usize = 100;

#[derive(Debug, Clone)]
pub(crate) enum Command {
    Insert {
        offset: u64,
        text: Vec<u8>,
    },
    Delete {
        offset: u64,
        removed: Vec<u8>,
    },
    Replace {
        offset: u64,
        removed: Vec<u8>,
        inserted: Vec<u8>,
    },
    Composite {
        description: String,
        commands: Vec<Command>,
    },
}

impl Command {
    pub(crate) fn describe(&self) -> &str {
        match self {
            Command::Insert { .. } => "Insert",
            Command::Delete { .. } => "Delete",
            Command::Replace { .. } => "Replace",
            Command::Composite { description, .. } => description,
        }
    }

    /// Re-apply this command. Returns the offset a cursor should land on
    /// afterward.
    fn apply(&self, pt: &mut PieceTree) -> Result<u64> {
        match self {
            Command::Insert { offset, text } => {
                pt.insert(*offset, text)?;
                Ok(offset + text.len() as u64)
            }
            Command::Delete { offset, removed } => {
                pt.remove(*offset, offset + removed.len() as u64)?;
                Ok(*offset)
            }
            Command::Replace {
                offset,
                removed,
                inserted,
            } => {
                pt.remove(*offset, offset + removed.len() as u64)?;
                pt.insert(*offset, inserted)?;
                Ok(offset + inserted.len() as u64)
            }
            Command::Composite { commands, .. } => {
                let mut cursor = 0;
                for c in commands {
                    cursor = c.apply(pt)?;
                }
                Ok(cursor)
            }
        }
    }

    /// Invert this command. Returns the offset a cursor should land on
    /// afterward.
    ///
    /// A `Replace`'s undo removes `[offset, offset + inserted.len())` —
    /// the range the forward replace actually left behind — and
    /// reinserts `removed` at `offset`.
    fn unapply(&self, pt: &mut PieceTree) -> Result<u64> {
        match self {
            Command::Insert { offset, text } => {
                pt.remove(*offset, offset + text.len() as u64)?;
                Ok(*offset)
            }
            Command::Delete { offset, removed } => {
                pt.insert(*offset, removed)?;
                Ok(offset + removed.len() as u64)
            }
            Command::Replace {
                offset,
                removed,
                inserted,
            } => {
                pt.remove(*offset, offset + inserted.len() as u64)?;
                pt.insert(*offset, removed)?;
                Ok(*offset)
            }
            Command::Composite { commands, .. } => {
                let mut cursor = 0;
                for c in commands.iter().rev() {
                    cursor = c.unapply(pt)?;
                }
                Ok(cursor)
            }
        }
    }
}

/// Opaque handle returned by [`History::add_listener`], used to remove
/// a listener later without relying on closure identity comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Transition reported to listeners after each History state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEvent {
    Executed,
    Undone,
    Redone,
    Cleared,
}

/// Records reversible commands and replays them on undo/redo. Mediates
/// every externally-initiated mutation that should be undoable.
pub(crate) struct History {
    undo: VecDeque<Command>,
    redo: Vec<Command>,
    max_undo_levels: usize,
    /// Nested `begin_group`/`end_group` frames: `(description,
    /// accumulated commands)`. Only the outermost frame's composite
    /// lands on the undo stack; inner frames nest into their parent as a
    /// single sub-command, so `begin_group`/`begin_group`/`end_group`/
    /// `end_group` produces one two-level `Composite`, not two undo
    /// entries.
    group_stack: Vec<(String, Vec<Command>)>,
    listeners: HashMap<u64, Box<dyn FnMut(HistoryEvent)>>,
    next_listener: u64,
}

impl History {
    pub fn new() -> History {
        History {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_undo_levels: DEFAULT_MAX_UNDO_LEVELS,
            group_stack: Vec::new(),
            listeners: HashMap::new(),
            next_listener: 0,
        }
    }

    pub fn set_max_undo_levels(&mut self, n: usize) {
        self.max_undo_levels = n;
        while self.undo.len() > self.max_undo_levels {
            self.undo.pop_front();
        }
    }

    pub fn begin_group(&mut self, description: impl Into<String>) {
        self.group_stack.push((description.into(), Vec::new()));
    }

    pub fn end_group(&mut self) -> Result<()> {
        let (description, commands) = self
            .group_stack
            .pop()
            .ok_or_else(|| Error::IllegalState("end_group called without begin_group".into()))?;

        if commands.is_empty() {
            return Ok(());
        }

        let composite = Command::Composite {
            description,
            commands,
        };
        self.record(composite);
        Ok(())
    }

    fn record(&mut self, command: Command) {
        if let Some((_, parent)) = self.group_stack.last_mut() {
            parent.push(command);
            return;
        }

        log::debug!("push undo entry: {}", command.describe());
        self.undo.push_back(command);
        if self.undo.len() > self.max_undo_levels {
            self.undo.pop_front();
        }
        self.redo.clear();
        self.notify(HistoryEvent::Executed);
    }

    /// Apply `command` to `pt` and, on success, record it as a fresh
    /// undo entry (or fold it into the open group). On failure the
    /// history is cleared entirely, since the pre/post-condition pairing
    /// between stacks can no longer be trusted.
    pub fn execute(&mut self, pt: &mut PieceTree, command: Command) -> Result<u64> {
        match command.apply(pt) {
            Ok(cursor) => {
                self.record(command);
                Ok(cursor)
            }
            Err(e) => {
                self.undo.clear();
                self.redo.clear();
                self.group_stack.clear();
                Err(e)
            }
        }
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.group_stack.is_empty() && !self.undo.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.group_stack.is_empty() && !self.redo.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo.back().map(|c| c.describe())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo.last().map(|c| c.describe())
    }

    #[inline]
    pub fn undo_size(&self) -> usize {
        self.undo.len()
    }

    #[inline]
    pub fn redo_size(&self) -> usize {
        self.redo.len()
    }

    pub fn undo(&mut self, pt: &mut PieceTree) -> Result<Option<u64>> {
        if !self.can_undo() {
            return Ok(None);
        }
        let command = self.undo.pop_back().unwrap();
        log::debug!("undo: {}", command.describe());
        match command.unapply(pt) {
            Ok(cursor) => {
                self.redo.push(command);
                self.notify(HistoryEvent::Undone);
                Ok(Some(cursor))
            }
            Err(e) => {
                self.undo.clear();
                self.redo.clear();
                Err(e)
            }
        }
    }

    pub fn redo(&mut self, pt: &mut PieceTree) -> Result<Option<u64>> {
        if !self.can_redo() {
            return Ok(None);
        }
        let command = self.redo.pop().unwrap();
        log::debug!("redo: {}", command.describe());
        match command.apply(pt) {
            Ok(cursor) => {
                self.undo.push_back(command);
                self.notify(HistoryEvent::Redone);
                Ok(Some(cursor))
            }
            Err(e) => {
                self.undo.clear();
                self.redo.clear();
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.group_stack.clear();
        self.notify(HistoryEvent::Cleared);
    }

    pub fn add_listener(&mut self, listener: impl FnMut(HistoryEvent) + 'static) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.insert(id, Box::new(listener));
        ListenerId(id)
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id.0);
    }

    fn notify(&mut self, event: HistoryEvent) {
        for cb in self.listeners.values_mut() {
            cb(event);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece_tree::PieceTree;

    fn content(pt: &PieceTree) -> Vec<u8> {
        pt.slice_bytes(0, pt.len()).unwrap()
    }

    #[test]
    fn undo_redo_round_trips_a_replace() {
        let mut pt = PieceTree::from_bytes(b"The quick brown fox");
        let mut h = History::new();

        let cmd = Command::Replace {
            offset: 4,
            removed: b"quick".to_vec(),
            inserted: b"slow".to_vec(),
        };
        h.execute(&mut pt, cmd).unwrap();
        assert_eq!(content(&pt), b"The slow brown fox");

        h.undo(&mut pt).unwrap();
        assert_eq!(content(&pt), b"The quick brown fox");

        h.redo(&mut pt).unwrap();
        assert_eq!(content(&pt), b"The slow brown fox");
    }

    #[test]
    fn fresh_execute_clears_redo_stack() {
        let mut pt = PieceTree::from_bytes(b"abc");
        let mut h = History::new();

        h.execute(&mut pt, Command::Insert { offset: 3, text: b"d".to_vec() })
            .unwrap();
        h.undo(&mut pt).unwrap();
        assert!(h.can_redo());

        h.execute(&mut pt, Command::Insert { offset: 3, text: b"e".to_vec() })
            .unwrap();
        assert!(!h.can_redo());
        assert_eq!(content(&pt), b"abce");
    }

    #[test]
    fn grouped_commands_undo_as_one() {
        let mut pt = PieceTree::from_bytes(b"abc");
        let mut h = History::new();

        h.begin_group("batch");
        h.execute(&mut pt, Command::Insert { offset: 3, text: b"d".to_vec() })
            .unwrap();
        h.execute(&mut pt, Command::Insert { offset: 4, text: b"e".to_vec() })
            .unwrap();
        assert!(!h.can_undo()); // still inside the group
        h.end_group().unwrap();

        assert_eq!(h.undo_size(), 1);
        assert_eq!(content(&pt), b"abcde");

        h.undo(&mut pt).unwrap();
        assert_eq!(content(&pt), b"abc");
    }

    #[test]
    fn end_group_without_begin_is_illegal_state() {
        let mut h = History::new();
        assert!(matches!(h.end_group(), Err(Error::IllegalState(_))));
    }

    #[test]
    fn max_undo_levels_trims_oldest() {
        let mut pt = PieceTree::from_bytes(b"");
        let mut h = History::new();
        h.set_max_undo_levels(2);

        for i in 0..5u64 {
            h.execute(
                &mut pt,
                Command::Insert {
                    offset: i,
                    text: b"a".to_vec(),
                },
            )
            .unwrap();
        }
        assert_eq!(h.undo_size(), 2);
    }

    #[test]
    fn listener_observes_execute_and_undo() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut pt = PieceTree::from_bytes(b"abc");
        let mut h = History::new();
        let events: Rc<RefCell<Vec<HistoryEvent>>> = Rc::new(RefCell::new(Vec::new()));

        let events_clone = events.clone();
        let id = h.add_listener(move |e| events_clone.borrow_mut().push(e));

        h.execute(&mut pt, Command::Insert { offset: 3, text: b"d".to_vec() })
            .unwrap();
        h.undo(&mut pt).unwrap();

        assert_eq!(
            *events.borrow(),
            vec![HistoryEvent::Executed, HistoryEvent::Undone]
        );

        h.remove_listener(id);
        h.redo(&mut pt).unwrap();
        assert_eq!(events.borrow().len(), 2);
    }
}
