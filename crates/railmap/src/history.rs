//! Undo/redo history of graph snapshots.
//!
//! The store always holds at least one entry: the baseline captured when a
//! session starts or a graph is loaded. The cursor points at the entry that
//! matches the graph as last persisted; entries before it are undo targets
//! and entries after it are redo targets.

use log::debug;

use crate::graph::GraphSnapshot;

/// Bounded stack of full graph snapshots with a cursor.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<GraphSnapshot>,
    cursor: usize,
    limit: usize,
}

impl HistoryStore {
    /// Creates a history holding only `baseline`.
    ///
    /// `limit` is the maximum number of entries kept, never less than one.
    pub fn new(baseline: GraphSnapshot, limit: usize) -> Self {
        Self {
            entries: vec![baseline],
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Records a new entry after the cursor, discarding any redo tail.
    ///
    /// When the limit is exceeded the oldest entries are dropped.
    pub fn push(&mut self, snapshot: GraphSnapshot) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);

        let overflow = self.entries.len().saturating_sub(self.limit);
        if overflow > 0 {
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len() - 1;
        debug!(cursor = self.cursor, len = self.entries.len(); "History entry pushed");
    }

    /// Moves the cursor back and returns the entry to restore.
    pub fn undo(&mut self) -> Option<&GraphSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Moves the cursor forward and returns the entry to restore.
    pub fn redo(&mut self) -> Option<&GraphSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The entry matching the last persisted graph.
    pub fn current(&self) -> &GraphSnapshot {
        &self.entries[self.cursor]
    }

    /// Discards every entry and starts over from `baseline`.
    pub fn reset(&mut self, baseline: GraphSnapshot) {
        self.entries.clear();
        self.entries.push(baseline);
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
