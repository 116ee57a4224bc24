//! Bounded undo/redo over full document snapshots.

use crate::format::DocumentJson;
use std::collections::VecDeque;

/// Default number of snapshots kept, baseline included.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Snapshot history.
///
/// The back of `undo` is always the current document; everything before it
/// can be returned to. Once a document is loaded there is at least one entry.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<DocumentJson>,
    redo: Vec<DocumentJson>,
    limit: usize,
    replaying: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
            replaying: false,
        }
    }

    /// Drop everything and seed the baseline for a freshly loaded document.
    pub fn reset(&mut self, baseline: DocumentJson) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push_back(baseline);
        self.replaying = false;
    }

    /// Record a committed change. Ignored while a snapshot is being replayed
    /// and when nothing actually changed.
    pub fn push(&mut self, snapshot: DocumentJson) -> bool {
        if self.replaying {
            return false;
        }
        if self.undo.back() == Some(&snapshot) {
            return false;
        }
        self.undo.push_back(snapshot);
        self.redo.clear();
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        true
    }

    /// Step back; returns the snapshot to hydrate.
    pub fn undo(&mut self) -> Option<DocumentJson> {
        if self.undo.len() <= 1 {
            return None;
        }
        let current = self.undo.pop_back()?;
        self.redo.push(current);
        self.undo.back().cloned()
    }

    /// Step forward again; returns the snapshot to hydrate.
    pub fn redo(&mut self) -> Option<DocumentJson> {
        let next = self.redo.pop()?;
        self.undo.push_back(next.clone());
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Snapshots on the undo side, current included.
    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn current(&self) -> Option<&DocumentJson> {
        self.undo.back()
    }

    /// Oldest snapshot still reachable by undo.
    pub fn oldest(&self) -> Option<&DocumentJson> {
        self.undo.front()
    }

    /// Suppress pushes until [`History::end_replay`].
    pub fn begin_replay(&mut self) {
        self.replaying = true;
    }

    pub fn end_replay(&mut self) {
        self.replaying = false;
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }
}
