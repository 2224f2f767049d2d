use std::collections::VecDeque;

use super::selection::Selection;
use super::transaction::ChangeSet;

/// Undo steps kept before the oldest is dropped.
pub const DEFAULT_MAX_STEPS: usize = 200;

/// A recorded edit: the forward changes, their inverse, and the selection
/// on either side.
#[derive(Debug, Clone)]
pub(crate) struct HistoryEntry {
    pub(crate) changes: ChangeSet,
    pub(crate) inverse: ChangeSet,
    pub(crate) selection_before: Selection,
    pub(crate) selection_after: Selection,
}

/// Bounded undo/redo stacks. Recording a new edit clears redo.
#[derive(Debug, Clone)]
pub(crate) struct History {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    max_steps: usize,
}

impl History {
    pub(crate) fn new(max_steps: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_steps,
        }
    }

    pub(crate) fn record(&mut self, entry: HistoryEntry) {
        self.redo.clear();
        self.undo.push_back(entry);
        while self.undo.len() > self.max_steps {
            self.undo.pop_front();
        }
    }

    /// Move the newest undo step onto the redo stack and return it.
    pub(crate) fn undo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.undo.pop_back()?;
        self.redo.push(entry);
        self.redo.last()
    }

    /// Move the newest redo step back onto the undo stack and return it.
    pub(crate) fn redo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.redo.pop()?;
        self.undo.push_back(entry);
        self.undo.back()
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEPS)
    }
}
