//! Bounded snapshot history for linear undo/redo.
//!
//! Two stacks of whole-document snapshots: the undo stack holds
//! pre-mutation states (oldest evicted beyond the limit) and the redo
//! stack holds states stepped back over. Any fresh mutation clears the
//! redo stack; branching history is deliberately unsupported.

use std::collections::VecDeque;

use crate::model::GraphDocument;

#[derive(Debug)]
pub struct History {
    undo: VecDeque<GraphDocument>,
    redo: Vec<GraphDocument>,
    limit: usize,
}

impl History {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(limit.min(64)),
            redo: Vec::new(),
            limit,
        }
    }

    /// Record a pre-mutation snapshot.
    ///
    /// Called before every fresh mutation: discards any redo path and
    /// evicts the oldest snapshot once the bound is reached.
    pub fn record(&mut self, snapshot: GraphDocument) {
        self.redo.clear();
        self.undo.push_back(snapshot);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Step back: exchange the current state for the most recent
    /// undo snapshot. Returns `None` when there is nothing to undo.
    pub fn step_back(&mut self, current: GraphDocument) -> Option<GraphDocument> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward: exchange the current state for the most recent
    /// redo snapshot. Returns `None` when there is nothing to redo.
    pub fn step_forward(&mut self, current: GraphDocument) -> Option<GraphDocument> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        Some(next)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
}
