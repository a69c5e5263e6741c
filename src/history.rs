//! Bounded linear undo/redo over whole layer-stack snapshots.

use std::collections::VecDeque;

use crate::layer::stack::LayerStack;

/// Linear snapshot history with a cursor.
///
/// Snapshots are [`LayerStack`] values, which share their storage by `Arc`, so keeping one per
/// edit is cheap and no snapshot is ever mutated after it is recorded.
#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<LayerStack>,
    index: usize,
    max_depth: usize,
}

impl History {
    /// History holding only `initial`. `max_depth` is clamped to at least 1.
    pub fn new(initial: LayerStack, max_depth: usize) -> Self {
        Self {
            entries: VecDeque::from([initial]),
            index: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Record `snapshot` as the newest state, discarding any redo branch and evicting the oldest
    /// entries beyond the depth limit.
    pub fn push(&mut self, snapshot: LayerStack) {
        self.entries.truncate(self.index + 1);
        self.entries.push_back(snapshot);
        let mut evicted = 0usize;
        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            tracing::debug!(evicted, depth = self.max_depth, "history evicted oldest snapshots");
        }
        self.index = self.entries.len() - 1;
    }

    /// Step back. `None` (and no change) at the oldest entry.
    pub fn undo(&mut self) -> Option<&LayerStack> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward. `None` (and no change) at the newest entry.
    pub fn redo(&mut self) -> Option<&LayerStack> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    /// Overwrite the snapshot at the cursor without touching the undo or redo entries.
    pub fn amend_current(&mut self, snapshot: LayerStack) {
        if let Some(entry) = self.entries.get_mut(self.index) {
            *entry = snapshot;
        }
    }

    /// Forget everything and start over from `snapshot`.
    pub fn reset(&mut self, snapshot: LayerStack) {
        self.entries.clear();
        self.entries.push_back(snapshot);
        self.index = 0;
    }

    /// Whether [`Self::undo`] would move.
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    /// Whether [`Self::redo`] would move.
    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Snapshot at the cursor.
    pub fn current(&self) -> Option<&LayerStack> {
        self.entries.get(self.index)
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: a history holds at least one snapshot.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Depth limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
#[path = "../tests/unit/history.rs"]
mod tests;
