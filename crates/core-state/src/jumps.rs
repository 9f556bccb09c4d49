use std::collections::VecDeque;

use core_text::Position;
use tracing::trace;

use crate::{DocumentId, EditorContext};

/// Default number of locations retained in jump history (Vim's jumplist size).
pub const JUMP_HISTORY_MAX: usize = 100;

/// A saved cursor position enabling "return to previous position" navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpLocation {
    pub position: Position,
    pub document: DocumentId,
}

impl JumpLocation {
    pub fn new(position: Position, document: DocumentId) -> Self {
        Self { position, document }
    }

    /// Capture the cursor of an editor context.
    pub fn of(editor: &dyn EditorContext) -> Self {
        Self::new(editor.cursor(), editor.document_id())
    }
}

/// Bounded, append-only jump list with a movable read cursor.
///
/// Every push adds an entry; beyond `capacity` the oldest is evicted.
#[derive(Debug, Clone)]
pub struct JumpHistory {
    entries: VecDeque<JumpLocation>,
    capacity: usize,
    /// Index of the entry returned by `current()`; `entries.len() - 1` after a push.
    cursor: usize,
}

impl Default for JumpHistory {
    fn default() -> Self {
        Self::with_capacity(JUMP_HISTORY_MAX)
    }
}

impl JumpHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &JumpLocation> {
        self.entries.iter()
    }

    pub fn push(&mut self, location: JumpLocation) {
        self.entries.push_back(location);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                trace!(
                    target: "state.jumps",
                    line = evicted.position.line,
                    capacity = self.capacity,
                    "jump_history_evicted"
                );
            }
        }
        self.cursor = self.entries.len() - 1;
        trace!(target: "state.jumps", depth = self.entries.len(), "push_jump");
    }

    /// Record the editor's current cursor.
    pub fn save_jump_location(&mut self, editor: &dyn EditorContext) {
        self.push(JumpLocation::of(editor));
    }

    /// Entry under the read cursor; the most recent entry right after a push.
    pub fn current(&self) -> Option<&JumpLocation> {
        self.entries.get(self.cursor)
    }

    /// Move the read cursor one entry older. No movement at the oldest entry.
    pub fn back(&mut self) -> Option<&JumpLocation> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Move the read cursor one entry newer. No movement at the newest entry.
    pub fn forward(&mut self) -> Option<&JumpLocation> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }
}
