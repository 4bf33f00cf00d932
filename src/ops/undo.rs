use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ops::section_ops::CollapsedHeader;

/// Maximum number of moves kept for undo; the oldest is evicted first.
pub const UNDO_LOG_LIMIT: usize = 50;

/// A completed move, recorded so it can be reversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAction {
    /// Note the to-do was taken from; empty for to-dos captured directly
    pub source_file: String,
    pub dest_file: String,
    pub task_content: String,
    /// Index the to-do occupied in the source note
    pub source_line: usize,
    /// Lines added to the destination note, as indices after the insert
    pub inserted_lines: Vec<usize>,
    pub header_added: bool,
    /// Destination section name
    pub header: String,
    /// Index of the destination header after the insert
    pub header_line: usize,
    /// Blank lines under the destination header that the insert collapsed
    #[serde(default)]
    pub blank_lines_removed: usize,
    /// Source section header dropped because the move emptied it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_header: Option<CollapsedHeader>,
    /// Whether the source note ended with a newline before the move
    #[serde(default = "default_true")]
    pub source_ended_with_newline: bool,
}

fn default_true() -> bool {
    true
}

impl MoveAction {
    /// Whether the to-do came from another note (as opposed to being captured).
    pub fn has_source(&self) -> bool {
        !self.source_file.is_empty()
    }
}

/// Bounded history of moves, newest last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoLog {
    entries: VecDeque<MoveAction>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a move, evicting the oldest entries beyond [`UNDO_LOG_LIMIT`].
    pub fn push(&mut self, action: MoveAction) {
        self.entries.push_back(action);
        while self.entries.len() > UNDO_LOG_LIMIT {
            self.entries.pop_front();
        }
    }

    /// Remove and return the most recent move, or `None` when empty.
    pub fn pop(&mut self) -> Option<MoveAction> {
        self.entries.pop_back()
    }

    pub fn peek(&self) -> Option<&MoveAction> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Moves from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &MoveAction> {
        self.entries.iter().rev()
    }

    /// Drop anything past the limit, e.g. after loading a hand-edited file.
    pub fn enforce_limit(&mut self) {
        while self.entries.len() > UNDO_LOG_LIMIT {
            self.entries.pop_front();
        }
    }
}
