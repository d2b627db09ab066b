//! Grouped, reversible action log.
//!
//! Every entry on either stack is a non-empty group of actions that undo and
//! redo as one unit. Actions carry the text they inserted or removed, so both
//! directions replay through the raw `LineBuffer` primitives without touching
//! the log again.

use std::collections::VecDeque;

use core_text::{LineBuffer, Position};
use tracing::trace;

/// Default capacity of each stack.
pub const MAX_STACK_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAction {
    /// `text` (possibly spanning lines) was inserted at `at`.
    Insert { at: Position, text: String },
    /// `text` was removed starting at `at`.
    Delete { at: Position, text: String },
    /// Whole lines were inserted so the first landed on `row`.
    InsertLines { row: usize, lines: Vec<String> },
    /// Whole lines were removed from `row`. `emptied` records that they were
    /// every line in the buffer, which left a single empty line behind.
    DeleteLines {
        row: usize,
        lines: Vec<String>,
        emptied: bool,
    },
}

impl UndoAction {
    pub fn apply(&self, buf: &mut LineBuffer) {
        match self {
            UndoAction::Insert { at, text } => {
                buf.insert_text(*at, text);
            }
            UndoAction::Delete { at, text } => {
                buf.delete_range(*at, text_end(*at, text));
            }
            UndoAction::InsertLines { row, lines } => buf.insert_lines(*row, lines),
            UndoAction::DeleteLines { row, lines, .. } => {
                buf.delete_lines(*row, lines.len());
            }
        }
    }

    pub fn revert(&self, buf: &mut LineBuffer) {
        match self {
            UndoAction::Insert { at, text } => {
                buf.delete_range(*at, text_end(*at, text));
            }
            UndoAction::Delete { at, text } => {
                buf.insert_text(*at, text);
            }
            UndoAction::InsertLines { row, lines } => {
                buf.delete_lines(*row, lines.len());
            }
            UndoAction::DeleteLines {
                lines,
                emptied: true,
                ..
            } => buf.replace_all(lines.clone()),
            UndoAction::DeleteLines { row, lines, .. } => buf.insert_lines(*row, lines),
        }
    }

    /// Where the cursor lands after this action is undone or redone.
    pub fn cursor(&self) -> Position {
        match self {
            UndoAction::Insert { at, .. } | UndoAction::Delete { at, .. } => *at,
            UndoAction::InsertLines { row, .. } | UndoAction::DeleteLines { row, .. } => {
                Position::new(*row, 0)
            }
        }
    }
}

/// Position just past `text` when it is inserted at `at`.
pub fn text_end(at: Position, text: &str) -> Position {
    match text.rsplit_once('\n') {
        None => Position::new(at.row, at.col + text.chars().count()),
        Some((head, tail)) => Position::new(
            at.row + head.matches('\n').count() + 1,
            tail.chars().count(),
        ),
    }
}

pub type UndoGroup = Vec<UndoAction>;

#[derive(Debug)]
pub struct UndoManager {
    undo_stack: VecDeque<UndoGroup>,
    redo_stack: VecDeque<UndoGroup>,
    open: Option<UndoGroup>,
    max: usize,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(MAX_STACK_SIZE)
    }
}

impl UndoManager {
    /// `max_stack_size` is raised to 1 if given as 0.
    pub fn new(max_stack_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            open: None,
            max: max_stack_size.max(1),
        }
    }

    pub fn max_stack_size(&self) -> usize {
        self.max
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn is_group_open(&self) -> bool {
        self.open.is_some()
    }

    /// Record an action the caller has already applied to the buffer.
    pub fn record(&mut self, action: UndoAction) {
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            trace!(target: "state.undo", "redo_stack_cleared_on_new_edit");
        }
        match &mut self.open {
            Some(group) => {
                group.push(action);
                trace!(target: "state.undo", group_len = group.len(), "record_in_group");
            }
            None => self.push_undo(vec![action]),
        }
    }

    /// Open a group. Opening while one is already open continues that group.
    pub fn begin_group(&mut self) {
        if self.open.is_none() {
            self.open = Some(Vec::new());
            trace!(target: "state.undo", "begin_group");
        }
    }

    /// Close the open group; an empty group is dropped. No-op when no group
    /// is open.
    pub fn end_group(&mut self) {
        match self.open.take() {
            Some(group) if group.is_empty() => {
                trace!(target: "state.undo", "empty_group_discarded");
            }
            Some(group) => {
                trace!(target: "state.undo", actions = group.len(), "end_group");
                self.push_undo(group);
            }
            None => {}
        }
    }

    fn push_undo(&mut self, group: UndoGroup) {
        self.undo_stack.push_back(group);
        if self.undo_stack.len() > self.max {
            self.undo_stack.pop_front();
            trace!(target: "state.undo", "undo_stack_trimmed");
        }
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "push_group");
    }

    /// Revert the newest group. Returns false when there is nothing to undo.
    pub fn undo(&mut self, buf: &mut LineBuffer, cursor: &mut Position) -> bool {
        self.end_group();
        let Some(group) = self.undo_stack.pop_back() else {
            return false;
        };
        for action in group.iter().rev() {
            action.revert(buf);
        }
        if let Some(first) = group.first() {
            *cursor = buf.clamp(first.cursor());
        }
        self.redo_stack.push_back(group);
        if self.redo_stack.len() > self.max {
            self.redo_stack.pop_front();
        }
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        true
    }

    /// Re-apply the newest undone group. Returns false when there is nothing
    /// to redo.
    pub fn redo(&mut self, buf: &mut LineBuffer, cursor: &mut Position) -> bool {
        self.end_group();
        let Some(group) = self.redo_stack.pop_back() else {
            return false;
        };
        for action in &group {
            action.apply(buf);
        }
        if let Some(first) = group.first() {
            *cursor = buf.clamp(first.cursor());
        }
        self.undo_stack.push_back(group);
        if self.undo_stack.len() > self.max {
            self.undo_stack.pop_front();
        }
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "redo_pop");
        true
    }
}
