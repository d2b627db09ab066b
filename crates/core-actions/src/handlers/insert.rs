//! Insert mode. Every edit is recorded into the undo group the editor opened
//! on entry, so one session undoes as a unit.

use core_state::{EditorState, Mode, UndoAction};
use core_text::Position;
use tracing::trace;

use super::{HandlerResult, Input};
use crate::Action;
use crate::motion::MotionKind;

#[derive(Debug, Default)]
pub struct InsertHandler;

impl InsertHandler {
    pub fn handle(&mut self, input: Input, state: &mut EditorState) -> HandlerResult {
        match input {
            Input::Key(key) => {
                match key.as_char() {
                    Some(ch) => insert(state, &ch.to_string()),
                    None => trace!(target: "actions.dispatch", %key, "insert_ignored_key"),
                }
                HandlerResult::none()
            }
            Input::Action(action) => self.action(action, state),
        }
    }

    fn action(&mut self, action: Action, state: &mut EditorState) -> HandlerResult {
        match action {
            Action::Escape => return HandlerResult::to(Mode::Normal),
            Action::Backspace => backspace(state),
            Action::DeleteForward => delete_forward(state),
            Action::Enter => {
                let row = state.cursor.row;
                let indent: String = state
                    .buffer
                    .line(row)
                    .unwrap_or_default()
                    .chars()
                    .take(state.cursor.col)
                    .take_while(|c| *c == ' ' || *c == '\t')
                    .collect();
                insert(state, &format!("\n{indent}"));
            }
            Action::Tab => {
                let text = if state.options.tab_inserts_spaces {
                    " ".repeat(state.options.shiftwidth.max(1))
                } else {
                    "\t".to_string()
                };
                insert(state, &text);
            }
            Action::Motion(kind) => move_in_insert(state, kind),
            other => trace!(target: "actions.dispatch", action = ?other, "ignored_in_insert"),
        }
        HandlerResult::none()
    }
}

fn insert(state: &mut EditorState, text: &str) {
    let at = state.cursor;
    state.cursor = state.buffer.insert_text(at, text);
    state.undo.record(UndoAction::Insert {
        at,
        text: text.to_string(),
    });
}

fn remove(state: &mut EditorState, start: Position, end: Position) {
    let text = state.buffer.delete_range(start, end);
    if !text.is_empty() {
        state.undo.record(UndoAction::Delete { at: start, text });
    }
}

/// Delete before the cursor; at column 0 join with the previous line.
fn backspace(state: &mut EditorState) {
    let Position { row, col } = state.cursor;
    let start = if col > 0 {
        Position::new(row, col - 1)
    } else if row > 0 {
        Position::new(row - 1, state.buffer.line_len(row - 1))
    } else {
        return;
    };
    remove(state, start, state.cursor);
    state.cursor = start;
}

/// Delete under the cursor; at line end pull up the next line.
fn delete_forward(state: &mut EditorState) {
    let Position { row, col } = state.cursor;
    let end = if col < state.buffer.line_len(row) {
        Position::new(row, col + 1)
    } else if row < state.buffer.last_row() {
        Position::new(row + 1, 0)
    } else {
        return;
    };
    remove(state, state.cursor, end);
}

/// Arrow keys, `<Home>` and `<End>`. The cursor may sit one past the last
/// character.
fn move_in_insert(state: &mut EditorState, kind: MotionKind) {
    let Position { row, col } = state.cursor;
    let buf = &state.buffer;
    state.cursor = match kind {
        MotionKind::Left => Position::new(row, col.saturating_sub(1)),
        MotionKind::Right => Position::new(row, (col + 1).min(buf.line_len(row))),
        MotionKind::Up if row > 0 => Position::new(row - 1, col.min(buf.line_len(row - 1))),
        MotionKind::Down if row < buf.last_row() => {
            Position::new(row + 1, col.min(buf.line_len(row + 1)))
        }
        MotionKind::LineStart | MotionKind::FirstNonBlank => Position::new(row, 0),
        MotionKind::LineEnd => Position::new(row, buf.line_len(row)),
        _ => return,
    };
}
