//! Operator framework: range computation and delete / change / yank / paste /
//! join over `EditorState`.
//!
//! Ranges are normalized (start <= end) before any operator sees them. A
//! charwise range is half-open `[start, end)`; a linewise range covers rows
//! `start.row..=end.row` and ignores columns.
//!
//! Mutating operators refuse on a readonly buffer: the buffer, registers and
//! undo log stay untouched and a message is left on the state. Yank never
//! mutates and is always allowed.

use core_state::{EditorState, RegisterContent, RegisterName, Selection, UndoAction};
use core_text::motion::{first_non_blank, last_col};
use core_text::{LineBuffer, Position};
use tracing::{debug, trace};

use crate::motion::{self, MotionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Delete,
    Change,
    Yank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpRange {
    pub start: Position,
    pub end: Position,
    pub linewise: bool,
}

impl OpRange {
    pub fn charwise(a: Position, b: Position) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self {
            start,
            end,
            linewise: false,
        }
    }

    pub fn lines(first: usize, last: usize) -> Self {
        let (a, b) = if first <= last {
            (first, last)
        } else {
            (last, first)
        };
        Self {
            start: Position::new(a, 0),
            end: Position::new(b, 0),
            linewise: true,
        }
    }

    pub fn line_count(&self) -> usize {
        self.end.row - self.start.row + 1
    }
}

/// Range an operator covers when combined with `kind` from `cursor`.
/// `None` when the motion fails or covers nothing.
pub fn range_for_motion(
    buf: &LineBuffer,
    cursor: Position,
    kind: MotionKind,
    count: u32,
    explicit: bool,
) -> Option<OpRange> {
    // `l` under an operator may reach one past the last character.
    let dest = if kind == MotionKind::Right {
        let len = buf.line_len(cursor.row);
        let col = (cursor.col + count.max(1) as usize).min(len);
        (col > cursor.col).then(|| Position::new(cursor.row, col))?
    } else {
        motion::resolve(buf, cursor, kind, count, explicit)?
    };
    if kind.is_linewise() {
        return Some(OpRange::lines(cursor.row, dest.row));
    }
    let mut range = OpRange::charwise(cursor, dest);
    if kind.is_inclusive() {
        range.end.col = (range.end.col + 1).min(buf.line_len(range.end.row));
    } else if range.end.row > range.start.row {
        // An exclusive motion that lands at the start of a later line stops
        // at the end of the line before it. For `w` the start of the line is
        // anything up to its first non-blank.
        let limit = match kind {
            MotionKind::WordForward => first_non_blank(buf, range.end).map_or(0, |p| p.col),
            _ => 0,
        };
        if range.end.col <= limit {
            let row = range.end.row - 1;
            range.end = Position::new(row, buf.line_len(row));
        }
    }
    (range.start != range.end).then_some(range)
}

/// `count` whole lines starting at `row` (`dd`, `yy`, `cc`).
pub fn range_for_lines(buf: &LineBuffer, row: usize, count: u32) -> OpRange {
    let last = (row + count.max(1) as usize - 1).min(buf.last_row());
    OpRange::lines(row, last)
}

/// Range covered by a visual selection. Charwise selections include the
/// character under their end; ending past the last character of a line
/// takes the line break too.
pub fn range_for_selection(buf: &LineBuffer, sel: &Selection) -> OpRange {
    let (a, b) = sel.normalized_range();
    if sel.line_mode {
        return OpRange::lines(a.row, b.row);
    }
    let len = buf.line_len(b.row);
    let end = if b.col >= len && b.row < buf.last_row() {
        Position::new(b.row + 1, 0)
    } else {
        Position::new(b.row, (b.col + 1).min(len))
    };
    OpRange::charwise(a, end)
}

fn content_of(buf: &LineBuffer, range: &OpRange) -> RegisterContent {
    if range.linewise {
        let lines = &buf.lines()[range.start.row..=range.end.row];
        RegisterContent::lines(lines)
    } else {
        RegisterContent::charwise(buf.text_range(range.start, range.end))
    }
}

/// Apply `op` over `range`. Returns false when refused (readonly) or when the
/// range is empty. Change leaves an undo group open for the Insert session
/// that follows; the caller switches to Insert mode.
pub fn apply(
    state: &mut EditorState,
    op: OperatorKind,
    range: OpRange,
    register: Option<RegisterName>,
) -> bool {
    debug!(target: "actions.operator", ?op, ?range, register = ?register, "apply");
    match op {
        OperatorKind::Yank => {
            yank(state, range, register);
            true
        }
        OperatorKind::Delete => {
            if !state.check_writable() {
                return false;
            }
            delete(state, range, register);
            true
        }
        OperatorKind::Change => {
            if !state.check_writable() {
                return false;
            }
            state.undo.begin_group();
            if range.linewise {
                change_lines(state, range, register);
            } else {
                delete(state, range, register);
                state.cursor = range.start;
            }
            true
        }
    }
}

fn yank(state: &mut EditorState, range: OpRange, register: Option<RegisterName>) {
    let content = content_of(&state.buffer, &range);
    state.registers.record_yank(content, register);
    if range.linewise {
        let n = range.line_count();
        if n > 2 {
            state.set_message(format!("{n} lines yanked"));
        }
        if state.cursor.row > range.start.row {
            state.cursor.row = range.start.row;
        }
    } else {
        state.cursor = range.start;
    }
}

fn delete(state: &mut EditorState, range: OpRange, register: Option<RegisterName>) {
    if range.linewise {
        let row = range.start.row;
        let n = range.line_count();
        let emptied = n >= state.buffer.line_count();
        let lines = state.buffer.delete_lines(row, n);
        state
            .registers
            .record_delete(RegisterContent::lines(&lines), register);
        state.undo.record(UndoAction::DeleteLines {
            row,
            lines,
            emptied,
        });
        let row = row.min(state.buffer.last_row());
        state.cursor = first_non_blank(&state.buffer, Position::new(row, 0))
            .unwrap_or(Position::new(row, 0));
        if n > 2 {
            state.set_message(format!("{n} fewer lines"));
        }
    } else {
        let text = state.buffer.delete_range(range.start, range.end);
        if text.is_empty() {
            return;
        }
        state
            .registers
            .record_delete(RegisterContent::charwise(text.clone()), register);
        state.undo.record(UndoAction::Delete {
            at: range.start,
            text,
        });
        state.cursor = range.start;
    }
    trace!(target: "actions.operator", cursor = ?state.cursor, lines = state.buffer.line_count(), "deleted");
}

/// `cc`: the lines go to the registers, one empty line stays for typing.
fn change_lines(state: &mut EditorState, range: OpRange, register: Option<RegisterName>) {
    let row = range.start.row;
    let content = content_of(&state.buffer, &range);
    let n = range.line_count();
    if n > 1 {
        let lines = state.buffer.delete_lines(row + 1, n - 1);
        state.undo.record(UndoAction::DeleteLines {
            row: row + 1,
            lines,
            emptied: false,
        });
    }
    let at = Position::new(row, 0);
    let text = state
        .buffer
        .delete_range(at, Position::new(row, state.buffer.line_len(row)));
    if !text.is_empty() {
        state.undo.record(UndoAction::Delete { at, text });
    }
    state.registers.record_delete(content, register);
    state.cursor = at;
}

/// `p` / `P`: insert register content `count` times after / before the
/// cursor. Linewise content goes below / above the cursor line.
pub fn paste(
    state: &mut EditorState,
    register: Option<RegisterName>,
    before: bool,
    count: u32,
) -> bool {
    let name = register.unwrap_or(RegisterName::Unnamed);
    let Some(content) = state.registers.read(name) else {
        state.set_message(format!("E353: Nothing in register {}", name.as_char()));
        return false;
    };
    if !state.check_writable() {
        return false;
    }
    let count = count.max(1) as usize;
    if content.linewise {
        let one = content.to_lines();
        let lines: Vec<String> = std::iter::repeat_n(one, count).flatten().collect();
        let row = if before {
            state.cursor.row
        } else {
            state.cursor.row + 1
        };
        state.buffer.insert_lines(row, &lines);
        state.undo.record(UndoAction::InsertLines { row, lines });
        state.cursor = first_non_blank(&state.buffer, Position::new(row, 0))
            .unwrap_or(Position::new(row, 0));
    } else {
        let text = content.text.repeat(count);
        let len = state.buffer.line_len(state.cursor.row);
        let at = if before || len == 0 {
            state.cursor
        } else {
            Position::new(state.cursor.row, (state.cursor.col + 1).min(len))
        };
        let end = state.buffer.insert_text(at, &text);
        state.undo.record(UndoAction::Insert { at, text: text.clone() });
        state.cursor = if text.contains('\n') {
            at
        } else {
            Position::new(end.row, end.col.saturating_sub(1))
        };
    }
    debug!(target: "actions.operator", register = %name, linewise = content.linewise, count, "paste");
    true
}

/// Visual `p`: replace the selected range with register content.
pub fn replace_range(
    state: &mut EditorState,
    range: OpRange,
    register: Option<RegisterName>,
) -> bool {
    let name = register.unwrap_or(RegisterName::Unnamed);
    let Some(content) = state.registers.read(name) else {
        state.set_message(format!("E353: Nothing in register {}", name.as_char()));
        return false;
    };
    if !state.check_writable() {
        return false;
    }
    state.undo.begin_group();
    delete(state, range, None);
    let at = range.start;
    if content.linewise {
        let lines = content.to_lines();
        let row = if range.linewise {
            at.row
        } else {
            // Split the line so the pasted lines sit between the halves.
            state.buffer.insert_text(at, "\n");
            state.undo.record(UndoAction::Insert {
                at,
                text: "\n".to_string(),
            });
            at.row + 1
        };
        let emptied_placeholder = range.linewise
            && state.buffer.line_count() == 1
            && state.buffer.line_len(0) == 0;
        state.buffer.insert_lines(row, &lines);
        state.undo.record(UndoAction::InsertLines {
            row,
            lines: lines.clone(),
        });
        if emptied_placeholder {
            // The delete left a lone empty line; drop it so the content is
            // replaced rather than followed by a blank line.
            let last = state.buffer.last_row();
            let removed = state.buffer.delete_lines(last, 1);
            state.undo.record(UndoAction::DeleteLines {
                row: last,
                lines: removed,
                emptied: false,
            });
        }
        state.cursor = Position::new(row, 0);
    } else {
        let end = state.buffer.insert_text(at, &content.text);
        state.undo.record(UndoAction::Insert {
            at,
            text: content.text.clone(),
        });
        state.cursor = Position::new(end.row, end.col.saturating_sub(1));
    }
    state.undo.end_group();
    true
}

/// `J`: join `count` lines (at least two) starting at `row`, separating them
/// with one space and dropping the joined line's leading whitespace.
pub fn join_lines(state: &mut EditorState, row: usize, count: u32) -> bool {
    if row >= state.buffer.last_row() {
        return false;
    }
    if !state.check_writable() {
        return false;
    }
    let joins = (count.max(2) as usize - 1).min(state.buffer.last_row() - row);
    state.undo.begin_group();
    let mut join_col = 0;
    for _ in 0..joins {
        let current = state.buffer.line(row).unwrap_or_default();
        let len = current.chars().count();
        let current_blank = current.is_empty() || current.ends_with(' ');
        let next = state.buffer.line(row + 1).unwrap_or_default();
        let indent = next.chars().take_while(|c| c.is_whitespace()).count();
        let next_empty = indent == next.chars().count();
        let starts_paren = next.trim_start().starts_with(')');
        let at = Position::new(row, len);
        let removed = state
            .buffer
            .delete_range(at, Position::new(row + 1, indent));
        state.undo.record(UndoAction::Delete { at, text: removed });
        if !next_empty && !starts_paren && !current_blank {
            state.buffer.insert_text(at, " ");
            state.undo.record(UndoAction::Insert {
                at,
                text: " ".to_string(),
            });
        }
        join_col = len;
    }
    state.undo.end_group();
    state.cursor = Position::new(row, join_col.min(last_col(&state.buffer, row)));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::LineBuffer;
    use pretty_assertions::assert_eq;

    fn state(lines: &[&str]) -> EditorState {
        EditorState::new(LineBuffer::from_lines(
            "t",
            lines.iter().map(|s| s.to_string()).collect(),
        ))
    }

    fn lines(st: &EditorState) -> Vec<&str> {
        st.buffer.lines().iter().map(String::as_str).collect()
    }

    #[test]
    fn dw_is_exclusive_and_stops_at_line_end() {
        let b = LineBuffer::from_lines("t", vec!["foo bar".into(), "baz".into()]);
        let r = range_for_motion(&b, Position::new(0, 4), MotionKind::WordForward, 1, false).unwrap();
        assert_eq!(r.end, Position::new(0, 7));
        let r = range_for_motion(&b, Position::new(0, 0), MotionKind::WordForward, 1, false).unwrap();
        assert_eq!(r.end, Position::new(0, 4));
    }

    #[test]
    fn counted_w_keeps_words_on_later_lines() {
        let b = LineBuffer::from_lines("t", vec!["foo".into(), "  bar baz".into()]);
        let r = range_for_motion(&b, Position::origin(), MotionKind::WordForward, 2, true).unwrap();
        assert_eq!(r.end, Position::new(1, 6));
        let r = range_for_motion(&b, Position::origin(), MotionKind::WordForward, 1, false).unwrap();
        assert_eq!(r.end, Position::new(0, 3));
    }

    #[test]
    fn dl_reaches_past_last_char() {
        let b = LineBuffer::from_lines("t", vec!["ab".into()]);
        let r = range_for_motion(&b, Position::new(0, 1), MotionKind::Right, 1, false).unwrap();
        assert_eq!((r.start.col, r.end.col), (1, 2));
        let empty = LineBuffer::new("e");
        assert_eq!(
            range_for_motion(&empty, Position::origin(), MotionKind::Right, 1, false),
            None
        );
    }

    #[test]
    fn inclusive_find_char() {
        let b = LineBuffer::from_lines("t", vec!["a,b,c".into()]);
        let r = range_for_motion(&b, Position::new(0, 0), MotionKind::FindChar { ch: ',', forward: true }, 2, true).unwrap();
        assert_eq!(r.end, Position::new(0, 4));
    }

    #[test]
    fn delete_lines_and_register() {
        let mut st = state(&["one", "two", "three"]);
        let r = range_for_lines(&st.buffer, 0, 2);
        assert!(apply(&mut st, OperatorKind::Delete, r, None));
        assert_eq!(lines(&st), vec!["three"]);
        let reg = st.registers.peek(RegisterName::Unnamed).unwrap();
        assert_eq!(reg.text, "one\ntwo\n");
        assert!(reg.linewise);
        assert_eq!(st.undo.undo_depth(), 1);
    }

    #[test]
    fn readonly_refuses_without_side_effects() {
        let mut st = state(&["text"]);
        st.buffer.set_readonly(true);
        let r = range_for_lines(&st.buffer, 0, 1);
        assert!(!apply(&mut st, OperatorKind::Delete, r, None));
        assert_eq!(lines(&st), vec!["text"]);
        assert_eq!(st.undo.undo_depth(), 0);
        assert!(st.registers.peek(RegisterName::Unnamed).is_none());
        // Yank still works.
        assert!(apply(&mut st, OperatorKind::Yank, r, None));
        assert_eq!(st.registers.peek(RegisterName::Yank).unwrap().text, "text\n");
    }

    #[test]
    fn charwise_paste_after_and_before() {
        let mut st = state(&["abc"]);
        st.registers.record_yank(RegisterContent::charwise("XY"), None);
        assert!(paste(&mut st, None, false, 1));
        assert_eq!(lines(&st), vec!["aXYbc"]);
        assert_eq!(st.cursor, Position::new(0, 2));
        st.cursor = Position::origin();
        assert!(paste(&mut st, None, true, 2));
        assert_eq!(lines(&st), vec!["XYXYaXYbc"]);
    }

    #[test]
    fn linewise_paste_shifts_lines_down() {
        let mut st = state(&["a", "b", "c"]);
        let r = range_for_lines(&st.buffer, 0, 2);
        apply(&mut st, OperatorKind::Yank, r, None);
        st.cursor = Position::new(2, 0);
        assert!(paste(&mut st, None, false, 1));
        assert_eq!(lines(&st), vec!["a", "b", "c", "a", "b"]);
        assert_eq!(st.cursor, Position::new(3, 0));
    }

    #[test]
    fn paste_from_empty_register_reports() {
        let mut st = state(&["x"]);
        assert!(!paste(&mut st, RegisterName::parse("q"), false, 1));
        assert_eq!(st.message(), Some("E353: Nothing in register q"));
    }

    #[test]
    fn change_lines_keeps_one_empty_line_and_group_open() {
        let mut st = state(&["keep", "a", "b", "tail"]);
        let r = range_for_lines(&st.buffer, 1, 2);
        assert!(apply(&mut st, OperatorKind::Change, r, None));
        assert_eq!(lines(&st), vec!["keep", "", "tail"]);
        assert!(st.undo.is_group_open());
        st.undo.end_group();
        let mut cur = st.cursor;
        st.undo.undo(&mut st.buffer, &mut cur);
        assert_eq!(lines(&st), vec!["keep", "a", "b", "tail"]);
    }

    #[test]
    fn join_inserts_single_space() {
        let mut st = state(&["foo", "   bar", "baz"]);
        assert!(join_lines(&mut st, 0, 3));
        assert_eq!(lines(&st), vec!["foo bar baz"]);
        let mut cur = st.cursor;
        st.undo.undo(&mut st.buffer, &mut cur);
        assert_eq!(lines(&st), vec!["foo", "   bar", "baz"]);
    }

    #[test]
    fn visual_replace_swaps_text() {
        let mut st = state(&["hello world"]);
        st.registers.record_yank(RegisterContent::charwise("bye"), None);
        let sel = Selection {
            start: Position::new(0, 0),
            end: Position::new(0, 4),
            line_mode: false,
        };
        let r = range_for_selection(&st.buffer, &sel);
        assert!(replace_range(&mut st, r, None));
        assert_eq!(lines(&st), vec!["bye world"]);
        assert_eq!(st.undo.undo_depth(), 1);
    }
}
