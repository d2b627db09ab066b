use core_state::{CharSearch, EditorState, Mode, UndoAction};
use core_text::Position;
use core_text::motion::{CharClass, classify, first_non_blank};
use tracing::{debug, trace};

use super::pending::{Awaiting, PendingContext, move_cursor, repeat_search};
use super::search::search_and_move;
use super::{HandlerResult, Input, ModeRequest};
use crate::motion::MotionKind;
use crate::operator::{self, OpRange, OperatorKind};
use crate::{Action, InsertAt};

#[derive(Debug, Default)]
pub struct NormalHandler {
    pending: PendingContext,
}

impl NormalHandler {
    pub fn pending(&self) -> &PendingContext {
        &self.pending
    }

    pub fn handle(&mut self, input: Input, state: &mut EditorState) -> HandlerResult {
        match input {
            Input::Key(key) => self.key(key.as_char(), state),
            Input::Action(action) => self.action(action, state),
        }
    }

    /// A key no binding claimed: either the argument of `f`/`"`, or noise
    /// that cancels whatever was pending.
    fn key(&mut self, ch: Option<char>, state: &mut EditorState) -> HandlerResult {
        match self.pending.take_awaiting() {
            Some(Awaiting::Register) => {
                self.pending.accept_register(ch);
                HandlerResult::none()
            }
            Some(Awaiting::Char { kind, forward }) => {
                let Some(ch) = ch else {
                    self.pending.reset();
                    return HandlerResult::none();
                };
                let search = CharSearch { ch, kind, forward };
                state.last_char_search = Some(search);
                self.motion(super::pending::char_motion(search), state)
            }
            None => {
                trace!(target: "actions.dispatch", ?ch, "unmapped_key");
                self.pending.reset();
                HandlerResult::none()
            }
        }
    }

    fn action(&mut self, action: Action, state: &mut EditorState) -> HandlerResult {
        let count = self.pending.count();
        let register = self.pending.register();
        match action {
            Action::Count(0) if !self.pending.has_count() => {
                self.motion(MotionKind::LineStart, state)
            }
            Action::Count(d) => {
                self.pending.push_digit(d);
                HandlerResult::none()
            }
            Action::RegisterPrefix => {
                self.pending.await_key(Awaiting::Register);
                HandlerResult::none()
            }
            Action::Motion(kind) => self.motion(kind, state),
            Action::CharSearch { kind, forward } => {
                self.pending.await_key(Awaiting::Char { kind, forward });
                HandlerResult::none()
            }
            Action::RepeatCharSearch { reverse } => match repeat_search(state, reverse) {
                Some(kind) => self.motion(kind, state),
                None => {
                    self.pending.reset();
                    HandlerResult::none()
                }
            },
            Action::Operator(op) => self.operator(op, state),
            Action::Escape => {
                self.pending.reset();
                HandlerResult::none()
            }
            other => {
                // Everything below acts immediately; a half-typed operator
                // followed by one of these is cancelled.
                if self.pending.operator().is_some() {
                    self.pending.reset();
                    return HandlerResult::none();
                }
                self.pending.reset();
                self.immediate(other, count, register, state)
            }
        }
    }

    fn immediate(
        &mut self,
        action: Action,
        count: u32,
        register: Option<core_state::RegisterName>,
        state: &mut EditorState,
    ) -> HandlerResult {
        match action {
            Action::DeleteChar => self.shorthand(OperatorKind::Delete, MotionKind::Right, count, register, state),
            Action::DeleteCharBefore => self.shorthand(OperatorKind::Delete, MotionKind::Left, count, register, state),
            Action::DeleteToLineEnd => self.shorthand(OperatorKind::Delete, MotionKind::LineEnd, count, register, state),
            Action::ChangeToLineEnd => self.shorthand(OperatorKind::Change, MotionKind::LineEnd, count, register, state),
            Action::SubstituteChar => self.shorthand(OperatorKind::Change, MotionKind::Right, count, register, state),
            Action::YankLine => {
                let range = operator::range_for_lines(&state.buffer, state.cursor.row, count);
                apply_operator(OperatorKind::Yank, Some(range), register, state)
            }
            Action::Paste { before } => {
                operator::paste(state, register, before, count);
                HandlerResult::none()
            }
            Action::Undo => undo_redo(state, count, true),
            Action::Redo => undo_redo(state, count, false),
            Action::Insert(at) => start_insert(at, state),
            Action::Visual { line_mode } => {
                HandlerResult::request(ModeRequest::StartVisual { line_mode })
            }
            Action::CommandLine => {
                state.command_line.begin(':');
                HandlerResult::to(Mode::Command)
            }
            Action::Search { forward } => {
                state.command_line.begin(if forward { '/' } else { '?' });
                HandlerResult::to(Mode::Search)
            }
            Action::SearchNext { reverse } => {
                let Some(last) = state.last_search.clone() else {
                    return HandlerResult::message("E35: No previous regular expression");
                };
                let forward = last.forward ^ reverse;
                let mut result = HandlerResult::none();
                for _ in 0..count {
                    result = search_and_move(state, &last.pattern, forward);
                    if result.message.as_deref().is_some_and(|m| m.starts_with('E')) {
                        break;
                    }
                }
                result
            }
            Action::JoinLines => {
                operator::join_lines(state, state.cursor.row, count);
                HandlerResult::none()
            }
            other => {
                trace!(target: "actions.dispatch", action = ?other, "ignored_in_normal");
                HandlerResult::none()
            }
        }
    }

    fn motion(&mut self, kind: MotionKind, state: &mut EditorState) -> HandlerResult {
        let count = self.pending.count();
        let explicit = self.pending.explicit();
        let register = self.pending.register();
        let op = self.pending.operator();
        self.pending.reset();
        let Some(op) = op else {
            move_cursor(state, kind, count, explicit);
            return HandlerResult::none();
        };
        let range = if op == OperatorKind::Change && kind == MotionKind::WordForward {
            change_word_range(state, count)
        } else {
            operator::range_for_motion(&state.buffer, state.cursor, kind, count, explicit)
        };
        apply_operator(op, range, register, state)
    }

    fn operator(&mut self, op: OperatorKind, state: &mut EditorState) -> HandlerResult {
        match self.pending.operator() {
            None => {
                self.pending.set_operator(op);
                HandlerResult::none()
            }
            Some(pending) if pending == op => {
                // `dd`, `cc`, `yy`: whole lines.
                let count = self.pending.count();
                let register = self.pending.register();
                self.pending.reset();
                let range = operator::range_for_lines(&state.buffer, state.cursor.row, count);
                apply_operator(op, Some(range), register, state)
            }
            Some(_) => {
                self.pending.reset();
                HandlerResult::none()
            }
        }
    }

    fn shorthand(
        &mut self,
        op: OperatorKind,
        kind: MotionKind,
        count: u32,
        register: Option<core_state::RegisterName>,
        state: &mut EditorState,
    ) -> HandlerResult {
        let range = operator::range_for_motion(&state.buffer, state.cursor, kind, count, count > 1);
        apply_operator(op, range, register, state)
    }
}

/// Run `op` over `range`; Change continues in Insert mode even when the
/// range is empty (`C` on an empty line).
pub(crate) fn apply_operator(
    op: OperatorKind,
    range: Option<OpRange>,
    register: Option<core_state::RegisterName>,
    state: &mut EditorState,
) -> HandlerResult {
    let done = match range {
        Some(range) => operator::apply(state, op, range, register),
        None if op == OperatorKind::Change => {
            if state.check_writable() {
                state.undo.begin_group();
                true
            } else {
                false
            }
        }
        None => false,
    };
    if done && op == OperatorKind::Change {
        return HandlerResult::request(ModeRequest::Transition {
            to: Mode::Insert,
            clear_selection: true,
        });
    }
    HandlerResult::none()
}

/// `cw` on a word changes to the end of the word, not up to the next one.
fn change_word_range(state: &EditorState, count: u32) -> Option<OpRange> {
    let buf = &state.buffer;
    let cur = state.cursor;
    let here = buf.char_at(cur)?;
    if classify(here) == CharClass::Blank {
        return operator::range_for_motion(buf, cur, MotionKind::WordForward, count, false);
    }
    let next = buf.char_at(Position::new(cur.row, cur.col + 1));
    let at_word_end = next.is_none_or(|c| classify(c) != classify(here));
    if at_word_end && count <= 1 {
        return Some(OpRange::charwise(cur, Position::new(cur.row, cur.col + 1)));
    }
    let count = if at_word_end { count - 1 } else { count };
    operator::range_for_motion(buf, cur, MotionKind::WordEnd, count, false)
}

fn undo_redo(state: &mut EditorState, count: u32, undo: bool) -> HandlerResult {
    if !state.check_writable() {
        return HandlerResult::none();
    }
    let mut done = 0;
    for _ in 0..count {
        let ok = if undo {
            state.undo.undo(&mut state.buffer, &mut state.cursor)
        } else {
            state.undo.redo(&mut state.buffer, &mut state.cursor)
        };
        if !ok {
            break;
        }
        done += 1;
    }
    debug!(target: "actions.dispatch", undo, requested = count, done, "undo_redo");
    match (done, undo) {
        (0, true) => HandlerResult::message("Already at oldest change"),
        (0, false) => HandlerResult::message("Already at newest change"),
        _ => HandlerResult::none(),
    }
}

/// `i a I A o O`. The undo group for the session is opened here for `o`/`O`
/// so the new line and the typed text undo together; the editor opens it
/// for the others on entering Insert.
fn start_insert(at: InsertAt, state: &mut EditorState) -> HandlerResult {
    if !state.check_writable() {
        return HandlerResult::none();
    }
    let row = state.cursor.row;
    let len = state.buffer.line_len(row);
    match at {
        InsertAt::Cursor => {}
        InsertAt::AfterCursor => state.cursor.col = (state.cursor.col + 1).min(len),
        InsertAt::FirstNonBlank => {
            state.cursor = first_non_blank(&state.buffer, Position::new(row, 0))
                .unwrap_or(Position::new(row, 0));
        }
        InsertAt::LineEnd => state.cursor.col = len,
        InsertAt::LineBelow | InsertAt::LineAbove => {
            let indent: String = state
                .buffer
                .line(row)
                .unwrap_or_default()
                .chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect();
            let target = if at == InsertAt::LineBelow { row + 1 } else { row };
            let lines = vec![indent];
            state.undo.begin_group();
            state.buffer.insert_lines(target, &lines);
            let col = lines[0].chars().count();
            state.undo.record(UndoAction::InsertLines { row: target, lines });
            state.cursor = Position::new(target, col);
        }
    }
    HandlerResult::to(Mode::Insert)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::LineBuffer;

    fn state(lines: &[&str]) -> EditorState {
        EditorState::new(LineBuffer::from_lines(
            "t",
            lines.iter().map(|s| s.to_string()).collect(),
        ))
    }

    fn act(h: &mut NormalHandler, st: &mut EditorState, a: Action) -> HandlerResult {
        h.handle(Input::Action(a), st)
    }

    #[test]
    fn zero_is_line_start_without_count() {
        let mut st = state(&["abcdef"]);
        st.cursor.col = 4;
        let mut h = NormalHandler::default();
        act(&mut h, &mut st, Action::Count(0));
        assert_eq!(st.cursor.col, 0);
        act(&mut h, &mut st, Action::Count(1));
        act(&mut h, &mut st, Action::Count(0));
        assert_eq!(h.pending().count(), 10);
    }

    #[test]
    fn cw_on_word_keeps_following_space() {
        let mut st = state(&["foo bar"]);
        let mut h = NormalHandler::default();
        act(&mut h, &mut st, Action::Operator(OperatorKind::Change));
        let r = act(&mut h, &mut st, Action::Motion(MotionKind::WordForward));
        assert_eq!(st.buffer.line(0), Some(" bar"));
        assert_eq!(
            r.request,
            Some(ModeRequest::Transition {
                to: Mode::Insert,
                clear_selection: true
            })
        );
        assert!(st.undo.is_group_open());
    }

    #[test]
    fn mismatched_operators_cancel() {
        let mut st = state(&["abc"]);
        let mut h = NormalHandler::default();
        act(&mut h, &mut st, Action::Operator(OperatorKind::Delete));
        act(&mut h, &mut st, Action::Operator(OperatorKind::Yank));
        assert!(h.pending().is_empty());
        assert_eq!(st.buffer.line(0), Some("abc"));
    }

    #[test]
    fn open_line_below_copies_indent() {
        let mut st = state(&["    foo"]);
        let mut h = NormalHandler::default();
        let r = act(&mut h, &mut st, Action::Insert(InsertAt::LineBelow));
        assert_eq!(r, HandlerResult::to(Mode::Insert));
        assert_eq!(st.buffer.line(1), Some("    "));
        assert_eq!(st.cursor, Position::new(1, 4));
    }

    #[test]
    fn undo_at_oldest_reports() {
        let mut st = state(&["abc"]);
        let mut h = NormalHandler::default();
        let r = act(&mut h, &mut st, Action::Undo);
        assert_eq!(r.message.as_deref(), Some("Already at oldest change"));
    }

    #[test]
    fn find_char_consumes_next_key() {
        let mut st = state(&["a,b,c"]);
        let mut h = NormalHandler::default();
        act(
            &mut h,
            &mut st,
            Action::CharSearch {
                kind: core_state::CharSearchKind::Find,
                forward: true,
            },
        );
        assert!(h.pending().is_awaiting());
        h.handle(Input::Key(core_events::KeyToken::char(',')), &mut st);
        assert_eq!(st.cursor.col, 1);
        act(&mut h, &mut st, Action::RepeatCharSearch { reverse: false });
        assert_eq!(st.cursor.col, 3);
    }
}
