//! Visual and VisualLine. Motions move the cursor and the editor keeps the
//! selection's free end on it; operators act on the whole selection and
//! leave the mode.

use core_state::{CharSearch, EditorState, Mode, RegisterName, Selection};
use tracing::trace;

use super::normal::apply_operator;
use super::pending::{Awaiting, PendingContext, char_motion, move_cursor, repeat_search};
use super::search::search_and_move;
use super::{HandlerResult, Input, ModeRequest};
use crate::Action;
use crate::motion::MotionKind;
use crate::operator::{self, OpRange, OperatorKind};

#[derive(Debug, Default)]
pub struct VisualHandler {
    pending: PendingContext,
}

impl VisualHandler {
    pub fn pending(&self) -> &PendingContext {
        &self.pending
    }

    pub fn handle(&mut self, input: Input, state: &mut EditorState) -> HandlerResult {
        let Some(sel) = state.selection else {
            return HandlerResult::exit();
        };
        match input {
            Input::Key(key) => {
                let ch = key.as_char();
                match self.pending.take_awaiting() {
                    Some(Awaiting::Register) => self.pending.accept_register(ch),
                    Some(Awaiting::Char { kind, forward }) => match ch {
                        Some(ch) => {
                            let search = CharSearch { ch, kind, forward };
                            state.last_char_search = Some(search);
                            self.motion(char_motion(search), state);
                        }
                        None => self.pending.reset(),
                    },
                    None => self.pending.reset(),
                }
                HandlerResult::none()
            }
            Input::Action(action) => self.action(action, sel, state),
        }
    }

    fn motion(&mut self, kind: MotionKind, state: &mut EditorState) {
        let count = self.pending.count();
        let explicit = self.pending.explicit();
        self.pending.reset();
        move_cursor(state, kind, count, explicit);
    }

    fn action(&mut self, action: Action, sel: Selection, state: &mut EditorState) -> HandlerResult {
        let register = self.pending.register();
        let count = self.pending.count();
        match action {
            Action::Count(0) if !self.pending.has_count() => {
                self.motion(MotionKind::LineStart, state);
                return HandlerResult::none();
            }
            Action::Count(d) => {
                self.pending.push_digit(d);
                return HandlerResult::none();
            }
            Action::RegisterPrefix => {
                self.pending.await_key(Awaiting::Register);
                return HandlerResult::none();
            }
            Action::CharSearch { kind, forward } => {
                self.pending.await_key(Awaiting::Char { kind, forward });
                return HandlerResult::none();
            }
            Action::Motion(kind) => {
                self.motion(kind, state);
                return HandlerResult::none();
            }
            Action::RepeatCharSearch { reverse } => {
                if let Some(kind) = repeat_search(state, reverse) {
                    self.motion(kind, state);
                }
                self.pending.reset();
                return HandlerResult::none();
            }
            _ => {}
        }
        self.pending.reset();
        let mutates = matches!(
            action,
            Action::Operator(OperatorKind::Delete | OperatorKind::Change)
                | Action::DeleteChar
                | Action::SubstituteChar
                | Action::DeleteToLineEnd
                | Action::ChangeToLineEnd
                | Action::Paste { .. }
                | Action::JoinLines
        );
        // A refused edit keeps the mode and the selection.
        if mutates && !state.check_writable() {
            return HandlerResult::none();
        }
        let range = operator::range_for_selection(&state.buffer, &sel);
        let (first, last) = sel.rows();
        let lines = OpRange::lines(first, last);
        match action {
            Action::Operator(OperatorKind::Delete) | Action::DeleteChar => {
                finish(OperatorKind::Delete, range, register, state)
            }
            Action::Operator(OperatorKind::Yank) => finish(OperatorKind::Yank, range, register, state),
            Action::Operator(OperatorKind::Change) | Action::SubstituteChar => {
                finish(OperatorKind::Change, range, register, state)
            }
            Action::DeleteToLineEnd => finish(OperatorKind::Delete, lines, register, state),
            Action::ChangeToLineEnd => finish(OperatorKind::Change, lines, register, state),
            Action::YankLine => finish(OperatorKind::Yank, lines, register, state),
            Action::Paste { .. } => {
                operator::replace_range(state, range, register);
                HandlerResult::exit()
            }
            Action::JoinLines => {
                let n = u32::try_from(last - first + 1).unwrap_or(u32::MAX);
                operator::join_lines(state, first, n.max(2));
                HandlerResult::exit()
            }
            Action::Visual { line_mode } if line_mode == sel.line_mode => HandlerResult::exit(),
            Action::Visual { .. } => HandlerResult::request(ModeRequest::ToggleLineMode),
            Action::SwapAnchor => HandlerResult::request(ModeRequest::SwapAnchor),
            Action::CommandLine => {
                state.command_line.begin(':');
                HandlerResult::to(Mode::Command)
            }
            Action::SearchNext { reverse } => {
                let Some(last) = state.last_search.clone() else {
                    return HandlerResult::message("E35: No previous regular expression");
                };
                let mut result = HandlerResult::none();
                for _ in 0..count {
                    result = search_and_move(state, &last.pattern, last.forward ^ reverse);
                }
                result
            }
            Action::Escape => HandlerResult::exit(),
            other => {
                trace!(target: "actions.dispatch", action = ?other, "ignored_in_visual");
                HandlerResult::none()
            }
        }
    }
}

/// Apply `op` over the selection and leave Visual: Change goes on to Insert,
/// the rest return to Normal.
fn finish(
    op: OperatorKind,
    range: OpRange,
    register: Option<RegisterName>,
    state: &mut EditorState,
) -> HandlerResult {
    let result = apply_operator(op, Some(range), register, state);
    if result.request.is_some() {
        return result;
    }
    if op == OperatorKind::Yank {
        state.cursor = range.start;
        if range.linewise {
            state.cursor.col = 0;
        }
    }
    HandlerResult::exit()
}
