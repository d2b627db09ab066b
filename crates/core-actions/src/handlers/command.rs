use core_state::EditorState;

use super::{HandlerResult, Input};
use crate::Action;

/// `:` prompt. `<CR>` hands the line to the editor for execution.
#[derive(Debug, Default)]
pub struct CommandHandler;

impl CommandHandler {
    pub fn handle(&mut self, input: Input, state: &mut EditorState) -> HandlerResult {
        match input {
            Input::Key(key) => {
                if let Some(ch) = key.as_char() {
                    state.command_line.push_char(ch);
                }
                HandlerResult::none()
            }
            Input::Action(Action::Backspace) => {
                if state.command_line.backspace() {
                    HandlerResult::none()
                } else {
                    state.command_line.clear();
                    HandlerResult::exit()
                }
            }
            Input::Action(Action::Escape) => {
                state.command_line.clear();
                HandlerResult::exit()
            }
            Input::Action(Action::Enter) => {
                let line = state.command_line.take();
                HandlerResult {
                    ex: Some(line),
                    ..HandlerResult::exit()
                }
            }
            Input::Action(_) => HandlerResult::none(),
        }
    }
}
