use core_events::NamedKey;
use core_state::{EditorState, SearchState};
use tracing::warn;

use super::{HandlerResult, Input};
use crate::Action;
use crate::search::{self, SearchOutcome};

/// `/` and `?` prompt. Typed keys edit the pattern; `<CR>` searches.
#[derive(Debug, Default)]
pub struct SearchHandler;

impl SearchHandler {
    pub fn handle(&mut self, input: Input, state: &mut EditorState) -> HandlerResult {
        match input {
            Input::Key(key) => {
                if let Some(ch) = key.as_char() {
                    state.command_line.push_char(ch);
                } else if key.is_named(NamedKey::Tab) {
                    state.command_line.push_char('\t');
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
                let forward = state.command_line.prompt() != Some('?');
                let typed = state.command_line.take();
                // An empty pattern reuses the last one.
                let pattern = match (typed.is_empty(), &state.last_search) {
                    (true, Some(last)) => last.pattern.clone(),
                    (true, None) => {
                        return HandlerResult::exit()
                            .with_message("E35: No previous regular expression");
                    }
                    (false, _) => typed,
                };
                let mut result = search_and_move(state, &pattern, forward);
                result.request = HandlerResult::exit().request;
                result
            }
            Input::Action(_) => HandlerResult::none(),
        }
    }
}

/// Search for `pattern` from the cursor and move onto the match. Remembers
/// the pattern for `n`/`N` when it compiles.
pub(crate) fn search_and_move(state: &mut EditorState, pattern: &str, forward: bool) -> HandlerResult {
    match search::find(&state.buffer, state.cursor, pattern, forward) {
        Err(e) => {
            warn!(target: "actions.dispatch", pattern, error = %e, "invalid_search_pattern");
            HandlerResult::message(format!("E383: Invalid search string: {pattern}"))
        }
        Ok(outcome) => {
            state.last_search = Some(SearchState {
                pattern: pattern.to_string(),
                forward,
            });
            match outcome {
                SearchOutcome::Found { pos, wrapped } => {
                    state.cursor = pos;
                    if wrapped {
                        HandlerResult::message(search::wrap_message(forward))
                    } else {
                        HandlerResult::none()
                    }
                }
                SearchOutcome::NotFound => {
                    HandlerResult::message(format!("E486: Pattern not found: {pattern}"))
                }
            }
        }
    }
}
