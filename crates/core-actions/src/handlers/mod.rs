//! Mode handlers.
//!
//! Each handler turns one resolved input into edits on `EditorState` plus a
//! `HandlerResult`. Handlers never switch modes themselves: they describe the
//! switch in `HandlerResult::request` and the `Editor` applies it.

use core_events::KeyToken;
use core_state::{EditorState, Mode};

use crate::Action;

mod command;
mod insert;
mod normal;
mod pending;
mod search;
mod visual;

pub use command::CommandHandler;
pub use insert::InsertHandler;
pub use normal::NormalHandler;
pub use pending::PendingContext;
pub use search::SearchHandler;
pub use visual::VisualHandler;

/// What reaches a handler after key resolution.
#[derive(Debug, Clone)]
pub enum Input {
    /// A keymap binding fired.
    Action(Action),
    /// A key no binding claimed (typed text, or the argument of `f`/`"`).
    Key(KeyToken),
}

/// Mode change requested by a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    Transition { to: Mode, clear_selection: bool },
    /// Enter Visual / VisualLine with a selection anchored at the cursor.
    StartVisual { line_mode: bool },
    /// Flip between Visual and VisualLine keeping the selection.
    ToggleLineMode,
    /// Visual `o`: move the cursor to the anchor and re-anchor at the old cursor.
    SwapAnchor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerResult {
    pub request: Option<ModeRequest>,
    pub message: Option<String>,
    pub quit: bool,
    /// Ex command line to run once the request has been applied.
    pub ex: Option<String>,
}

impl HandlerResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn to(mode: Mode) -> Self {
        Self::request(ModeRequest::Transition {
            to: mode,
            clear_selection: false,
        })
    }

    /// Back to Normal, dropping any selection.
    pub fn exit() -> Self {
        Self::request(ModeRequest::Transition {
            to: Mode::Normal,
            clear_selection: true,
        })
    }

    pub fn request(request: ModeRequest) -> Self {
        Self {
            request: Some(request),
            ..Self::default()
        }
    }

    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            message: Some(msg.into()),
            ..Self::default()
        }
    }

    pub fn quit() -> Self {
        Self {
            quit: true,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }
}

/// The handler for the active mode. Visual and VisualLine share one.
#[derive(Debug)]
pub enum ActiveHandler {
    Normal(NormalHandler),
    Insert(InsertHandler),
    Visual(VisualHandler),
    Command(CommandHandler),
    Search(SearchHandler),
}

impl ActiveHandler {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Normal => Self::Normal(NormalHandler::default()),
            Mode::Insert => Self::Insert(InsertHandler),
            Mode::Visual | Mode::VisualLine => Self::Visual(VisualHandler::default()),
            Mode::Command => Self::Command(CommandHandler),
            Mode::Search => Self::Search(SearchHandler),
        }
    }

    pub fn handle(&mut self, input: Input, state: &mut EditorState) -> HandlerResult {
        match self {
            Self::Normal(h) => h.handle(input, state),
            Self::Insert(h) => h.handle(input, state),
            Self::Visual(h) => h.handle(input, state),
            Self::Command(h) => h.handle(input, state),
            Self::Search(h) => h.handle(input, state),
        }
    }

    /// True when the next key is an argument (`f` target, register name) and
    /// must bypass the keymaps.
    pub fn wants_raw_key(&self) -> bool {
        match self {
            Self::Normal(h) => h.pending().is_awaiting(),
            Self::Visual(h) => h.pending().is_awaiting(),
            _ => false,
        }
    }

    /// Count / operator / register typed so far, for the status line.
    pub fn pending_display(&self) -> String {
        match self {
            Self::Normal(h) => h.pending().to_string(),
            Self::Visual(h) => h.pending().to_string(),
            _ => String::new(),
        }
    }
}
