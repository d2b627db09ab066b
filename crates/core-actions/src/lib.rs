//! core-actions: the modal editing engine proper.
//!
//! Keys flow `Editor::feed` -> `Resolver` (core-keymap) -> active mode handler
//! -> motions / operators over `EditorState` -> `HandlerResult` applied by the
//! editor. Module map:
//! * `motion`   - `MotionKind` and count-aware destination resolution
//! * `operator` - delete / change / yank / paste / join over computed ranges
//! * `handlers` - one handler per mode plus the pending count/operator grammar
//! * `commands` - ex command parsing and execution
//! * `search`   - regex search with wrap-around
//! * `bindings` - built-in keymaps
//! * `editor`   - the mode manager tying it together
//! * `io`       - buffer load/save collaborator
//! * `plugin`   - binding registration surface for plugins

use std::fmt;
use std::sync::Arc;

use core_state::{CharSearchKind, EditorState};

pub mod bindings;
pub mod commands;
pub mod editor;
pub mod handlers;
pub mod io;
pub mod motion;
pub mod operator;
pub mod plugin;
pub mod search;

pub use commands::{CommandParser, ParsedCommand};
pub use editor::{Editor, EditorError, RenderSnapshot};
pub use handlers::{HandlerResult, Input, ModeRequest};
pub use io::{BufferIo, FsBufferIo, NormalizedText, normalize_line_endings};
pub use motion::MotionKind;
pub use operator::{OpRange, OperatorKind};
pub use plugin::{BindingRegistry, Plugin, PluginFn};

/// Where `i a I A o O` start inserting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    Cursor,
    AfterCursor,
    FirstNonBlank,
    LineEnd,
    LineBelow,
    LineAbove,
}

/// Handler callable from a keymap binding.
#[derive(Clone)]
pub struct PluginHandler {
    pub name: String,
    pub f: Arc<PluginFn>,
}

impl PluginHandler {
    pub fn call(&self, state: &mut EditorState) -> HandlerResult {
        (self.f)(state)
    }
}

impl fmt::Debug for PluginHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PluginHandler").field(&self.name).finish()
    }
}

/// Payload bound to a key sequence.
#[derive(Debug, Clone)]
pub enum Action {
    Motion(MotionKind),
    /// `f F t T`: the next key is the target character.
    CharSearch { kind: CharSearchKind, forward: bool },
    /// `;` (same direction) and `,` (reverse).
    RepeatCharSearch { reverse: bool },
    /// Count digit. `0` with no count pending is the line-start motion.
    Count(u8),
    /// `"`: the next key names a register.
    RegisterPrefix,
    Operator(OperatorKind),
    DeleteChar,
    DeleteCharBefore,
    DeleteToLineEnd,
    ChangeToLineEnd,
    SubstituteChar,
    YankLine,
    Paste { before: bool },
    Undo,
    Redo,
    Insert(InsertAt),
    Visual { line_mode: bool },
    SwapAnchor,
    CommandLine,
    Search { forward: bool },
    SearchNext { reverse: bool },
    JoinLines,
    Escape,
    Backspace,
    DeleteForward,
    Enter,
    Tab,
    /// Ex command line, as bound from `[[map]]` config entries.
    Ex(String),
    Plugin(PluginHandler),
}
