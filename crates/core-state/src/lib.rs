//! Editor state: buffer, cursor, mode, selection, registers and undo log.
//!
//! The buffer is owned here and nowhere else. Operators, the undo manager and
//! mode handlers receive `&mut EditorState` for the duration of one dispatch
//! and never hold on to it.
//!
//! Messages are single-slot: the latest handler message replaces the previous
//! one and the editor clears it when the next key arrives.

use std::fmt;
use std::path::PathBuf;

use core_text::{LineBuffer, Position};
use tracing::debug;

pub mod registers;
pub mod undo;

pub use registers::{
    Clipboard, ClipboardMirror, MemoryClipboard, RegisterContent, RegisterName, Registers,
};
pub use undo::{MAX_STACK_SIZE, UndoAction, UndoGroup, UndoManager};

/// Current editor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    /// Characterwise visual selection.
    Visual,
    /// Linewise visual selection.
    VisualLine,
    Command,
    Search,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Normal,
        Mode::Insert,
        Mode::Visual,
        Mode::VisualLine,
        Mode::Command,
        Mode::Search,
    ];

    pub fn is_visual(self) -> bool {
        matches!(self, Mode::Visual | Mode::VisualLine)
    }

    /// Status-line label.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Visual => "VISUAL",
            Mode::VisualLine => "VISUAL LINE",
            Mode::Command => "COMMAND",
            Mode::Search => "SEARCH",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Visual selection. `start` is the anchor set on entry and `end` follows
/// the cursor. Motions never move `start`; only `o` changes it, by trading
/// it with the cursor's end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
    pub line_mode: bool,
}

impl Selection {
    pub fn new(anchor: Position, line_mode: bool) -> Self {
        Self {
            start: anchor,
            end: anchor,
            line_mode,
        }
    }

    /// Endpoints ordered so the first is not after the second. In line mode
    /// the columns are zeroed; only the rows are meaningful.
    pub fn normalized_range(&self) -> (Position, Position) {
        let (mut a, mut b) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        if self.line_mode {
            a.col = 0;
            b.col = 0;
        }
        (a, b)
    }

    /// First and last row covered.
    pub fn rows(&self) -> (usize, usize) {
        let (a, b) = self.normalized_range();
        (a.row, b.row)
    }
}

/// Text typed after `:`, `/` or `?`.
#[derive(Debug, Default, Clone)]
pub struct CommandLineState {
    prompt: Option<char>,
    buf: String,
}

impl CommandLineState {
    pub fn is_active(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn prompt(&self) -> Option<char> {
        self.prompt
    }

    pub fn buffer(&self) -> &str {
        &self.buf
    }

    /// Begin a new line with the given prompt character, discarding any text.
    pub fn begin(&mut self, prompt: char) {
        self.prompt = Some(prompt);
        self.buf.clear();
    }

    pub fn clear(&mut self) {
        self.prompt = None;
        self.buf.clear();
    }

    pub fn push_char(&mut self, ch: char) {
        self.buf.push(ch);
    }

    /// Remove the last character. Returns false when the line was already
    /// empty, which callers treat as cancel.
    pub fn backspace(&mut self) -> bool {
        self.buf.pop().is_some()
    }

    /// Take the typed text and leave the line inactive.
    pub fn take(&mut self) -> String {
        self.prompt = None;
        std::mem::take(&mut self.buf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub pattern: String,
    pub forward: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharSearchKind {
    Find,
    Till,
}

/// Last `f`/`F`/`t`/`T`, repeated by `;` and `,`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharSearch {
    pub ch: char,
    pub kind: CharSearchKind,
    pub forward: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorOptions {
    pub tab_inserts_spaces: bool,
    pub shiftwidth: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            tab_inserts_spaces: false,
            shiftwidth: 4,
        }
    }
}

/// Top-level editor state container.
#[derive(Debug)]
pub struct EditorState {
    pub buffer: LineBuffer,
    pub cursor: Position,
    pub mode: Mode,
    pub selection: Option<Selection>,
    pub registers: Registers,
    pub undo: UndoManager,
    pub command_line: CommandLineState,
    pub last_search: Option<SearchState>,
    pub last_char_search: Option<CharSearch>,
    pub file_name: Option<PathBuf>,
    pub options: EditorOptions,
    message: Option<String>,
}

impl EditorState {
    pub fn new(buffer: LineBuffer) -> Self {
        Self {
            buffer,
            cursor: Position::origin(),
            mode: Mode::Normal,
            selection: None,
            registers: Registers::new(),
            undo: UndoManager::default(),
            command_line: CommandLineState::default(),
            last_search: None,
            last_char_search: None,
            file_name: None,
            options: EditorOptions::default(),
            message: None,
        }
    }

    pub fn set_message<S: Into<String>>(&mut self, msg: S) {
        let msg = msg.into();
        debug!(target: "actions.dispatch", message = %msg, "message");
        self.message = Some(msg);
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// Keep the cursor on a character: in Normal and Visual modes the column
    /// may not sit past the last character.
    pub fn clamp_cursor(&mut self) {
        let mut pos = self.buffer.clamp(self.cursor);
        if self.mode != Mode::Insert {
            let len = self.buffer.line_len(pos.row);
            pos.col = pos.col.min(len.saturating_sub(1));
        }
        self.cursor = pos;
    }

    /// Refuse a mutation on a readonly buffer, leaving a message. Returns
    /// true when the caller may proceed.
    pub fn check_writable(&mut self) -> bool {
        if self.buffer.is_readonly() {
            tracing::warn!(target: "actions.operator", "readonly_refused");
            self.set_message("E21: Cannot make changes, 'readonly' is set");
            return false;
        }
        true
    }
}
