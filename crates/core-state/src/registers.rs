//! Register store.
//!
//! Name partition:
//! - unnamed (`"` and the `""` alias): latest delete or yank
//! - yank (`"0`): latest yank without an explicit target
//! - delete history (`"1`..`"9`): newest first, shifted on each default
//!   delete, oldest beyond `"9` discarded
//! - named (`"a`..`"z`, uppercase appends)
//! - black hole (`"_`): always empty, writes discarded
//! - clipboard (`"+`, `"*`): the clipboard collaborator itself
//!
//! Yanks never touch delete history; deletes never touch `"0`.
//!
//! Linewise payloads always end in `\n`; the same trailing newline is the only
//! linewise signal exchanged with the clipboard.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace, warn};

/// OS clipboard collaborator. Implementations may fail; the register store
/// logs and falls back to register-only behaviour.
pub trait Clipboard {
    fn get(&mut self) -> anyhow::Result<String>;
    fn set(&mut self, text: &str) -> anyhow::Result<()>;
}

/// In-process clipboard, used headless and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: String,
}

impl Clipboard for MemoryClipboard {
    fn get(&mut self) -> anyhow::Result<String> {
        Ok(self.contents.clone())
    }

    fn set(&mut self, text: &str) -> anyhow::Result<()> {
        self.contents = text.to_string();
        Ok(())
    }
}

/// Which register writes mirror to the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipboardMirror {
    #[default]
    None,
    Unnamed,
    UnnamedNamed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterName {
    Unnamed,
    Yank,
    /// `"1`..`"9`.
    Numbered(u8),
    /// Lowercase letter; `append` is set for the uppercase spelling.
    Named { letter: char, append: bool },
    BlackHole,
    Clipboard,
}

impl RegisterName {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '"' => Self::Unnamed,
            '0' => Self::Yank,
            '1'..='9' => Self::Numbered(c as u8 - b'0'),
            'a'..='z' => Self::Named {
                letter: c,
                append: false,
            },
            'A'..='Z' => Self::Named {
                letter: c.to_ascii_lowercase(),
                append: true,
            },
            '_' => Self::BlackHole,
            '+' | '*' => Self::Clipboard,
            _ => return None,
        })
    }

    /// Parse a register name as typed after `"`. `""` is accepted as the
    /// unnamed alias; anything longer (such as `10`) is not a register.
    pub fn parse(s: &str) -> Option<Self> {
        if s == "\"\"" {
            return Some(Self::Unnamed);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match *self {
            Self::Unnamed => '"',
            Self::Yank => '0',
            Self::Numbered(n) => char::from(b'0' + n),
            Self::Named { letter, append } if append => letter.to_ascii_uppercase(),
            Self::Named { letter, .. } => letter,
            Self::BlackHole => '_',
            Self::Clipboard => '+',
        }
    }
}

impl fmt::Display for RegisterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}", self.as_char())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterContent {
    pub text: String,
    pub linewise: bool,
}

impl RegisterContent {
    pub fn charwise(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            linewise: false,
        }
    }

    /// Whole lines; stored joined with a trailing `\n`.
    pub fn lines(lines: &[String]) -> Self {
        let mut text = lines.join("\n");
        text.push('\n');
        Self {
            text,
            linewise: true,
        }
    }

    /// Content as received from the clipboard: a trailing newline marks it
    /// linewise.
    pub fn from_clipboard(text: String) -> Self {
        Self {
            linewise: text.ends_with('\n'),
            text,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split linewise content back into lines.
    pub fn to_lines(&self) -> Vec<String> {
        let body = self.text.strip_suffix('\n').unwrap_or(&self.text);
        body.split('\n').map(str::to_string).collect()
    }

    fn append(&mut self, other: &RegisterContent) {
        if self.is_empty() {
            *self = other.clone();
            return;
        }
        if self.linewise || other.linewise {
            if !self.text.ends_with('\n') {
                self.text.push('\n');
            }
            self.text.push_str(&other.text);
            if !self.text.ends_with('\n') {
                self.text.push('\n');
            }
            self.linewise = true;
        } else {
            self.text.push_str(&other.text);
        }
    }
}

pub const NUMBERED_REGISTERS: usize = 9;

pub struct Registers {
    unnamed: RegisterContent,
    yank: RegisterContent,
    numbered: VecDeque<RegisterContent>, // "1 at index 0
    named: [RegisterContent; 26],
    clipboard: Option<Box<dyn Clipboard>>,
    mirror: ClipboardMirror,
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registers")
            .field("unnamed", &self.unnamed)
            .field("yank", &self.yank)
            .field("numbered", &self.numbered)
            .field("mirror", &self.mirror)
            .field("clipboard", &self.clipboard.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub fn new() -> Self {
        Self {
            unnamed: RegisterContent::default(),
            yank: RegisterContent::default(),
            numbered: VecDeque::with_capacity(NUMBERED_REGISTERS),
            named: std::array::from_fn(|_| RegisterContent::default()),
            clipboard: None,
            mirror: ClipboardMirror::None,
        }
    }

    pub fn with_clipboard(clipboard: Box<dyn Clipboard>, mirror: ClipboardMirror) -> Self {
        let mut regs = Self::new();
        regs.set_clipboard(Some(clipboard), mirror);
        regs
    }

    pub fn set_clipboard(&mut self, clipboard: Option<Box<dyn Clipboard>>, mirror: ClipboardMirror) {
        self.clipboard = clipboard;
        self.mirror = mirror;
    }

    pub fn set_mirror(&mut self, mirror: ClipboardMirror) {
        self.mirror = mirror;
    }

    pub fn mirror(&self) -> ClipboardMirror {
        self.mirror
    }

    pub fn clipboard_mut(&mut self) -> Option<&mut (dyn Clipboard + 'static)> {
        self.clipboard.as_deref_mut()
    }

    /// Store text removed by delete or change.
    pub fn record_delete(&mut self, content: RegisterContent, target: Option<RegisterName>) {
        match target {
            Some(RegisterName::BlackHole) => {
                trace!(target: "state.registers", "black_hole_delete");
            }
            Some(RegisterName::Named { letter, append }) => {
                self.write_named(letter, append, &content);
            }
            Some(RegisterName::Clipboard) => {
                self.clipboard_set(&content.text);
                self.unnamed = content;
            }
            _ => {
                self.numbered.push_front(content.clone());
                self.numbered.truncate(NUMBERED_REGISTERS);
                debug!(target: "state.registers", len = content.text.len(), linewise = content.linewise, "delete_history_shift");
                self.set_unnamed(content);
            }
        }
    }

    /// Store yanked text.
    pub fn record_yank(&mut self, content: RegisterContent, target: Option<RegisterName>) {
        match target {
            Some(RegisterName::BlackHole) => {
                trace!(target: "state.registers", "black_hole_yank");
            }
            Some(RegisterName::Named { letter, append }) => {
                self.write_named(letter, append, &content);
            }
            Some(RegisterName::Clipboard) => {
                self.clipboard_set(&content.text);
                self.unnamed = content;
            }
            _ => {
                debug!(target: "state.registers", len = content.text.len(), linewise = content.linewise, "yank");
                self.yank = content.clone();
                self.set_unnamed(content);
            }
        }
    }

    fn write_named(&mut self, letter: char, append: bool, content: &RegisterContent) {
        let Some(idx) = named_index(letter) else {
            return;
        };
        if append {
            self.named[idx].append(content);
        } else {
            self.named[idx] = content.clone();
        }
        debug!(target: "state.registers", register = %letter, append, "named_write");
        let stored = self.named[idx].clone();
        if self.mirror == ClipboardMirror::UnnamedNamed {
            self.clipboard_set(&stored.text);
        }
        self.unnamed = stored;
    }

    fn set_unnamed(&mut self, content: RegisterContent) {
        if self.mirror != ClipboardMirror::None {
            self.clipboard_set(&content.text);
        }
        self.unnamed = content;
    }

    /// Read a register for paste. Reading the unnamed register consults the
    /// clipboard when mirroring is enabled and its content differs.
    pub fn read(&mut self, name: RegisterName) -> Option<RegisterContent> {
        let content = match name {
            RegisterName::Unnamed => {
                if self.mirror != ClipboardMirror::None
                    && let Some(text) = self.clipboard_get()
                    && !text.is_empty()
                    && text != self.unnamed.text
                {
                    trace!(target: "state.registers", "unnamed_from_clipboard");
                    self.unnamed = RegisterContent::from_clipboard(text);
                }
                self.unnamed.clone()
            }
            RegisterName::Clipboard => RegisterContent::from_clipboard(self.clipboard_get()?),
            other => self.peek(other)?,
        };
        (!content.is_empty()).then_some(content)
    }

    /// Stored content without consulting the clipboard.
    pub fn peek(&self, name: RegisterName) -> Option<RegisterContent> {
        let content = match name {
            RegisterName::Unnamed => self.unnamed.clone(),
            RegisterName::Yank => self.yank.clone(),
            RegisterName::Numbered(n) => self.numbered.get(usize::from(n).checked_sub(1)?)?.clone(),
            RegisterName::Named { letter, .. } => self.named[named_index(letter)?].clone(),
            RegisterName::BlackHole | RegisterName::Clipboard => return None,
        };
        (!content.is_empty()).then_some(content)
    }

    /// Non-empty registers in display order: `"`, `0`-`9`, `a`-`z`.
    pub fn list(&self) -> Vec<(RegisterName, RegisterContent)> {
        let mut names = vec![RegisterName::Unnamed, RegisterName::Yank];
        names.extend((1..=NUMBERED_REGISTERS as u8).map(RegisterName::Numbered));
        names.extend(('a'..='z').map(|letter| RegisterName::Named {
            letter,
            append: false,
        }));
        names
            .into_iter()
            .filter_map(|n| self.peek(n).map(|c| (n, c)))
            .collect()
    }

    fn clipboard_get(&mut self) -> Option<String> {
        let cb = self.clipboard.as_mut()?;
        match cb.get() {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(target: "state.registers", error = %e, "clipboard_get_failed");
                None
            }
        }
    }

    fn clipboard_set(&mut self, text: &str) {
        let Some(cb) = self.clipboard.as_mut() else {
            return;
        };
        if let Err(e) = cb.set(text) {
            warn!(target: "state.registers", error = %e, "clipboard_set_failed");
        }
    }
}

fn named_index(letter: char) -> Option<usize> {
    letter
        .is_ascii_lowercase()
        .then(|| (letter as u8 - b'a') as usize)
}
