//! Core key and job event types shared by the keymap, the editing engine and
//! the host binary.
//!
//! * [`KeyToken`] is the canonical, resolved form of one keystroke. Raw input
//!   (terminal byte codes or structured events) is normalized into tokens by
//!   [`normalize`] before it reaches the key sequence resolver.
//! * [`jobs`] holds the asynchronous job collaborator. The engine never blocks
//!   on jobs; it polls for completions.

use std::fmt;

pub mod jobs;

pub use jobs::{CompletedJob, CompletionFn, JobFn, JobHandle, JobRunner, ThreadJobRunner};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ModMask: u8 {
        const CTRL = 1;
        const ALT = 2;
        const SHIFT = 4;
        const META = 8;
        const SUPER = 16;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Esc,
    Backspace,
    Tab,
    Space,
    F(u8),
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
}

impl NamedKey {
    /// Canonical notation name (without angle brackets).
    pub fn notation(self) -> String {
        match self {
            NamedKey::Enter => "CR".into(),
            NamedKey::Esc => "Esc".into(),
            NamedKey::Backspace => "BS".into(),
            NamedKey::Tab => "Tab".into(),
            NamedKey::Space => "Space".into(),
            NamedKey::F(n) => format!("F{n}"),
            NamedKey::Up => "Up".into(),
            NamedKey::Down => "Down".into(),
            NamedKey::Left => "Left".into(),
            NamedKey::Right => "Right".into(),
            NamedKey::Home => "Home".into(),
            NamedKey::End => "End".into(),
            NamedKey::PageUp => "PageUp".into(),
            NamedKey::PageDown => "PageDown".into(),
            NamedKey::Insert => "Insert".into(),
            NamedKey::Delete => "Del".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Named(NamedKey),
}

/// One resolved keystroke: a key code plus modifier mask.
///
/// Tokens produced by [`normalize`] are canonical: shifted printable keys are
/// folded into the character itself, `Ctrl` chords on letters use the
/// lowercase letter, and a plain space is `Char(' ')`. Two tokens compare
/// equal iff they denote the same keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyToken {
    pub code: KeyCode,
    pub mods: ModMask,
}

impl KeyToken {
    pub const fn char(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            mods: ModMask::empty(),
        }
    }

    pub const fn named(k: NamedKey) -> Self {
        Self {
            code: KeyCode::Named(k),
            mods: ModMask::empty(),
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c.to_ascii_lowercase()),
            mods: ModMask::CTRL,
        }
    }

    pub fn with_mods(code: KeyCode, mods: ModMask) -> Self {
        Self { code, mods }.canonical()
    }

    /// Printable character carried by this token, if it has no modifiers.
    pub fn as_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if self.mods.is_empty() => Some(c),
            _ => None,
        }
    }

    pub fn is_named(&self, k: NamedKey) -> bool {
        self.code == KeyCode::Named(k) && self.mods.is_empty()
    }

    fn canonical(mut self) -> Self {
        match self.code {
            KeyCode::Named(NamedKey::Space) => {
                self.code = KeyCode::Char(' ');
                self.canonical()
            }
            KeyCode::Char(c) => {
                if self.mods.contains(ModMask::SHIFT) && !c.is_ascii_alphabetic() {
                    self.mods.remove(ModMask::SHIFT);
                } else if self.mods.contains(ModMask::SHIFT) && c.is_ascii_alphabetic() {
                    self.mods.remove(ModMask::SHIFT);
                    if !self.mods.intersects(ModMask::CTRL) {
                        self.code = KeyCode::Char(c.to_ascii_uppercase());
                    }
                }
                if self.mods.contains(ModMask::CTRL)
                    && let KeyCode::Char(c) = self.code
                {
                    self.code = KeyCode::Char(c.to_ascii_lowercase());
                }
                self
            }
            KeyCode::Named(_) => self,
        }
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prefix = String::new();
        if self.mods.contains(ModMask::CTRL) {
            prefix.push_str("C-");
        }
        if self.mods.contains(ModMask::ALT) || self.mods.contains(ModMask::META) {
            prefix.push_str("M-");
        }
        if self.mods.contains(ModMask::SHIFT) {
            prefix.push_str("S-");
        }
        if self.mods.contains(ModMask::SUPER) {
            prefix.push_str("D-");
        }
        let base = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char('<') => "lt".to_string(),
            KeyCode::Char(c) if prefix.is_empty() => return write!(f, "{c}"),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Named(k) => k.notation(),
        };
        write!(f, "<{prefix}{base}>")
    }
}

/// Raw keystroke as delivered by an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKey {
    /// Terminal byte / code point (e.g. `0x1b` for Escape, `0x01` for Ctrl-A).
    Code(u32),
    /// Structured key event already decoded by a terminal backend.
    Event(KeyCode, ModMask),
}

/// Normalize a raw key into its canonical token. Returns `None` for values
/// that do not denote a keystroke (invalid code points, NUL, unmapped control
/// codes).
pub fn normalize(raw: RawKey) -> Option<KeyToken> {
    match raw {
        RawKey::Code(code) => normalize_code(code),
        RawKey::Event(code, mods) => Some(KeyToken::with_mods(code, mods)),
    }
}

fn normalize_code(code: u32) -> Option<KeyToken> {
    let token = match code {
        0x1b => KeyToken::named(NamedKey::Esc),
        0x0d | 0x0a => KeyToken::named(NamedKey::Enter),
        0x09 => KeyToken::named(NamedKey::Tab),
        0x08 | 0x7f => KeyToken::named(NamedKey::Backspace),
        0x01..=0x1a => {
            let letter = char::from_u32(u32::from(b'a') + code - 1)?;
            KeyToken::ctrl(letter)
        }
        0x00 | 0x1c..=0x1f => return None,
        _ => {
            let c = char::from_u32(code)?;
            if c.is_control() {
                return None;
            }
            KeyToken::char(c)
        }
    };
    Some(token)
}
