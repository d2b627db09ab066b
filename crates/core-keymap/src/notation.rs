//! Human-readable key notation: `<Leader>gd`, `<C-x><C-s>`, `<Esc>`, `dd`.
//!
//! Parsing never fails on unknown `<...>` names: the `<` is taken literally
//! and parsing resumes right after it, so `<foo>` is the five keys
//! `<`, `f`, `o`, `o`, `>`. Only an empty notation is rejected.

use std::fmt;

use core_events::{KeyCode, KeyToken, ModMask, NamedKey};
use smallvec::SmallVec;

use crate::KeymapError;

/// One element of a registered key sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyTokenPattern {
    Key(KeyToken),
    /// Resolved against the configured leader key at match time.
    Leader,
}

impl KeyTokenPattern {
    pub(crate) fn matches(&self, key: &KeyToken, leader: &KeyToken) -> bool {
        match self {
            KeyTokenPattern::Key(k) => k == key,
            KeyTokenPattern::Leader => leader == key,
        }
    }
}

/// Ordered list of resolved key patterns. Equality is over the resolved
/// patterns, so `<CR>` and `<Enter>` spell the same sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeySequence(pub(crate) SmallVec<[KeyTokenPattern; 4]>);

impl KeySequence {
    pub fn parse(notation: &str) -> Result<Self, KeymapError> {
        parse_notation(notation)
    }

    pub fn patterns(&self) -> &[KeyTokenPattern] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.0 {
            match p {
                KeyTokenPattern::Key(k) => write!(f, "{k}")?,
                KeyTokenPattern::Leader => f.write_str("<Leader>")?,
            }
        }
        Ok(())
    }
}

/// Parse a notation string into a key sequence.
pub fn parse_notation(notation: &str) -> Result<KeySequence, KeymapError> {
    let mut out: SmallVec<[KeyTokenPattern; 4]> = SmallVec::new();
    let mut rest = notation;
    while let Some(c) = rest.chars().next() {
        if c == '<'
            && let Some(close) = rest.find('>')
            && let Some(pat) = parse_bracketed(&rest[1..close])
        {
            out.push(pat);
            rest = &rest[close + 1..];
            continue;
        }
        if c == '<' && rest.len() > 1 {
            tracing::trace!(target: "input.map", notation, "literal_angle_bracket");
        }
        out.push(KeyTokenPattern::Key(KeyToken::char(c)));
        rest = &rest[c.len_utf8()..];
    }
    if out.is_empty() {
        return Err(KeymapError::EmptyNotation);
    }
    Ok(KeySequence(out))
}

/// Parse a single key written either as a bare character or as one
/// bracketed token (used for the leader setting).
pub fn parse_key(notation: &str) -> Option<KeyToken> {
    let seq = parse_notation(notation).ok()?;
    match seq.patterns() {
        [KeyTokenPattern::Key(k)] => Some(*k),
        _ => None,
    }
}

fn parse_bracketed(inner: &str) -> Option<KeyTokenPattern> {
    if inner.is_empty() {
        return None;
    }
    if inner.eq_ignore_ascii_case("leader") {
        return Some(KeyTokenPattern::Leader);
    }
    let mut mods = ModMask::empty();
    let mut body = inner;
    // Modifier prefixes: C- M- A- S- D-, in any order. A trailing '-' is the
    // minus key itself (`<C-->`).
    while body.len() > 2 && body.as_bytes()[1] == b'-' {
        let m = match body.as_bytes()[0].to_ascii_uppercase() {
            b'C' => ModMask::CTRL,
            b'M' | b'A' => ModMask::ALT,
            b'S' => ModMask::SHIFT,
            b'D' => ModMask::SUPER,
            _ => return None,
        };
        mods |= m;
        body = &body[2..];
    }
    let code = named_code(body).or_else(|| {
        let mut chars = body.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !mods.is_empty() => Some(KeyCode::Char(c)),
            _ => None,
        }
    })?;
    Some(KeyTokenPattern::Key(KeyToken::with_mods(code, mods)))
}

fn named_code(name: &str) -> Option<KeyCode> {
    let lower = name.to_ascii_lowercase();
    let named = match lower.as_str() {
        "esc" | "escape" => NamedKey::Esc,
        "cr" | "enter" | "return" => NamedKey::Enter,
        "bs" | "backspace" => NamedKey::Backspace,
        "tab" => NamedKey::Tab,
        "space" => return Some(KeyCode::Char(' ')),
        "lt" => return Some(KeyCode::Char('<')),
        "gt" => return Some(KeyCode::Char('>')),
        "bar" => return Some(KeyCode::Char('|')),
        "bslash" => return Some(KeyCode::Char('\\')),
        "del" | "delete" => NamedKey::Delete,
        "insert" | "ins" => NamedKey::Insert,
        "up" => NamedKey::Up,
        "down" => NamedKey::Down,
        "left" => NamedKey::Left,
        "right" => NamedKey::Right,
        "home" => NamedKey::Home,
        "end" => NamedKey::End,
        "pageup" => NamedKey::PageUp,
        "pagedown" => NamedKey::PageDown,
        f if f.len() > 1 && f.starts_with('f') => {
            let n: u8 = f[1..].parse().ok()?;
            if !(1..=24).contains(&n) {
                return None;
            }
            NamedKey::F(n)
        }
        _ => return None,
    };
    Some(KeyCode::Named(named))
}
