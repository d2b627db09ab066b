//! Count / operator / register grammar shared by the Normal and Visual
//! handlers: `["x][count][op][count]motion`.

use std::fmt;

use core_state::{CharSearch, CharSearchKind, EditorState, RegisterName};
use core_text::Position;
use tracing::trace;

use crate::motion::{self, MotionKind};
use crate::operator::OperatorKind;

/// Counts saturate here, so `99999999dd` cannot overflow.
pub const MAX_COUNT: u32 = 999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Awaiting {
    Register,
    Char { kind: CharSearchKind, forward: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingContext {
    count: Option<u32>,
    operator: Option<OperatorKind>,
    op_count: Option<u32>,
    register: Option<RegisterName>,
    awaiting: Option<Awaiting>,
}

impl PendingContext {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting.is_some()
    }

    /// A count is being typed in the current position (before or after the
    /// operator).
    pub fn has_count(&self) -> bool {
        if self.operator.is_some() {
            self.op_count.is_some()
        } else {
            self.count.is_some()
        }
    }

    pub fn push_digit(&mut self, digit: u8) {
        let slot = if self.operator.is_some() {
            &mut self.op_count
        } else {
            &mut self.count
        };
        let next = slot
            .unwrap_or(0)
            .saturating_mul(10)
            .saturating_add(u32::from(digit));
        *slot = Some(next.min(MAX_COUNT));
    }

    /// Effective count: prefix times post-operator count, at least 1.
    pub fn count(&self) -> u32 {
        self.count
            .unwrap_or(1)
            .saturating_mul(self.op_count.unwrap_or(1))
            .clamp(1, MAX_COUNT)
    }

    /// Whether the user typed any count at all (`G` vs `5G`).
    pub fn explicit(&self) -> bool {
        self.count.is_some() || self.op_count.is_some()
    }

    pub fn operator(&self) -> Option<OperatorKind> {
        self.operator
    }

    pub fn set_operator(&mut self, op: OperatorKind) {
        self.operator = Some(op);
    }

    pub fn register(&self) -> Option<RegisterName> {
        self.register
    }

    pub(crate) fn await_key(&mut self, awaiting: Awaiting) {
        self.awaiting = Some(awaiting);
    }

    pub(crate) fn take_awaiting(&mut self) -> Option<Awaiting> {
        self.awaiting.take()
    }

    /// Consume the register-name argument. An invalid name cancels
    /// everything pending.
    pub(crate) fn accept_register(&mut self, ch: Option<char>) {
        match ch.and_then(RegisterName::from_char) {
            Some(name) => self.register = Some(name),
            None => {
                trace!(target: "actions.dispatch", ?ch, "invalid_register");
                self.reset();
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for PendingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(r) = self.register {
            write!(f, "{r}")?;
        }
        if self.awaiting == Some(Awaiting::Register) {
            f.write_str("\"")?;
        }
        if let Some(c) = self.count {
            write!(f, "{c}")?;
        }
        if let Some(op) = self.operator {
            f.write_str(match op {
                OperatorKind::Delete => "d",
                OperatorKind::Change => "c",
                OperatorKind::Yank => "y",
            })?;
        }
        if let Some(c) = self.op_count {
            write!(f, "{c}")?;
        }
        if let Some(Awaiting::Char { kind, forward }) = self.awaiting {
            f.write_str(match (kind, forward) {
                (CharSearchKind::Find, true) => "f",
                (CharSearchKind::Find, false) => "F",
                (CharSearchKind::Till, true) => "t",
                (CharSearchKind::Till, false) => "T",
            })?;
        }
        Ok(())
    }
}

pub(crate) fn char_motion(search: CharSearch) -> MotionKind {
    match search.kind {
        CharSearchKind::Find => MotionKind::FindChar {
            ch: search.ch,
            forward: search.forward,
        },
        CharSearchKind::Till => MotionKind::TillChar {
            ch: search.ch,
            forward: search.forward,
        },
    }
}

/// `;` / `,`: the last character search, optionally reversed.
pub(crate) fn repeat_search(state: &EditorState, reverse: bool) -> Option<MotionKind> {
    let mut last = state.last_char_search?;
    last.forward ^= reverse;
    Some(char_motion(last))
}

/// Move the cursor by `kind`. A till that would not move (target
/// right next to the cursor) searches again from one step further.
pub(crate) fn move_cursor(
    state: &mut EditorState,
    kind: MotionKind,
    count: u32,
    explicit: bool,
) -> bool {
    let from = state.cursor;
    let mut dest = motion::resolve(&state.buffer, from, kind, count, explicit);
    if dest == Some(from)
        && let MotionKind::TillChar { forward, .. } = kind
    {
        let nudged = if forward {
            Position::new(from.row, from.col + 1)
        } else {
            Position::new(from.row, from.col.saturating_sub(1))
        };
        dest = motion::resolve(&state.buffer, nudged, kind, count, explicit).filter(|d| *d != from);
    }
    match dest {
        Some(pos) => {
            trace!(target: "actions.dispatch", ?kind, ?pos, "motion");
            state.cursor = pos;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_multiply_across_operator() {
        let mut p = PendingContext::default();
        p.push_digit(2);
        p.set_operator(OperatorKind::Delete);
        p.push_digit(3);
        assert_eq!(p.count(), 6);
        assert!(p.explicit());
        assert_eq!(p.to_string(), "2d3");
    }

    #[test]
    fn counts_clamp() {
        let mut p = PendingContext::default();
        for _ in 0..10 {
            p.push_digit(9);
        }
        assert_eq!(p.count(), MAX_COUNT);
        p.set_operator(OperatorKind::Yank);
        p.push_digit(5);
        assert_eq!(p.count(), MAX_COUNT);
    }

    #[test]
    fn invalid_register_cancels() {
        let mut p = PendingContext::default();
        p.push_digit(3);
        p.await_key(Awaiting::Register);
        p.take_awaiting();
        p.accept_register(Some('!'));
        assert!(p.is_empty());
        p.accept_register(Some('a'));
        assert_eq!(
            p.register(),
            Some(RegisterName::Named {
                letter: 'a',
                append: false
            })
        );
    }
}
