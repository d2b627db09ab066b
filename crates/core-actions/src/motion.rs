//! Motion kinds and their count-aware resolution over the pure motion
//! functions in `core_text::motion`.

use core_text::motion as m;
use core_text::{LineBuffer, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    Left,
    Right,
    Up,
    Down,
    WordForward,
    WordBackward,
    WordEnd,
    LineStart,
    FirstNonBlank,
    LineEnd,
    FileStart,
    FileEnd,
    FindChar { ch: char, forward: bool },
    TillChar { ch: char, forward: bool },
}

impl MotionKind {
    /// Operators over these cover whole lines.
    pub fn is_linewise(self) -> bool {
        matches!(
            self,
            MotionKind::Up | MotionKind::Down | MotionKind::FileStart | MotionKind::FileEnd
        )
    }

    /// Operators over these include the character under the destination.
    pub fn is_inclusive(self) -> bool {
        match self {
            MotionKind::WordEnd | MotionKind::LineEnd => true,
            MotionKind::FindChar { forward, .. } | MotionKind::TillChar { forward, .. } => forward,
            _ => false,
        }
    }
}

/// Destination of `kind` from `from`. Repeatable motions step `count` times
/// and stop early at a boundary; `None` means not even one step applied.
/// `explicit` tells whether the user typed the count (`5G` vs `G`).
pub fn resolve(
    buf: &LineBuffer,
    from: Position,
    kind: MotionKind,
    count: u32,
    explicit: bool,
) -> Option<Position> {
    let count = count.max(1) as usize;
    let step: fn(&LineBuffer, Position) -> Option<Position> = match kind {
        MotionKind::Left => m::left,
        MotionKind::Right => m::right,
        MotionKind::Up => m::up,
        MotionKind::Down => m::down,
        MotionKind::WordForward => m::word_forward,
        MotionKind::WordBackward => m::word_backward,
        MotionKind::WordEnd => m::word_end,
        MotionKind::LineStart => return m::line_start(buf, from),
        MotionKind::FirstNonBlank => return m::first_non_blank(buf, from),
        MotionKind::LineEnd => {
            let row = (from.row + count - 1).min(buf.last_row());
            return m::line_end(buf, Position::new(row, 0));
        }
        MotionKind::FileStart | MotionKind::FileEnd if explicit => {
            let row = (count - 1).min(buf.last_row());
            return Some(Position::new(row, 0));
        }
        MotionKind::FileStart => return m::file_start(buf, from),
        MotionKind::FileEnd => return m::file_end(buf, from),
        MotionKind::FindChar { ch, forward: true } => {
            return m::find_char_forward(buf, from, ch, count);
        }
        MotionKind::FindChar { ch, forward: false } => {
            return m::find_char_backward(buf, from, ch, count);
        }
        MotionKind::TillChar { ch, forward: true } => {
            return m::till_char_forward(buf, from, ch, count);
        }
        MotionKind::TillChar { ch, forward: false } => {
            return m::till_char_backward(buf, from, ch, count);
        }
    };
    let mut pos = from;
    let mut moved = false;
    for _ in 0..count {
        match step(buf, pos) {
            Some(next) => {
                pos = next;
                moved = true;
            }
            None => break,
        }
    }
    moved.then_some(pos)
}
