//! Pure cursor motions.
//!
//! Every function takes the buffer and a starting position and returns the
//! destination, or `None` when the motion cannot apply (already at a boundary,
//! target character absent). Nothing here mutates state, so the same
//! functions serve cursor movement, operator ranges and visual selections.
//!
//! Columns are code point columns. Word classification uses three classes
//! (blank, word constituent, punctuation) so `foo.bar` holds three words.

use crate::{LineBuffer, Position};

/// Character class used by word motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Blank,
    Word,
    Punct,
}

pub fn classify(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Blank
    } else if c == '_' || c.is_alphanumeric() {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

fn chars(buf: &LineBuffer, row: usize) -> Vec<char> {
    buf.line(row).map(|l| l.chars().collect()).unwrap_or_default()
}

/// Column of the last character on `row` (0 for an empty line).
pub fn last_col(buf: &LineBuffer, row: usize) -> usize {
    buf.line_len(row).saturating_sub(1)
}

pub fn left(_buf: &LineBuffer, pos: Position) -> Option<Position> {
    (pos.col > 0).then(|| Position::new(pos.row, pos.col - 1))
}

/// One character right, never past the last character of the line.
pub fn right(buf: &LineBuffer, pos: Position) -> Option<Position> {
    (pos.col + 1 < buf.line_len(pos.row)).then(|| Position::new(pos.row, pos.col + 1))
}

pub fn up(buf: &LineBuffer, pos: Position) -> Option<Position> {
    if pos.row == 0 {
        return None;
    }
    let row = pos.row - 1;
    Some(Position::new(row, pos.col.min(last_col(buf, row))))
}

pub fn down(buf: &LineBuffer, pos: Position) -> Option<Position> {
    if pos.row + 1 >= buf.line_count() {
        return None;
    }
    let row = pos.row + 1;
    Some(Position::new(row, pos.col.min(last_col(buf, row))))
}

pub fn line_start(_buf: &LineBuffer, pos: Position) -> Option<Position> {
    Some(Position::new(pos.row, 0))
}

/// First non-whitespace column, or 0 when the line is blank.
pub fn first_non_blank(buf: &LineBuffer, pos: Position) -> Option<Position> {
    let col = buf
        .line(pos.row)
        .and_then(|l| l.chars().position(|c| !c.is_whitespace()))
        .unwrap_or(0);
    Some(Position::new(pos.row, col))
}

/// Column of the last character (0 for an empty line).
pub fn line_end(buf: &LineBuffer, pos: Position) -> Option<Position> {
    Some(Position::new(pos.row, last_col(buf, pos.row)))
}

pub fn file_start(_buf: &LineBuffer, _pos: Position) -> Option<Position> {
    Some(Position::origin())
}

pub fn file_end(buf: &LineBuffer, _pos: Position) -> Option<Position> {
    Some(Position::new(buf.last_row(), 0))
}

/// Start of the next word. Crossing a line end lands on the first word of a
/// following line (an empty line counts as a word). On the last line with no
/// further word the destination is the end of that line.
pub fn word_forward(buf: &LineBuffer, pos: Position) -> Option<Position> {
    let mut row = pos.row;
    let line = chars(buf, row);
    let mut col = pos.col;
    if col < line.len() {
        let cls = classify(line[col]);
        if cls != CharClass::Blank {
            while col < line.len() && classify(line[col]) == cls {
                col += 1;
            }
        }
        while col < line.len() && classify(line[col]) == CharClass::Blank {
            col += 1;
        }
        if col < line.len() {
            return Some(Position::new(row, col));
        }
    }
    loop {
        if row + 1 >= buf.line_count() {
            let end = Position::new(row, buf.line_len(row));
            return (end > pos).then_some(end);
        }
        row += 1;
        let next = chars(buf, row);
        if next.is_empty() {
            return Some(Position::new(row, 0));
        }
        if let Some(c) = next.iter().position(|c| classify(*c) != CharClass::Blank) {
            return Some(Position::new(row, c));
        }
    }
}

/// Start of the previous word, crossing to the end of earlier lines as needed.
pub fn word_backward(buf: &LineBuffer, pos: Position) -> Option<Position> {
    let mut row = pos.row;
    let mut line = chars(buf, row);
    let mut col = pos.col.min(line.len());
    loop {
        if col == 0 {
            if row == 0 {
                return (pos != Position::origin()).then_some(Position::origin());
            }
            row -= 1;
            line = chars(buf, row);
            col = line.len();
            if line.is_empty() {
                return Some(Position::new(row, 0));
            }
            continue;
        }
        if classify(line[col - 1]) == CharClass::Blank {
            col -= 1;
            continue;
        }
        break;
    }
    let cls = classify(line[col - 1]);
    while col > 0 && classify(line[col - 1]) == cls {
        col -= 1;
    }
    Some(Position::new(row, col))
}

/// Last character of the current or next word.
pub fn word_end(buf: &LineBuffer, pos: Position) -> Option<Position> {
    let mut row = pos.row;
    let mut line = chars(buf, row);
    let mut col = pos.col + 1;
    loop {
        if col >= line.len() {
            if row + 1 >= buf.line_count() {
                return None;
            }
            row += 1;
            line = chars(buf, row);
            col = 0;
            continue;
        }
        if classify(line[col]) == CharClass::Blank {
            col += 1;
            continue;
        }
        break;
    }
    let cls = classify(line[col]);
    while col + 1 < line.len() && classify(line[col + 1]) == cls {
        col += 1;
    }
    Some(Position::new(row, col))
}

/// `count`-th occurrence of `target` right of the cursor on the current line.
pub fn find_char_forward(
    buf: &LineBuffer,
    pos: Position,
    target: char,
    count: usize,
) -> Option<Position> {
    let line = chars(buf, pos.row);
    let mut from = pos.col + 1;
    let mut found = None;
    for _ in 0..count.max(1) {
        let idx = (from..line.len()).find(|i| line[*i] == target)?;
        found = Some(idx);
        from = idx + 1;
    }
    found.map(|col| Position::new(pos.row, col))
}

/// `count`-th occurrence of `target` left of the cursor on the current line.
pub fn find_char_backward(
    buf: &LineBuffer,
    pos: Position,
    target: char,
    count: usize,
) -> Option<Position> {
    let line = chars(buf, pos.row);
    let mut until = pos.col.min(line.len());
    let mut found = None;
    for _ in 0..count.max(1) {
        let idx = (0..until).rev().find(|i| line[*i] == target)?;
        found = Some(idx);
        until = idx;
    }
    found.map(|col| Position::new(pos.row, col))
}

/// Like [`find_char_forward`] but stops one column before the match.
pub fn till_char_forward(
    buf: &LineBuffer,
    pos: Position,
    target: char,
    count: usize,
) -> Option<Position> {
    find_char_forward(buf, pos, target, count).map(|p| Position::new(p.row, p.col - 1))
}

/// Like [`find_char_backward`] but stops one column after the match.
pub fn till_char_backward(
    buf: &LineBuffer,
    pos: Position,
    target: char,
    count: usize,
) -> Option<Position> {
    find_char_backward(buf, pos, target, count).map(|p| Position::new(p.row, p.col + 1))
}
