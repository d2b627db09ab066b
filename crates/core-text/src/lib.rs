//! Line buffer: the mutable substrate every other engine component reads or
//! mutates.
//!
//! Addressing is `(row, col)`, both 0-based, where `col` counts Unicode code
//! points (not bytes, not display cells). A column may equal the line length,
//! which denotes the position after the last character.
//!
//! Invariant: a buffer always holds at least one line. Deleting every line
//! leaves a single empty line behind.
//!
//! Mutation primitives here are raw: they do not consult the `readonly` flag
//! and do not record undo history. Operators check permissions and the undo
//! manager records inverse actions around these calls.

pub mod motion;
pub mod width;

pub use width::{char_width, display_col, display_width};

/// A position inside a buffer expressed as (row, code point column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub const fn origin() -> Self {
        Self { row: 0, col: 0 }
    }

    /// Clamp into the buffer. `col` may end up equal to the line length.
    pub fn clamp_to<F>(&mut self, line_count: usize, mut line_len_fn: F)
    where
        F: FnMut(usize) -> usize,
    {
        if line_count == 0 {
            *self = Self::origin();
            return;
        }
        if self.row >= line_count {
            self.row = line_count - 1;
        }
        let max_len = line_len_fn(self.row);
        if self.col > max_len {
            self.col = max_len;
        }
    }
}

/// Ordered sequence of text lines plus buffer metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
    pub name: String,
    modified: bool,
    readonly: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new("[No Name]")
    }
}

impl LineBuffer {
    /// Empty buffer holding one empty line.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            lines: vec![String::new()],
            name: name.into(),
            modified: false,
            readonly: false,
        }
    }

    /// Build from owned lines. An empty vector yields one empty line.
    pub fn from_lines(name: impl Into<String>, lines: Vec<String>) -> Self {
        let lines = if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        };
        Self {
            lines,
            name: name.into(),
            modified: false,
            readonly: false,
        }
    }

    /// Split `content` on `\n`. A single trailing newline does not produce an
    /// extra empty line (`"a\nb\n"` has two lines).
    pub fn from_str(name: impl Into<String>, content: &str) -> Self {
        let body = content.strip_suffix('\n').unwrap_or(content);
        let lines = body.split('\n').map(str::to_string).collect();
        Self::from_lines(name, lines)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of code points on `row` (0 for rows past the end).
    pub fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |l| l.chars().count())
    }

    /// Character at `pos`, if any.
    pub fn char_at(&self, pos: Position) -> Option<char> {
        self.lines.get(pos.row)?.chars().nth(pos.col)
    }

    pub fn last_row(&self) -> usize {
        self.lines.len() - 1
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    /// Clamp `pos` to a valid location (column may equal line length).
    pub fn clamp(&self, mut pos: Position) -> Position {
        pos.clamp_to(self.line_count(), |r| self.line_len(r));
        pos
    }

    /// Insert `text` at `pos`; `\n` splits lines. Returns the position just
    /// after the inserted text.
    pub fn insert_text(&mut self, pos: Position, text: &str) -> Position {
        let pos = self.clamp(pos);
        let line = &mut self.lines[pos.row];
        let split_at = byte_index(line, pos.col);
        let tail = line.split_off(split_at);
        let mut segments = text.split('\n');
        // `split` always yields at least one segment.
        let first = segments.next().unwrap_or_default();
        line.push_str(first);
        let mut row = pos.row;
        let mut col = pos.col + first.chars().count();
        for seg in segments {
            row += 1;
            self.lines.insert(row, seg.to_string());
            col = seg.chars().count();
        }
        self.lines[row].push_str(&tail);
        self.modified = true;
        tracing::trace!(target: "text.buffer", row = pos.row, col = pos.col, len = text.len(), "insert_text");
        Position::new(row, col)
    }

    /// Text in the half-open range `[start, end)`; line breaks become `\n`.
    /// Endpoints are ordered and clamped first.
    pub fn text_range(&self, start: Position, end: Position) -> String {
        let (start, end) = self.ordered(start, end);
        if start.row == end.row {
            return slice_chars(&self.lines[start.row], start.col, end.col).to_string();
        }
        let mut out = String::new();
        let first = &self.lines[start.row];
        out.push_str(slice_chars(first, start.col, usize::MAX));
        for row in start.row + 1..end.row {
            out.push('\n');
            out.push_str(&self.lines[row]);
        }
        out.push('\n');
        out.push_str(slice_chars(&self.lines[end.row], 0, end.col));
        out
    }

    /// Remove the half-open range `[start, end)` and return the removed text.
    /// A range ending at column 0 of a later row consumes the line break(s)
    /// before it, joining lines.
    pub fn delete_range(&mut self, start: Position, end: Position) -> String {
        let (start, end) = self.ordered(start, end);
        if start == end {
            return String::new();
        }
        let removed = self.text_range(start, end);
        let tail = {
            let last = &self.lines[end.row];
            slice_chars(last, end.col, usize::MAX).to_string()
        };
        let head_line = &mut self.lines[start.row];
        head_line.truncate(byte_index(head_line, start.col));
        head_line.push_str(&tail);
        if end.row > start.row {
            self.lines.drain(start.row + 1..=end.row);
        }
        self.modified = true;
        tracing::trace!(target: "text.buffer", start_row = start.row, end_row = end.row, removed = removed.len(), "delete_range");
        removed
    }

    /// Insert whole lines so the first of them lands at `row` (which may equal
    /// `line_count()` to append).
    pub fn insert_lines(&mut self, row: usize, lines: &[String]) {
        let row = row.min(self.lines.len());
        self.lines.splice(row..row, lines.iter().cloned());
        self.modified = true;
        tracing::trace!(target: "text.buffer", row, count = lines.len(), "insert_lines");
    }

    /// Remove up to `count` lines starting at `row` and return them. When every
    /// line is removed a single empty line is left in their place.
    pub fn delete_lines(&mut self, row: usize, count: usize) -> Vec<String> {
        if row >= self.lines.len() || count == 0 {
            return Vec::new();
        }
        let end = row.saturating_add(count).min(self.lines.len());
        let removed: Vec<String> = self.lines.drain(row..end).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.modified = true;
        tracing::trace!(target: "text.buffer", row, count = removed.len(), "delete_lines");
        removed
    }

    /// Replace the entire content (used when reverting a delete that emptied
    /// the buffer).
    pub fn replace_all(&mut self, lines: Vec<String>) {
        self.lines = if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        };
        self.modified = true;
    }

    fn ordered(&self, a: Position, b: Position) -> (Position, Position) {
        let a = self.clamp(a);
        let b = self.clamp(b);
        if a <= b { (a, b) } else { (b, a) }
    }
}

/// Byte offset of code point column `col` in `s` (clamped to `s.len()`).
pub fn byte_index(s: &str, col: usize) -> usize {
    s.char_indices().nth(col).map_or(s.len(), |(b, _)| b)
}

/// Code point slice `[from, to)` of `s` (both clamped).
pub fn slice_chars(s: &str, from: usize, to: usize) -> &str {
    let start = byte_index(s, from);
    let end = byte_index(s, to).max(start);
    &s[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(lines: &[&str]) -> LineBuffer {
        LineBuffer::from_lines("t", lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn from_str_strips_single_trailing_newline() {
        let b = LineBuffer::from_str("t", "hello\nworld\n");
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line(1), Some("world"));
        assert!(!b.is_modified());
    }

    #[test]
    fn empty_buffer_has_one_line() {
        let b = LineBuffer::from_lines("t", Vec::new());
        assert_eq!(b.line_count(), 1);
        assert_eq!(b.line(0), Some(""));
    }

    #[test]
    fn insert_text_splits_lines() {
        let mut b = buf(&["abcd"]);
        let end = b.insert_text(Position::new(0, 2), "X\nY");
        assert_eq!(b.lines(), &["abX".to_string(), "Ycd".to_string()]);
        assert_eq!(end, Position::new(1, 1));
        assert!(b.is_modified());
    }

    #[test]
    fn insert_text_multibyte_columns() {
        let mut b = buf(&["漢字"]);
        b.insert_text(Position::new(0, 1), "x");
        assert_eq!(b.line(0), Some("漢x字"));
        assert_eq!(b.line_len(0), 3);
    }

    #[test]
    fn delete_range_joins_lines() {
        let mut b = buf(&["hello", "world"]);
        let removed = b.delete_range(Position::new(0, 3), Position::new(1, 2));
        assert_eq!(removed, "lo\nwo");
        assert_eq!(b.lines(), &["helrld".to_string()]);
    }

    #[test]
    fn delete_range_orders_endpoints() {
        let mut b = buf(&["hello world"]);
        let removed = b.delete_range(Position::new(0, 6), Position::new(0, 0));
        assert_eq!(removed, "hello ");
        assert_eq!(b.line(0), Some("world"));
    }

    #[test]
    fn delete_all_lines_leaves_empty_line() {
        let mut b = buf(&["a", "b"]);
        let removed = b.delete_lines(0, 5);
        assert_eq!(removed.len(), 2);
        assert_eq!(b.line_count(), 1);
        assert_eq!(b.line(0), Some(""));
    }

    #[test]
    fn insert_lines_appends_at_end() {
        let mut b = buf(&["a"]);
        b.insert_lines(1, &["b".to_string(), "c".to_string()]);
        assert_eq!(b.line_count(), 3);
        assert_eq!(b.line(2), Some("c"));
    }

    #[test]
    fn text_range_multi_line() {
        let b = buf(&["one", "two", "three"]);
        assert_eq!(
            b.text_range(Position::new(0, 1), Position::new(2, 2)),
            "ne\ntwo\nth"
        );
    }

    #[test]
    fn clamp_keeps_column_at_line_end() {
        let b = buf(&["abc", ""]);
        assert_eq!(b.clamp(Position::new(0, 10)), Position::new(0, 3));
        assert_eq!(b.clamp(Position::new(9, 2)), Position::new(1, 0));
    }
}
