//! Display width classification for code points.
//!
//! Columns everywhere in the engine are logical (code point) columns. Display
//! width only matters at the rendering boundary, where each code point is
//! classified on its own:
//!
//! * control characters: 0 cells
//! * East Asian wide / fullwidth forms: 2 cells
//! * everything else: 1 cell
//!
//! Tabs are treated as control characters here; tab expansion is a rendering
//! concern layered on top.

use unicode_width::UnicodeWidthChar;

/// Width in terminal cells of a single code point.
pub fn char_width(c: char) -> usize {
    if c.is_control() {
        return 0;
    }
    match c.width() {
        Some(w) if w >= 2 => 2,
        Some(0) => 0,
        _ => 1,
    }
}

/// Total display width of `s`.
pub fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Display column at which code point column `col` of `line` starts.
pub fn display_col(line: &str, col: usize) -> usize {
    line.chars().take(col).map(char_width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_narrow() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(display_width("hello"), 5);
    }

    #[test]
    fn cjk_is_wide() {
        assert_eq!(char_width('漢'), 2);
        assert_eq!(char_width('Ａ'), 2); // fullwidth A
        assert_eq!(display_width("漢字"), 4);
    }

    #[test]
    fn control_is_zero() {
        assert_eq!(char_width('\u{7}'), 0);
        assert_eq!(char_width('\t'), 0);
    }

    #[test]
    fn display_col_counts_prefix() {
        let line = "a漢b";
        assert_eq!(display_col(line, 0), 0);
        assert_eq!(display_col(line, 1), 1);
        assert_eq!(display_col(line, 2), 3);
        assert_eq!(display_col(line, 10), 4);
    }
}
