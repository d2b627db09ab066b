//! Interactive host: raw-mode terminal, key polling and a plain redraw of the
//! visible lines plus a status line after every change.

use std::io::{self, Write, stdout};
use std::time::Duration;

use anyhow::Result;
use core_actions::{Editor, RenderSnapshot};
use core_input::{TerminalInput, read_input};
use core_text::char_width;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::style::Print;
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode, size,
};
use crossterm::{execute, queue};
use tracing::{debug, info};

/// How long to wait for a key before checking the key-sequence timeout and
/// background jobs.
const IDLE: Duration = Duration::from_millis(50);
const TAB_STOP: usize = 8;

/// Raw mode and the alternate screen for as long as it lives.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, EnableBracketedPaste, Hide)?;
        debug!(target: "runtime", "terminal_entered");
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen, Show);
        let _ = disable_raw_mode();
    }
}

/// Visible window over the buffer; the last row is the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct View {
    top: usize,
    cols: u16,
    rows: u16,
}

impl View {
    fn new((cols, rows): (u16, u16)) -> Self {
        Self { top: 0, cols, rows }
    }

    fn text_rows(&self) -> usize {
        usize::from(self.rows.saturating_sub(1)).max(1)
    }

    /// Scroll just enough to keep `row` visible.
    fn follow(&mut self, row: usize) {
        let height = self.text_rows();
        if row < self.top {
            self.top = row;
        } else if row >= self.top + height {
            self.top = row + 1 - height;
        }
    }
}

pub(crate) fn run(editor: &mut Editor) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut view = View::new(size()?);
    let mut out = stdout();
    draw(&mut out, &editor.snapshot(), &mut view)?;
    while !editor.should_quit() {
        let dirty = match read_input(IDLE)? {
            TerminalInput::Keys(keys) => {
                for key in keys {
                    editor.feed(key);
                }
                true
            }
            TerminalInput::Resize { cols, rows } => {
                view.cols = cols;
                view.rows = rows;
                true
            }
            TerminalInput::Idle => {
                let fired = editor.check_timeout();
                let finished = editor.poll_jobs() > 0;
                fired || finished
            }
        };
        if dirty {
            draw(&mut out, &editor.snapshot(), &mut view)?;
        }
    }
    info!(target: "runtime", "shutdown");
    Ok(())
}

fn draw(out: &mut impl Write, snap: &RenderSnapshot, view: &mut View) -> io::Result<()> {
    view.follow(snap.cursor.row);
    let width = usize::from(view.cols);
    queue!(out, Hide, MoveTo(0, 0), Clear(ClearType::All))?;
    for (y, line) in snap
        .lines
        .iter()
        .skip(view.top)
        .take(view.text_rows())
        .enumerate()
    {
        queue!(out, MoveTo(0, to_u16(y)), Print(expand(line, width)))?;
    }
    let status = snap.status_line().replace('\n', " ");
    queue!(
        out,
        MoveTo(0, view.rows.saturating_sub(1)),
        Print(expand(&status, width))
    )?;
    let line = snap
        .lines
        .get(snap.cursor.row)
        .map(String::as_str)
        .unwrap_or_default();
    let x = cursor_x(line, snap.cursor.col);
    let y = snap.cursor.row.saturating_sub(view.top);
    queue!(out, MoveTo(to_u16(x), to_u16(y)), Show)?;
    out.flush()
}

/// `line` with tabs expanded, cut to `width` cells.
fn expand(line: &str, width: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut used = 0;
    for c in line.chars() {
        if c == '\t' {
            let n = TAB_STOP - used % TAB_STOP;
            if used + n > width {
                break;
            }
            out.extend(std::iter::repeat_n(' ', n));
            used += n;
            continue;
        }
        let w = char_width(c);
        if used + w > width {
            break;
        }
        if w > 0 {
            out.push(c);
        }
        used += w;
    }
    out
}

/// Screen column of code point column `col`, with tabs expanded.
fn cursor_x(line: &str, col: usize) -> usize {
    line.chars().take(col).fold(0, |x, c| {
        if c == '\t' {
            x + TAB_STOP - x % TAB_STOP
        } else {
            x + char_width(c)
        }
    })
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}
