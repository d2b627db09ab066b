//! Pattern search over the buffer with wrap-around.

use core_text::{LineBuffer, Position};
use regex::Regex;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found { pos: Position, wrapped: bool },
    NotFound,
}

/// Next match of `pattern` strictly after (`forward`) or before `from`,
/// wrapping around the buffer ends.
pub fn find(
    buf: &LineBuffer,
    from: Position,
    pattern: &str,
    forward: bool,
) -> Result<SearchOutcome, regex::Error> {
    let re = Regex::new(pattern)?;
    let matches = all_matches(buf, &re);
    let hit = if forward {
        matches
            .iter()
            .find(|p| **p > from)
            .map(|p| (*p, false))
            .or_else(|| matches.first().map(|p| (*p, true)))
    } else {
        matches
            .iter()
            .rev()
            .find(|p| **p < from)
            .map(|p| (*p, false))
            .or_else(|| matches.last().map(|p| (*p, true)))
    };
    trace!(target: "actions.dispatch", pattern, forward, total = matches.len(), "search");
    Ok(match hit {
        Some((pos, wrapped)) => SearchOutcome::Found { pos, wrapped },
        None => SearchOutcome::NotFound,
    })
}

/// Start of every match, in buffer order, as code point columns.
fn all_matches(buf: &LineBuffer, re: &Regex) -> Vec<Position> {
    let mut out = Vec::new();
    for (row, line) in buf.lines().iter().enumerate() {
        for m in re.find_iter(line) {
            let col = line[..m.start()].chars().count();
            out.push(Position::new(row, col));
        }
    }
    out
}

/// Message Vim shows when a search wraps.
pub fn wrap_message(forward: bool) -> &'static str {
    if forward {
        "search hit BOTTOM, continuing at TOP"
    } else {
        "search hit TOP, continuing at BOTTOM"
    }
}
