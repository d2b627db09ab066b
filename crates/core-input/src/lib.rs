//! Terminal input: crossterm events translated into engine raw keys.
//!
//! The host loop owns the terminal. It calls [`read_input`] with a short
//! idle interval and feeds each returned key to the editor; an empty result
//! means the interval elapsed with nothing to read, which is when the host
//! checks the key-sequence timeout.

mod key_token;

use std::io;
use std::time::Duration;

use core_events::RawKey;
use crossterm::event::{self, Event as CEvent};
use tracing::{debug, trace};

/// What one terminal event amounts to for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalInput {
    Keys(Vec<RawKey>),
    Resize { cols: u16, rows: u16 },
    Idle,
}

/// Wait up to `idle` for one terminal event.
pub fn read_input(idle: Duration) -> io::Result<TerminalInput> {
    if !event::poll(idle)? {
        return Ok(TerminalInput::Idle);
    }
    Ok(translate(event::read()?))
}

/// Translate one crossterm event. Bracketed paste arrives as a string and
/// becomes one key per character.
pub fn translate(event: CEvent) -> TerminalInput {
    match event {
        CEvent::Key(key) => match key_token::map_key_event(&key) {
            Some(raw) => {
                trace!(target: "input.map", ?raw, "key");
                TerminalInput::Keys(vec![raw])
            }
            None => TerminalInput::Idle,
        },
        CEvent::Paste(text) => TerminalInput::Keys(paste_keys(&text)),
        CEvent::Resize(cols, rows) => {
            debug!(target: "input.map", cols, rows, "resize");
            TerminalInput::Resize { cols, rows }
        }
        _ => TerminalInput::Idle,
    }
}

/// Pasted text as raw codes. Line endings collapse to one Enter each.
pub fn paste_keys(text: &str) -> Vec<RawKey> {
    // Content stays out of the log; only its size is recorded.
    trace!(target: "input.paste", chunk_len = text.len(), "paste");
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    normalized
        .chars()
        .map(|c| match c {
            '\n' => RawKey::Code(0x0d),
            c => RawKey::Code(u32::from(c)),
        })
        .collect()
}
