//! Ex command line: parsing into `ParsedCommand` and execution against the
//! editor state and its collaborators.
//!
//! Parsing is pure classification; all user-facing failures become messages
//! in the returned `HandlerResult`, never errors.

use std::path::{Path, PathBuf};

use anyhow::Context;
use core_events::{JobFn, JobRunner};
use core_state::{EditorState, UndoManager};
use core_text::Position;
use core_text::motion::first_non_blank;
use tracing::{debug, error, info};

use crate::HandlerResult;
use crate::io::BufferIo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Write { path: Option<PathBuf>, force: bool },
    Quit,
    ForceQuit,
    WriteQuit,
    /// `:x`: write only when modified, then quit.
    Xit,
    Edit { path: PathBuf, force: bool },
    Goto(usize),
    SetReadonly(bool),
    Registers,
    Undo,
    Redo,
    Shell(String),
    Empty,
    Unknown(String),
}

pub struct CommandParser;

impl CommandParser {
    /// Parse a command line, with or without its leading `:`.
    pub fn parse(raw: &str) -> ParsedCommand {
        let s = raw.trim();
        let body = s.strip_prefix(':').unwrap_or(s).trim_start();
        if body.is_empty() {
            return ParsedCommand::Empty;
        }
        if let Some(cmd) = body.strip_prefix('!') {
            let cmd = cmd.trim();
            if cmd.is_empty() {
                return ParsedCommand::Unknown(body.to_string());
            }
            return ParsedCommand::Shell(cmd.to_string());
        }
        if let Ok(n) = body.parse::<usize>() {
            return ParsedCommand::Goto(n);
        }
        let name_len = body
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(body.len());
        let (name, rest) = body.split_at(name_len);
        let (force, rest) = match rest.strip_prefix('!') {
            Some(r) => (true, r),
            None => (false, rest),
        };
        let arg = rest.trim();
        let path = (!arg.is_empty()).then(|| PathBuf::from(arg));
        match (name, force) {
            ("w" | "write", _) => ParsedCommand::Write { path, force },
            ("q" | "quit", false) if path.is_none() => ParsedCommand::Quit,
            ("q" | "quit", true) if path.is_none() => ParsedCommand::ForceQuit,
            ("wq", _) if path.is_none() => ParsedCommand::WriteQuit,
            ("x" | "xit", _) if path.is_none() => ParsedCommand::Xit,
            ("e" | "edit", _) => match path {
                Some(path) => ParsedCommand::Edit { path, force },
                None => ParsedCommand::Unknown(body.to_string()),
            },
            ("set" | "se", false) => match arg {
                "readonly" | "ro" => ParsedCommand::SetReadonly(true),
                "noreadonly" | "noro" => ParsedCommand::SetReadonly(false),
                _ => ParsedCommand::Unknown(body.to_string()),
            },
            ("reg" | "registers" | "di" | "display", false) => ParsedCommand::Registers,
            ("u" | "undo", false) if path.is_none() => ParsedCommand::Undo,
            ("red" | "redo", false) if path.is_none() => ParsedCommand::Redo,
            _ => ParsedCommand::Unknown(body.to_string()),
        }
    }
}

/// Collaborators an ex command may reach.
pub(crate) struct ExContext<'a> {
    pub state: &'a mut EditorState,
    pub io: &'a dyn BufferIo,
    pub jobs: &'a mut dyn JobRunner,
}

pub(crate) fn execute(raw: &str, cx: ExContext<'_>) -> HandlerResult {
    let parsed = CommandParser::parse(raw);
    debug!(target: "actions.dispatch", command = raw, ?parsed, "ex");
    let ExContext { state, io, jobs } = cx;
    match parsed {
        ParsedCommand::Empty => HandlerResult::none(),
        ParsedCommand::Write { path, force } => write(state, io, path.as_deref(), force),
        ParsedCommand::Quit => {
            if state.buffer.is_modified() {
                HandlerResult::message("E37: No write since last change (add ! to override)")
            } else {
                HandlerResult::quit()
            }
        }
        ParsedCommand::ForceQuit => HandlerResult::quit(),
        ParsedCommand::WriteQuit => write_then_quit(state, io),
        ParsedCommand::Xit => {
            if state.buffer.is_modified() {
                write_then_quit(state, io)
            } else {
                HandlerResult::quit()
            }
        }
        ParsedCommand::Edit { path, force } => {
            if state.buffer.is_modified() && !force {
                return HandlerResult::message(
                    "E37: No write since last change (add ! to override)",
                );
            }
            match load_into(state, io, &path) {
                Ok(n) => HandlerResult::message(format!("\"{}\" {n}L", path.display())),
                Err(e) => {
                    error!(target: "io", path = %path.display(), error = %e, "edit_failed");
                    HandlerResult::message(format!("E484: Can't open file {}", path.display()))
                }
            }
        }
        ParsedCommand::Goto(n) => {
            let row = n.saturating_sub(1).min(state.buffer.last_row());
            state.cursor = first_non_blank(&state.buffer, Position::new(row, 0))
                .unwrap_or(Position::new(row, 0));
            HandlerResult::none()
        }
        ParsedCommand::SetReadonly(on) => {
            state.buffer.set_readonly(on);
            HandlerResult::none()
        }
        ParsedCommand::Registers => HandlerResult::message(registers_listing(state)),
        ParsedCommand::Undo => {
            if !state.check_writable() {
                return HandlerResult::none();
            }
            if state.undo.undo(&mut state.buffer, &mut state.cursor) {
                HandlerResult::none()
            } else {
                HandlerResult::message("Already at oldest change")
            }
        }
        ParsedCommand::Redo => {
            if !state.check_writable() {
                return HandlerResult::none();
            }
            if state.undo.redo(&mut state.buffer, &mut state.cursor) {
                HandlerResult::none()
            } else {
                HandlerResult::message("Already at newest change")
            }
        }
        ParsedCommand::Shell(cmd) => {
            let handle = jobs.run_async(&cmd, shell_job(cmd.clone()), None);
            debug!(target: "jobs", id = handle.0, command = %cmd, "shell_started");
            HandlerResult::none()
        }
        ParsedCommand::Unknown(cmd) => {
            HandlerResult::message(format!("E492: Not an editor command: {cmd}"))
        }
    }
}

fn write(
    state: &mut EditorState,
    io: &dyn BufferIo,
    path: Option<&Path>,
    force: bool,
) -> HandlerResult {
    let Some(target) = path.map(Path::to_path_buf).or_else(|| state.file_name.clone()) else {
        return HandlerResult::message("E32: No file name");
    };
    if state.buffer.is_readonly() && !force {
        return HandlerResult::message("E45: 'readonly' option is set (add ! to override)");
    }
    let n = state.buffer.line_count();
    match io.save(&target, state.buffer.lines()) {
        Ok(()) => {
            let same_file = state.file_name.as_deref().is_none_or(|f| f == target);
            if same_file {
                state.buffer.set_modified(false);
                state.file_name = Some(target.clone());
            }
            info!(target: "io", path = %target.display(), lines = n, "file_written");
            HandlerResult::message(format!("\"{}\" {n}L written", target.display()))
        }
        Err(e) => {
            error!(target: "io", path = %target.display(), error = %e, "file_write_failed");
            HandlerResult::message(format!("E212: Can't open file for writing: {e:#}"))
        }
    }
}

fn write_then_quit(state: &mut EditorState, io: &dyn BufferIo) -> HandlerResult {
    let mut result = write(state, io, None, false);
    result.quit = !state.buffer.is_modified();
    result
}

/// Replace the buffer with the file at `path`. Undo history restarts.
pub(crate) fn load_into(
    state: &mut EditorState,
    io: &dyn BufferIo,
    path: &Path,
) -> anyhow::Result<usize> {
    let lines = io.load(path)?;
    let n = lines.len();
    state.buffer.replace_all(lines);
    state.buffer.set_modified(false);
    state.buffer.name = path.display().to_string();
    state.file_name = Some(path.to_path_buf());
    state.cursor = Position::origin();
    state.selection = None;
    state.undo = UndoManager::new(state.undo.max_stack_size());
    info!(target: "io", path = %path.display(), lines = n, "file_loaded");
    Ok(n)
}

fn registers_listing(state: &EditorState) -> String {
    let entries = state.registers.list();
    if entries.is_empty() {
        return "--- Registers --- (empty)".to_string();
    }
    let mut out = String::from("--- Registers ---");
    for (name, content) in entries {
        out.push('\n');
        out.push_str(&format!("{name}   {}", content.text.replace('\n', "^J")));
    }
    out
}

fn shell_job(cmd: String) -> JobFn {
    Box::new(move || {
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(&cmd)
            .output()
            .with_context(|| format!("spawning `{cmd}`"))?;
        if !output.status.success() {
            anyhow::bail!("`{cmd}` exited with {}", output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    })
}
