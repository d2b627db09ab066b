//! Mode manager: owns the editor state, the active mode handler and the key
//! resolver, and applies handler results.
//!
//! One key is handled to completion (resolution, dispatch, result
//! application) before the next is accepted. Time enters only through the
//! `*_at(now)` entry points; the host polls `check_timeout` while idle.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use core_config::{ClipboardSetting, Config, ConfigError, MapMode};
use core_events::{CompletedJob, JobRunner, KeyToken, RawKey, ThreadJobRunner, normalize};
use core_keymap::{
    KeySequence, KeyTokenPattern, KeymapError, Keymaps, Resolution, Resolver, ResolverConfig,
    parse_notation,
};
use core_state::{
    Clipboard, ClipboardMirror, EditorOptions, EditorState, Mode, Selection, UndoManager,
};
use core_text::{LineBuffer, Position};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::bindings::builtin_keymaps;
use crate::commands::{self, ExContext};
use crate::handlers::{ActiveHandler, HandlerResult, Input, ModeRequest};
use crate::io::{BufferIo, FsBufferIo};
use crate::plugin::{BindingRegistry, Plugin};
use crate::{Action, PluginHandler};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Keymap(#[from] KeymapError),
}

/// Read-only view handed to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSnapshot {
    pub lines: Vec<String>,
    pub cursor: Position,
    /// Normalized selection bounds; columns are zero in VisualLine.
    pub selection: Option<(Position, Position)>,
    pub mode: Mode,
    /// Count / operator / keys typed but not yet resolved.
    pub pending: String,
    /// Prompt plus typed text while in Command or Search mode.
    pub command_line: Option<String>,
    pub message: Option<String>,
    pub modified: bool,
}

impl RenderSnapshot {
    /// One-line status: mode, cursor (1-based), pending keys, message.
    pub fn status_line(&self) -> String {
        let mut out = format!(
            "-- {} -- {}:{}",
            self.mode,
            self.cursor.row + 1,
            self.cursor.col + 1
        );
        if self.modified {
            out.push_str(" [+]");
        }
        if !self.pending.is_empty() {
            out.push(' ');
            out.push_str(&self.pending);
        }
        if let Some(cl) = &self.command_line {
            out.push(' ');
            out.push_str(cl);
        }
        if let Some(msg) = &self.message {
            out.push_str(" | ");
            out.push_str(msg);
        }
        out
    }
}

pub struct Editor {
    state: EditorState,
    handler: ActiveHandler,
    resolver: Resolver<Mode, Action>,
    io: Box<dyn BufferIo>,
    jobs: Box<dyn JobRunner>,
    plugin_bindings: Vec<(Mode, KeySequence, PluginHandler)>,
    quit: bool,
}

impl Editor {
    /// Editor with default settings: `\` leader, 1000ms timeout, built-in
    /// bindings only.
    pub fn new(buffer: LineBuffer) -> Self {
        Self::with_parts(
            EditorState::new(buffer),
            Resolver::new(ResolverConfig::default(), builtin_keymaps()),
        )
    }

    pub fn from_config(buffer: LineBuffer, config: &Config) -> Result<Self, EditorError> {
        let mut state = EditorState::new(buffer);
        state.undo = UndoManager::new(config.file.undo.max_stack_size);
        apply_settings(&mut state, config);
        let keymaps = build_keymaps(config, &[])?;
        let resolver = Resolver::new(config.resolver_config()?, keymaps);
        Ok(Self::with_parts(state, resolver))
    }

    fn with_parts(state: EditorState, resolver: Resolver<Mode, Action>) -> Self {
        Self {
            handler: ActiveHandler::for_mode(state.mode),
            state,
            resolver,
            io: Box::new(FsBufferIo),
            jobs: Box::new(ThreadJobRunner::new()),
            plugin_bindings: Vec::new(),
            quit: false,
        }
    }

    pub fn set_buffer_io(&mut self, io: Box<dyn BufferIo>) {
        self.io = io;
    }

    pub fn set_job_runner(&mut self, jobs: Box<dyn JobRunner>) {
        self.jobs = jobs;
    }

    /// Attach the clipboard collaborator. Mirroring follows the configured
    /// `[registers] clipboard` setting.
    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        let mirror = self.state.registers.mirror();
        self.state.registers.set_clipboard(Some(clipboard), mirror);
    }

    pub fn set_file_name(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.state.buffer.name = path.display().to_string();
        self.state.file_name = Some(path);
    }

    /// Load `path` into the buffer through the I/O collaborator.
    pub fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        commands::load_into(&mut self.state, self.io.as_ref(), path)?;
        self.set_mode(Mode::Normal);
        Ok(())
    }

    /// Apply a new configuration: settings are updated in place and the
    /// resolver is rebuilt with the new leader, timeout and `[[map]]`
    /// bindings. Plugin bindings are carried over. On error nothing changes.
    pub fn reconfigure(&mut self, config: &Config) -> Result<(), EditorError> {
        let keymaps = build_keymaps(config, &self.plugin_bindings)?;
        self.resolver = Resolver::new(config.resolver_config()?, keymaps);
        apply_settings(&mut self.state, config);
        info!(target: "config", leader = %self.resolver.config().leader, "editor_reconfigured");
        Ok(())
    }

    /// Let `plugin` register its bindings. The first conflicting binding
    /// aborts loading; bindings registered before it stay.
    pub fn load_plugin(&mut self, plugin: &dyn Plugin) -> Result<(), KeymapError> {
        let mut registry = BindingRegistry::new(plugin.name(), self.resolver.keymaps_mut());
        let outcome = plugin.register(&mut registry);
        self.plugin_bindings.extend(registry.into_added());
        info!(target: "input.map", plugin = plugin.name(), ok = outcome.is_ok(), "plugin_loaded");
        outcome
    }

    pub fn feed(&mut self, raw: RawKey) {
        self.feed_at(raw, Instant::now());
    }

    pub fn feed_at(&mut self, raw: RawKey, now: Instant) {
        match normalize(raw) {
            Some(key) => self.feed_token_at(key, now),
            None => trace!(target: "input.resolver", ?raw, "raw_key_rejected"),
        }
    }

    pub fn feed_token(&mut self, key: KeyToken) {
        self.feed_token_at(key, Instant::now());
    }

    pub fn feed_token_at(&mut self, key: KeyToken, now: Instant) {
        self.state.clear_message();
        self.route(key, now);
    }

    /// Feed every key of a notation string (`"d2w"`, `"<Leader>gd"`,
    /// `"ihello<Esc>"`); `<Leader>` stands for the configured leader.
    pub fn feed_keys_at(&mut self, notation: &str, now: Instant) -> Result<(), KeymapError> {
        let seq = parse_notation(notation)?;
        let leader = self.resolver.config().leader;
        for pattern in seq.patterns() {
            let key = match pattern {
                KeyTokenPattern::Key(k) => *k,
                KeyTokenPattern::Leader => leader,
            };
            self.feed_token_at(key, now);
        }
        Ok(())
    }

    pub fn feed_keys(&mut self, notation: &str) -> Result<(), KeymapError> {
        self.feed_keys_at(notation, Instant::now())
    }

    /// Resolve pending keys if the timeout has elapsed. Returns true when
    /// something was dispatched.
    pub fn check_timeout(&mut self) -> bool {
        self.check_timeout_at(Instant::now())
    }

    pub fn check_timeout_at(&mut self, now: Instant) -> bool {
        match self.resolver.check_timeout_at(self.state.mode, now) {
            Some(res) => {
                self.resolve(res, now);
                true
            }
            None => false,
        }
    }

    /// Resolve pending keys now, as if the timeout had fired (end of a
    /// scripted key sequence).
    pub fn flush_pending(&mut self) -> bool {
        match self.resolver.flush(self.state.mode) {
            Some(res) => {
                self.resolve(res, Instant::now());
                true
            }
            None => false,
        }
    }

    /// Observe finished background jobs; their output becomes the message.
    pub fn poll_jobs(&mut self) -> usize {
        let done = self.jobs.poll();
        self.report_jobs(&done)
    }

    /// Like [`poll_jobs`](Self::poll_jobs) but blocks up to `timeout` for a
    /// completion. Headless hosts call this before printing the result.
    pub fn wait_jobs(&mut self, timeout: Duration) -> usize {
        let done = self.jobs.wait(timeout);
        self.report_jobs(&done)
    }

    fn report_jobs(&mut self, done: &[CompletedJob]) -> usize {
        for job in done {
            let msg = job_message(job);
            self.state.set_message(msg);
        }
        done.len()
    }

    pub fn jobs_in_flight(&self) -> usize {
        self.jobs.in_flight()
    }

    /// Execute an ex command line as if typed after `:`.
    pub fn run_command(&mut self, line: &str) {
        let result = self.execute_ex(line);
        self.apply(result);
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        let st = &self.state;
        let mut pending = self.handler.pending_display();
        for k in self.resolver.pending() {
            pending.push_str(&k.to_string());
        }
        RenderSnapshot {
            lines: st.buffer.lines().to_vec(),
            cursor: st.cursor,
            selection: st.selection.map(|s| s.normalized_range()),
            mode: st.mode,
            pending,
            command_line: st
                .command_line
                .prompt()
                .map(|p| format!("{p}{}", st.command_line.buffer())),
            message: st.message().map(str::to_string),
            modified: st.buffer.is_modified(),
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn message(&self) -> Option<&str> {
        self.state.message()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn pending_keys(&self) -> &[KeyToken] {
        self.resolver.pending()
    }

    pub fn resolver_config(&self) -> &ResolverConfig {
        self.resolver.config()
    }

    fn route(&mut self, key: KeyToken, now: Instant) {
        // `f`/`t`/`"` arguments bypass the keymaps.
        if self.handler.wants_raw_key() && self.resolver.pending().is_empty() {
            self.dispatch(Input::Key(key));
            return;
        }
        let res = self.resolver.process_token_at(key, self.state.mode, now);
        self.resolve(res, now);
    }

    fn resolve(&mut self, res: Resolution<Action>, now: Instant) {
        let replay = match res {
            Resolution::Handled { action, replay } => {
                self.dispatch(Input::Action(action));
                replay
            }
            Resolution::Passthrough { key, replay } => {
                self.dispatch(Input::Key(key));
                replay
            }
            Resolution::Pending | Resolution::Rejected => return,
        };
        for key in replay {
            self.route(key, now);
        }
    }

    fn dispatch(&mut self, input: Input) {
        trace!(target: "actions.dispatch", mode = %self.state.mode, ?input, "dispatch");
        let result = match input {
            Input::Action(Action::Ex(line)) => self.execute_ex(&line),
            Input::Action(Action::Plugin(handler)) => {
                debug!(target: "actions.dispatch", plugin = %handler.name, "plugin_action");
                handler.call(&mut self.state)
            }
            input => self.handler.handle(input, &mut self.state),
        };
        self.apply(result);
    }

    fn execute_ex(&mut self, line: &str) -> HandlerResult {
        commands::execute(
            line,
            ExContext {
                state: &mut self.state,
                io: self.io.as_ref(),
                jobs: self.jobs.as_mut(),
            },
        )
    }

    fn apply(&mut self, result: HandlerResult) {
        let HandlerResult {
            request,
            message,
            quit,
            ex,
        } = result;
        if let Some(msg) = message {
            self.state.set_message(msg);
        }
        if let Some(request) = request {
            self.apply_request(request);
        }
        if let Some(line) = ex {
            let result = self.execute_ex(&line);
            self.apply(result);
        }
        if quit {
            info!(target: "actions.mode", "quit_requested");
            self.quit = true;
        }
        self.sync_cursor();
    }

    fn apply_request(&mut self, request: ModeRequest) {
        match request {
            ModeRequest::Transition {
                to,
                clear_selection,
            } => {
                let from = self.state.mode;
                if from == Mode::Insert && to != Mode::Insert {
                    self.state.undo.end_group();
                    self.state.cursor.col = self.state.cursor.col.saturating_sub(1);
                }
                if to == Mode::Insert {
                    self.state.undo.begin_group();
                }
                if clear_selection {
                    self.state.selection = None;
                }
                self.resolver.clear();
                self.set_mode(to);
            }
            ModeRequest::StartVisual { line_mode } => {
                self.state.selection = Some(Selection::new(self.state.cursor, line_mode));
                self.set_mode(if line_mode {
                    Mode::VisualLine
                } else {
                    Mode::Visual
                });
            }
            ModeRequest::ToggleLineMode => {
                if let Some(sel) = self.state.selection.as_mut() {
                    sel.line_mode = !sel.line_mode;
                    let to = if sel.line_mode {
                        Mode::VisualLine
                    } else {
                        Mode::Visual
                    };
                    self.set_mode(to);
                }
            }
            ModeRequest::SwapAnchor => {
                if let Some(sel) = self.state.selection.as_mut() {
                    let anchor = sel.start;
                    sel.start = self.state.cursor;
                    self.state.cursor = anchor;
                }
            }
        }
    }

    fn set_mode(&mut self, to: Mode) {
        let from = self.state.mode;
        if from == to {
            return;
        }
        debug!(target: "actions.mode", %from, %to, "mode_transition");
        self.state.mode = to;
        // Visual and VisualLine share a handler and its pending state.
        if !(from.is_visual() && to.is_visual()) {
            self.handler = ActiveHandler::for_mode(to);
        }
    }

    /// Keep the cursor on the buffer and the selection's free end on the
    /// cursor.
    fn sync_cursor(&mut self) {
        self.state.clamp_cursor();
        if self.state.mode.is_visual()
            && let Some(sel) = self.state.selection.as_mut()
        {
            sel.end = self.state.cursor;
        }
    }
}

fn apply_settings(state: &mut EditorState, config: &Config) {
    state.options = EditorOptions {
        tab_inserts_spaces: config.file.editor.tab_inserts_spaces,
        shiftwidth: config.file.editor.shiftwidth,
    };
    let mirror = match config.file.registers.clipboard {
        ClipboardSetting::None => ClipboardMirror::None,
        ClipboardSetting::Unnamed => ClipboardMirror::Unnamed,
        ClipboardSetting::UnnamedNamed => ClipboardMirror::UnnamedNamed,
    };
    state.registers.set_mirror(mirror);
}

fn map_mode(mode: MapMode) -> Mode {
    match mode {
        MapMode::Normal => Mode::Normal,
        MapMode::Insert => Mode::Insert,
        MapMode::Visual => Mode::Visual,
        MapMode::VisualLine => Mode::VisualLine,
        MapMode::Command => Mode::Command,
        MapMode::Search => Mode::Search,
    }
}

/// Built-ins, then `[[map]]` entries, then plugin bindings.
fn build_keymaps(
    config: &Config,
    plugins: &[(Mode, KeySequence, PluginHandler)],
) -> Result<Keymaps<Mode, Action>, EditorError> {
    let mut maps = builtin_keymaps();
    for (mode, entry) in config.maps()? {
        let seq = parse_notation(&entry.keys)?;
        maps.register(map_mode(mode), &seq, Action::Ex(entry.command.clone()))?;
    }
    for (mode, seq, handler) in plugins {
        maps.register(*mode, seq, Action::Plugin(handler.clone()))?;
    }
    Ok(maps)
}

fn job_message(job: &CompletedJob) -> String {
    match &job.outcome {
        Ok(out) => {
            let out = out.trim_end();
            if out.is_empty() {
                format!("[{}] done", job.label)
            } else {
                out.to_string()
            }
        }
        Err(e) => format!("[{}] failed: {e:#}", job.label),
    }
}
