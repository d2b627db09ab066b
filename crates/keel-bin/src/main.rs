//! keel entrypoint.
//!
//! Parses the CLI, loads `keel.toml`, installs file logging, builds the
//! editor and then either replays `--keys` headlessly or runs the
//! interactive terminal loop.

mod terminal;

use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use core_actions::Editor;
use core_config::Config;
use core_text::LineBuffer;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "keel.log";
/// Upper bound on waiting for `:!` jobs before a headless run exits.
const JOB_WAIT: Duration = Duration::from_secs(10);

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "keel", version, about = "Vim-style modal editor")]
struct Args {
    /// File to open. A missing file is created by the first `:w`.
    path: Option<PathBuf>,
    /// Configuration file (overrides discovery of `keel.toml`).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Replay this key notation without a terminal and print the buffer.
    #[arg(long, value_name = "NOTATION")]
    keys: Option<String>,
    /// Open the buffer read-only.
    #[arg(long)]
    readonly: bool,
    /// Leader key, overriding `[input] leader`.
    #[arg(long, value_name = "KEY")]
    leader: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    // The log directory comes from the config, so config loading is not logged.
    let config = load_config(&args)?;
    let _log_guard = configure_logging(&config.file.log.dir());
    install_panic_hook();
    info!(target: "runtime", version = env!("CARGO_PKG_VERSION"), "startup");

    let mut editor = build_editor(&args, &config)?;
    match args.keys.as_deref() {
        Some(keys) => {
            print!("{}", replay(&mut editor, keys)?);
            if let Some(msg) = editor.message() {
                eprintln!("{msg}");
            }
            Ok(())
        }
        None => terminal::run(&mut editor),
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = core_config::load_from(args.config.clone())?;
    if let Some(leader) = &args.leader {
        config.file.input.leader = leader.clone();
        config.validate()?;
    }
    Ok(config)
}

fn configure_logging(dir: &Path) -> Option<WorkerGuard> {
    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|()| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn build_editor(args: &Args, config: &Config) -> Result<Editor> {
    let mut editor = Editor::from_config(LineBuffer::default(), config)?;
    if let Some(path) = &args.path {
        if path.exists() {
            editor
                .load_file(path)
                .with_context(|| format!("opening {}", path.display()))?;
        } else {
            info!(target: "io", path = %path.display(), "new_file");
            editor.set_file_name(path);
        }
    }
    if args.readonly {
        editor.state_mut().buffer.set_readonly(true);
    }
    Ok(editor)
}

/// Feed `keys`, resolve whatever is still pending as if the timeout fired,
/// wait for started jobs and return the buffer text.
fn replay(editor: &mut Editor, keys: &str) -> Result<String> {
    editor
        .feed_keys(keys)
        .with_context(|| format!("parsing key notation `{keys}`"))?;
    while editor.flush_pending() {}
    while editor.jobs_in_flight() > 0 {
        if editor.wait_jobs(JOB_WAIT) == 0 {
            warn!(target: "jobs", pending = editor.jobs_in_flight(), "jobs_unfinished_at_exit");
            break;
        }
    }
    let mut out = editor.state().buffer.lines().join("\n");
    out.push('\n');
    Ok(out)
}
