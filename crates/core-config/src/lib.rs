//! Configuration loading and parsing.
//!
//! Reads `keel.toml` (or an override path supplied by the binary). Every
//! section is optional; absent fields take the defaults below. Unknown fields
//! are ignored so newer files still load. A missing or syntactically broken
//! file falls back to defaults with a log line; a file that parses but names
//! an unknown mode or an unusable leader is rejected.
//!
//! ```toml
//! [input]
//! leader = "<Space>"
//! timeout = true
//! timeoutlen = 1000
//!
//! [registers]
//! clipboard = "unnamed"
//!
//! [undo]
//! max_stack_size = 1000
//!
//! [editor]
//! tab_inserts_spaces = false
//! shiftwidth = 4
//!
//! [log]
//! dir = "/tmp"
//!
//! [[map]]
//! mode = "normal"
//! keys = "<Leader>w"
//! command = "w"
//! ```

use std::{fs, path::PathBuf, time::Duration};

use core_events::KeyToken;
use core_keymap::{ResolverConfig, parse_key};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

pub const FILE_NAME: &str = "keel.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown mode `{0}` in [[map]]")]
    UnknownMode(String),
    #[error("invalid leader `{0}`: expected a single key")]
    InvalidLeader(String),
    #[error("[undo] max_stack_size must be at least 1")]
    ZeroUndoStack,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "InputConfig::default_leader")]
    pub leader: String,
    #[serde(default = "InputConfig::default_timeout")] // Vim default: enabled
    pub timeout: bool,
    #[serde(default = "InputConfig::default_timeoutlen")] // Vim default 1000ms
    pub timeoutlen: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            leader: Self::default_leader(),
            timeout: Self::default_timeout(),
            timeoutlen: Self::default_timeoutlen(),
        }
    }
}

impl InputConfig {
    fn default_leader() -> String {
        "\\".to_string()
    }
    const fn default_timeout() -> bool {
        true
    }
    const fn default_timeoutlen() -> u32 {
        1000
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardSetting {
    #[default]
    None,
    Unnamed,
    UnnamedNamed,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RegistersConfig {
    #[serde(default)]
    pub clipboard: ClipboardSetting,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UndoConfig {
    #[serde(default = "UndoConfig::default_max_stack_size")]
    pub max_stack_size: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_stack_size: Self::default_max_stack_size(),
        }
    }
}

impl UndoConfig {
    const fn default_max_stack_size() -> usize {
        1000
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditorConfig {
    #[serde(default)]
    pub tab_inserts_spaces: bool,
    #[serde(default = "EditorConfig::default_shiftwidth")]
    pub shiftwidth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_inserts_spaces: false,
            shiftwidth: Self::default_shiftwidth(),
        }
    }
}

impl EditorConfig {
    const fn default_shiftwidth() -> usize {
        4
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LogConfig {
    /// Directory for `keel.log`; the system temp dir when unset.
    pub dir: Option<PathBuf>,
}

impl LogConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// One `[[map]]` entry: `keys` in `mode` runs the ex `command`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub mode: String,
    pub keys: String,
    pub command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    Normal,
    Insert,
    Visual,
    VisualLine,
    Command,
    Search,
}

impl MapMode {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "normal" | "n" => Self::Normal,
            "insert" | "i" => Self::Insert,
            "visual" | "v" => Self::Visual,
            "visual_line" | "visualline" => Self::VisualLine,
            "command" | "c" => Self::Command,
            "search" => Self::Search,
            _ => return None,
        })
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub registers: RegistersConfig,
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub map: Vec<MapEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file text, when one was read
    pub file: ConfigFile,
}

/// Config path: `./keel.toml` when present, else the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("keel").join(FILE_NAME);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            info!(target: "config", path = %path.display(), error = %e, "config_defaults_no_file");
            return Ok(Config::default());
        }
    };
    let file = match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => file,
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            return Ok(Config::default());
        }
    };
    let cfg = Config {
        raw: Some(content),
        file,
    };
    cfg.validate()?;
    info!(target: "config", path = %path.display(), maps = cfg.file.map.len(), "config_loaded");
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.leader()?;
        if self.file.undo.max_stack_size == 0 {
            return Err(ConfigError::ZeroUndoStack);
        }
        self.maps()?;
        Ok(())
    }

    pub fn leader(&self) -> Result<KeyToken, ConfigError> {
        let raw = &self.file.input.leader;
        parse_key(raw).ok_or_else(|| ConfigError::InvalidLeader(raw.clone()))
    }

    /// Immutable snapshot handed to the key resolver.
    pub fn resolver_config(&self) -> Result<ResolverConfig, ConfigError> {
        let input = &self.file.input;
        Ok(ResolverConfig {
            leader: self.leader()?,
            timeout: input
                .timeout
                .then(|| Duration::from_millis(u64::from(input.timeoutlen))),
        })
    }

    /// `[[map]]` entries with their modes resolved.
    pub fn maps(&self) -> Result<Vec<(MapMode, &MapEntry)>, ConfigError> {
        self.file
            .map
            .iter()
            .map(|m| {
                MapMode::parse(&m.mode)
                    .map(|mode| (mode, m))
                    .ok_or_else(|| ConfigError::UnknownMode(m.mode.clone()))
            })
            .collect()
    }
}
