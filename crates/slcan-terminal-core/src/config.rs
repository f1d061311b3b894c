//! Terminal configuration
//!
//! Settings can come from a JSON file; every field is optional and falls back
//! to the adapter defaults. Command-line values are merged on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::link::{LinkSettings, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS};

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: serde_json::Error,
    },

    /// The platform has no user config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}
fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}
fn default_poll_interval_ms() -> u64 {
    10
}
fn default_rx_batch_size() -> usize {
    255
}
fn default_init_settle_ms() -> u64 {
    50
}
fn default_init_response_ms() -> u64 {
    50
}
fn default_quit_words() -> Vec<String> {
    vec!["quit".to_string(), "exit".to_string()]
}

/// Settings for one terminal run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Device path; discovered when absent
    #[serde(default)]
    pub device: Option<String>,

    /// Serial line speed
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Longest a serial read waits for the first byte
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Pause between receiver polls
    ///
    /// Together with the read timeout this bounds how quickly the receiver
    /// notices shutdown, and how much CPU it burns while idle.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Bytes requested per receiver poll
    #[serde(default = "default_rx_batch_size")]
    pub rx_batch_size: usize,

    /// Delay after each init command before listening for a reply
    #[serde(default = "default_init_settle_ms")]
    pub init_settle_ms: u64,

    /// Additional wait before the single reply read of an init command
    #[serde(default = "default_init_response_ms")]
    pub init_response_ms: u64,

    /// Words that end the interactive session
    #[serde(default = "default_quit_words")]
    pub quit_words: Vec<String>,

    /// Commands sent before the interactive loop starts
    #[serde(default)]
    pub init_commands: Vec<String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            device: None,
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            rx_batch_size: default_rx_batch_size(),
            init_settle_ms: default_init_settle_ms(),
            init_response_ms: default_init_response_ms(),
            quit_words: default_quit_words(),
            init_commands: Vec::new(),
        }
    }
}

impl TerminalConfig {
    /// Load from the default location, or defaults if there is no file
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/slcan-terminal/config.json`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("slcan-terminal").join("config.json"))
    }

    /// Overlay command-line values
    ///
    /// A device given on the command line wins; init commands given on the
    /// command line replace those from the file.
    pub fn merge_with_args(mut self, device: Option<&str>, init_commands: Option<Vec<String>>) -> Self {
        if let Some(device) = device {
            self.device = Some(device.to_string());
        }
        if let Some(commands) = init_commands {
            self.init_commands = commands;
        }
        self
    }

    /// Serial settings derived from this config
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            baud_rate: self.baud_rate,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }

    /// Pause between receiver polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Delay after each init command
    pub fn init_settle(&self) -> Duration {
        Duration::from_millis(self.init_settle_ms)
    }

    /// Wait before reading an init command's reply
    pub fn init_response_wait(&self) -> Duration {
        Duration::from_millis(self.init_response_ms)
    }

    /// Whether `line` is one of the quit words
    pub fn is_quit_word(&self, line: &str) -> bool {
        self.quit_words.iter().any(|word| word == line)
    }
}

/// Split a comma-separated command list
///
/// Double quotes group text so commas inside them are kept; the quotes
/// themselves are dropped. Entries are trimmed of spaces and tabs and empty
/// entries are skipped.
pub fn parse_init_commands(list: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    let mut push = |current: &mut String| {
        let trimmed = current.trim_matches([' ', '\t']);
        if !trimmed.is_empty() {
            commands.push(trimmed.to_string());
        }
        current.clear();
    };

    for c in list.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => push(&mut current),
            _ => current.push(c),
        }
    }
    push(&mut current);

    commands
}
