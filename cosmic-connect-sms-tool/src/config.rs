//! Tool Configuration
//!
//! Settings for threading and display, read from
//! `~/.config/cosmic/cosmic-connect/sms.toml`. A missing file means defaults;
//! missing keys take their per-field default.

use anyhow::{Context, Result};
use cosmic_connect_sms::{DEFAULT_BREAK_THRESHOLD, MAX_CONVERSATIONS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// File name inside the Cosmic Connect config directory
pub const CONFIG_FILE_NAME: &str = "sms.toml";

/// SMS tool configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Thread grouping
    #[serde(default)]
    pub threading: ThreadingConfig,

    /// Output rendering
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Thread grouping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadingConfig {
    /// Gap in seconds after which a same-direction run is split
    #[serde(default = "default_break_threshold_secs")]
    pub break_threshold_secs: u64,
}

/// Output rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Use the short timestamp form for message labels
    #[serde(default = "default_false")]
    pub short_times: bool,

    /// Wrap URLs in message bodies in anchors
    #[serde(default = "default_true")]
    pub linkify: bool,

    /// Length of the conversation list
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
}

fn default_break_threshold_secs() -> u64 {
    DEFAULT_BREAK_THRESHOLD.as_secs()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_max_conversations() -> usize {
    MAX_CONVERSATIONS
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            break_threshold_secs: default_break_threshold_secs(),
        }
    }
}

impl ThreadingConfig {
    pub fn break_threshold(&self) -> Duration {
        Duration::from_secs(self.break_threshold_secs)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            short_times: default_false(),
            linkify: default_true(),
            max_conversations: default_max_conversations(),
        }
    }
}

impl Config {
    /// Path of the config file in the user's config directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("cosmic")
            .join("cosmic-connect")
            .join(CONFIG_FILE_NAME)
    }

    /// Load from `path`, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }
}
