use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::utils::PlaybackError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// `auto`, `gstreamer` or `none`
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_initial_volume")]
    pub initial_volume: u8,

    #[serde(default = "default_skip_seconds")]
    pub skip_seconds: u64,

    /// Played when a track carries no audio of its own
    #[serde(default = "default_source_uri")]
    pub default_source_uri: String,

    /// Minimum spacing between position events from the native backend
    #[serde(default = "default_position_update_interval_ms")]
    pub position_update_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Read `path`, writing the defaults out first when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            debug!("Loading config from {:?}", path);
            let contents = fs::read_to_string(path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            info!("Config loaded successfully");
            config
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.playback.initial_volume > 100 {
            return Err(PlaybackError::Configuration(format!(
                "initial_volume must be within 0..=100, got {}",
                self.playback.initial_volume
            )));
        }
        if self.playback.skip_seconds == 0 {
            return Err(PlaybackError::Configuration(
                "skip_seconds must be greater than zero".to_string(),
            ));
        }
        if self.playback.position_update_interval_ms == 0 {
            return Err(PlaybackError::Configuration(
                "position_update_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(PlaybackError::Configuration(
                "channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("mindful-player").join("config.toml"))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            initial_volume: default_initial_volume(),
            skip_seconds: default_skip_seconds(),
            default_source_uri: default_source_uri(),
            position_update_interval_ms: default_position_update_interval_ms(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

// Default value functions
fn default_backend() -> String { "auto".to_string() }
fn default_initial_volume() -> u8 { 50 }
fn default_skip_seconds() -> u64 { 10 }
fn default_source_uri() -> String { "https://www.soundjay.com/misc/sounds/rain-01.wav".to_string() }
fn default_position_update_interval_ms() -> u64 { 1000 }
fn default_channel_capacity() -> usize { 64 }
fn default_log_filter() -> String { "mindful_player=info".to_string() }
