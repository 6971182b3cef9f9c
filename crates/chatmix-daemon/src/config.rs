//! Daemon configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chatmix_core::config::{
    DEFAULT_CHAT_SINK, DEFAULT_DEVICE_NAME, DEFAULT_GAME_SINK, DEFAULT_HEADSET_SINK,
    DEFAULT_REPORT_MARKER,
};
use chatmix_core::{MixerConfig, UsbId, VolumePolicy};
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use crate::cli::Args;

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Device settings
    #[serde(default)]
    pub device: DeviceConfig,
    /// Sink names
    #[serde(default)]
    pub sinks: SinksConfig,
    /// Mixer behavior
    #[serde(default)]
    pub mixer: MixerSection,
}

/// Daemon-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self { log_level: default_log_level(), log_json: false }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// How attached USB devices are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EnumeratorKind {
    /// Parse `lsusb` output
    #[default]
    Lsusb,
    /// Ask libusb directly
    Rusb,
}

/// Device settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device description as printed by `lsusb`
    #[serde(default = "default_device_name")]
    pub name: String,
    /// Match on vendor/product id instead of the description
    #[serde(default)]
    pub usb_id: Option<UsbId>,
    /// Device enumeration backend
    #[serde(default)]
    pub enumerator: EnumeratorKind,
    /// Report id byte of the knob report
    #[serde(default = "default_report_marker")]
    pub report_marker: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            usb_id: None,
            enumerator: EnumeratorKind::Lsusb,
            report_marker: default_report_marker(),
        }
    }
}

fn default_device_name() -> String {
    DEFAULT_DEVICE_NAME.to_string()
}

fn default_report_marker() -> u8 {
    DEFAULT_REPORT_MARKER
}

/// Sink names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinksConfig {
    /// Physical headset output
    #[serde(default = "default_headset_sink")]
    pub headset: String,
    /// Virtual game sink
    #[serde(default = "default_game_sink")]
    pub game: String,
    /// Virtual chat sink
    #[serde(default = "default_chat_sink")]
    pub chat: String,
}

impl Default for SinksConfig {
    fn default() -> Self {
        Self {
            headset: default_headset_sink(),
            game: default_game_sink(),
            chat: default_chat_sink(),
        }
    }
}

fn default_headset_sink() -> String {
    DEFAULT_HEADSET_SINK.to_string()
}

fn default_game_sink() -> String {
    DEFAULT_GAME_SINK.to_string()
}

fn default_chat_sink() -> String {
    DEFAULT_CHAT_SINK.to_string()
}

/// Mixer loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerSection {
    /// Volume conversion
    #[serde(default)]
    pub volume_policy: VolumePolicy,
    /// Seconds without any capture output before giving up on the stream
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
    /// Look for the headset again when the capture ends
    #[serde(default)]
    pub reconnect: bool,
    /// Delay between reconnect attempts
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Give up after this many failed reconnect attempts in a row
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for MixerSection {
    fn default() -> Self {
        Self {
            volume_policy: VolumePolicy::Raw,
            read_timeout_secs: None,
            reconnect: false,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_attempts: None,
        }
    }
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

impl Config {
    /// Apply command line overrides on top of the file values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(level) = &args.log_level {
            self.daemon.log_level.clone_from(level);
        }
        if args.log_json {
            self.daemon.log_json = true;
        }
        if let Some(name) = &args.device_name {
            self.device.name.clone_from(name);
        }
        if let Some(id) = args.usb_id {
            self.device.usb_id = Some(id);
        }
        if let Some(kind) = args.enumerator {
            self.device.enumerator = kind;
        }
        if let Some(sink) = &args.headset_sink {
            self.sinks.headset.clone_from(sink);
        }
        if let Some(sink) = &args.game_sink {
            self.sinks.game.clone_from(sink);
        }
        if let Some(sink) = &args.chat_sink {
            self.sinks.chat.clone_from(sink);
        }
        if args.clamp_volume {
            self.mixer.volume_policy = VolumePolicy::Clamp;
        }
        if let Some(secs) = args.read_timeout {
            self.mixer.read_timeout_secs = Some(secs);
        }
        if args.reconnect {
            self.mixer.reconnect = true;
        }
    }

    /// Build the immutable mixer configuration.
    #[must_use]
    pub fn mixer_config(&self) -> MixerConfig {
        MixerConfig {
            device_name: self.device.name.clone(),
            usb_id: self.device.usb_id,
            headset_sink: self.sinks.headset.clone(),
            game_sink: self.sinks.game.clone(),
            chat_sink: self.sinks.chat.clone(),
            report_marker: self.device.report_marker,
            volume_policy: self.mixer.volume_policy,
            read_timeout: self.mixer.read_timeout_secs.map(Duration::from_secs),
            reconnect: self.mixer.reconnect,
            reconnect_delay: Duration::from_millis(self.mixer.reconnect_delay_ms),
            max_reconnect_attempts: self.mixer.max_reconnect_attempts,
        }
    }
}

/// Where the loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file
    File(PathBuf),
    /// No file at the default location
    Defaults(PathBuf),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults(path) => write!(f, "defaults ({} not found)", path.display()),
        }
    }
}

/// Load configuration from file or defaults.
///
/// An explicitly given path must exist; the default location may be absent.
/// Runs before logging is set up, so the caller logs the returned source.
pub fn load_config(explicit: Option<&Path>) -> Result<(Config, ConfigSource)> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {config_path:?}"))?;
        Ok((config, ConfigSource::File(config_path)))
    } else if explicit.is_some() {
        anyhow::bail!("Config file not found: {config_path:?}")
    } else {
        Ok((Config::default(), ConfigSource::Defaults(config_path)))
    }
}

/// Get the configuration file path.
fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "chatmix", "Chatmix")
        .context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}
