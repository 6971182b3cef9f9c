//! Immutable mixer configuration.
//!
//! Every component receives the parts of [`MixerConfig`] it needs at
//! construction time. Nothing here is global or mutable after startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::UsbId;
use crate::error::{Error, Result};
use crate::mixer::SinkRole;

/// Name of the headset as printed by `lsusb`.
pub const DEFAULT_DEVICE_NAME: &str = "SteelSeries ApS Arctis Nova 7";
/// Physical headset output sink (`pactl list short sinks`).
pub const DEFAULT_HEADSET_SINK: &str = "alsa_output.usb-SteelSeries_Arctis_Nova_7-00.analog-stereo";
/// Virtual sink for game audio.
pub const DEFAULT_GAME_SINK: &str = "gamemix";
/// Virtual sink for chat audio.
pub const DEFAULT_CHAT_SINK: &str = "chatmix";
/// Report id byte of the chat-mix knob report.
pub const DEFAULT_REPORT_MARKER: u8 = 0x45;

/// How decoded report bytes are turned into sink volume percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumePolicy {
    /// Pass the byte through unchanged (0-255)
    #[default]
    Raw,
    /// Clamp to 0-100
    Clamp,
}

impl VolumePolicy {
    /// Convert a raw report byte to a volume percentage.
    #[must_use]
    pub fn apply(self, raw: u8) -> u32 {
        let raw = u32::from(raw);
        match self {
            Self::Raw => {
                if raw > 100 {
                    debug!(raw, "Report volume above 100%, passing through");
                }
                raw
            }
            Self::Clamp => raw.min(100),
        }
    }
}

/// Configuration shared by the locator, decoder, graph manager and loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerConfig {
    /// Device description to look for in the USB listing
    pub device_name: String,
    /// Optional vendor/product id matched instead of `device_name`
    pub usb_id: Option<UsbId>,
    /// Physical output sink both loopbacks feed into
    pub headset_sink: String,
    /// Virtual sink for game audio
    pub game_sink: String,
    /// Virtual sink for chat audio
    pub chat_sink: String,
    /// Report id byte carrying the knob position
    pub report_marker: u8,
    /// Volume conversion
    pub volume_policy: VolumePolicy,
    /// Give up on a silent capture after this long (`None` blocks forever)
    pub read_timeout: Option<Duration>,
    /// Re-locate the device and reopen the capture when it ends
    pub reconnect: bool,
    /// Pause before each reconnect attempt
    pub reconnect_delay: Duration,
    /// Stop after this many consecutive failed attempts (`None` retries forever)
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            usb_id: None,
            headset_sink: DEFAULT_HEADSET_SINK.to_string(),
            game_sink: DEFAULT_GAME_SINK.to_string(),
            chat_sink: DEFAULT_CHAT_SINK.to_string(),
            report_marker: DEFAULT_REPORT_MARKER,
            volume_policy: VolumePolicy::Raw,
            read_timeout: None,
            reconnect: false,
            reconnect_delay: Duration::from_secs(2),
            max_reconnect_attempts: None,
        }
    }
}

impl MixerConfig {
    /// Get the sink name configured for a role.
    #[must_use]
    pub fn sink_name(&self, role: SinkRole) -> &str {
        match role {
            SinkRole::Game => &self.game_sink,
            SinkRole::Chat => &self.chat_sink,
        }
    }

    /// Check the configuration before any component is built from it.
    ///
    /// # Errors
    /// Returns an error if a name is empty or would be mangled by `pactl`
    /// argument splitting, or if both roles share one sink.
    pub fn validate(&self) -> Result<()> {
        if self.device_name.trim().is_empty() {
            return Err(Error::InvalidConfig("device name is empty".to_string()));
        }

        check_sink_name("headset", &self.headset_sink)?;
        check_sink_name("game", &self.game_sink)?;
        check_sink_name("chat", &self.chat_sink)?;

        if self.game_sink == self.chat_sink {
            return Err(Error::DuplicateSinkName(self.game_sink.clone()));
        }

        if self.read_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::InvalidConfig("read timeout must be non-zero".to_string()));
        }

        Ok(())
    }
}

fn check_sink_name(role: &'static str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidSinkName { role, reason: "empty".to_string() });
    }
    if name.chars().any(|c| c.is_whitespace() || c == '=') {
        return Err(Error::InvalidSinkName {
            role,
            reason: format!("{name:?} contains whitespace or '='"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_config_is_valid() {
        let config = MixerConfig::default();
        config.validate().expect("default config should validate");
        assert_eq!(config.sink_name(SinkRole::Game), "gamemix");
        assert_eq!(config.sink_name(SinkRole::Chat), "chatmix");
        assert_eq!(config.report_marker, 0x45);
    }

    #[test]
    fn test_same_sink_for_both_roles_rejected() {
        let config = MixerConfig { chat_sink: "gamemix".into(), ..MixerConfig::default() };
        assert_matches!(config.validate(), Err(Error::DuplicateSinkName(name)) if name == "gamemix");
    }

    #[test]
    fn test_sink_name_with_space_rejected() {
        let config = MixerConfig { game_sink: "game mix".into(), ..MixerConfig::default() };
        assert_matches!(config.validate(), Err(Error::InvalidSinkName { role: "game", .. }));
    }

    #[test]
    fn test_zero_read_timeout_rejected() {
        let config =
            MixerConfig { read_timeout: Some(Duration::ZERO), ..MixerConfig::default() };
        assert_matches!(config.validate(), Err(Error::InvalidConfig(_)));
    }

    #[test]
    fn test_volume_policy() {
        assert_eq!(VolumePolicy::Raw.apply(50), 50);
        assert_eq!(VolumePolicy::Raw.apply(200), 200);
        assert_eq!(VolumePolicy::Clamp.apply(50), 50);
        assert_eq!(VolumePolicy::Clamp.apply(200), 100);
    }
}
