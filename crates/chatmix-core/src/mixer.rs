//! Mix state and sink roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a virtual sink in the chat-mix pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkRole {
    /// Game audio - loud when the knob is turned towards the game side
    Game,
    /// Voice chat audio
    Chat,
}

impl SinkRole {
    /// Both roles, in the order volumes are applied.
    pub const ALL: [SinkRole; 2] = [SinkRole::Game, SinkRole::Chat];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Chat => "chat",
        }
    }
}

impl fmt::Display for SinkRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Volume pair decoded from one mixer report.
///
/// Values are the raw report bytes. Every new state replaces the previous
/// one outright; nothing is smoothed or accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MixState {
    /// Game sink level
    pub game_volume: u8,
    /// Chat sink level
    pub chat_volume: u8,
}

impl MixState {
    #[must_use]
    pub fn new(game_volume: u8, chat_volume: u8) -> Self {
        Self { game_volume, chat_volume }
    }

    /// Get the raw level for a sink role.
    #[must_use]
    pub fn volume_for(&self, role: SinkRole) -> u8 {
        match role {
            SinkRole::Game => self.game_volume,
            SinkRole::Chat => self.chat_volume,
        }
    }
}

impl fmt::Display for MixState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game={} chat={}", self.game_volume, self.chat_volume)
    }
}
