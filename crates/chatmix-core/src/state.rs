//! Mixer loop state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Phase of the mixer loop.
///
/// ```text
/// Init -> Linked -> Streaming -> Terminated
///                      |   ^
///                      v   |
///                  Reconnecting
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixerPhase {
    /// Resolving the device address
    #[default]
    Init,
    /// Sinks ensured and loopbacks requested
    Linked,
    /// Applying decoded reports
    Streaming,
    /// Capture ended, looking for the device again
    Reconnecting,
    /// Event sequence finished; sinks and links are left in place
    Terminated,
}

impl MixerPhase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Linked => "linked",
            Self::Streaming => "streaming",
            Self::Reconnecting => "reconnecting",
            Self::Terminated => "terminated",
        }
    }

    /// Whether moving to `next` is a legal step.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Linked)
                | (Self::Linked | Self::Reconnecting, Self::Streaming)
                | (Self::Streaming, Self::Reconnecting)
                | (Self::Streaming | Self::Reconnecting, Self::Terminated)
        )
    }

    /// Move to `next`, rejecting transitions the loop never makes.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTransition`] for an illegal step.
    pub fn transition(&mut self, next: Self) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(Error::InvalidTransition { from: self.as_str(), to: next.as_str() });
        }
        *self = next;
        Ok(())
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl fmt::Display for MixerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
