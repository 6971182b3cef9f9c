//! Chatmix Core - Domain types, configuration and mixer state.
//!
//! This crate contains the types shared between the device side
//! (`chatmix-hid`), the audio side (`chatmix-pipewire`) and the daemon.

pub mod config;
pub mod device;
pub mod error;
pub mod mixer;
pub mod state;

pub use config::{MixerConfig, VolumePolicy};
pub use device::{DeviceAddress, UsbId};
pub use error::{Error, Result};
pub use mixer::{MixState, SinkRole};
pub use state::MixerPhase;
