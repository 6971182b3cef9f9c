//! Chatmix PipeWire - Virtual sinks, loopbacks and volume control.
//!
//! This crate drives the audio server through its PulseAudio-compatible
//! control interface:
//! - Listing sinks
//! - Creating the game/chat null sinks
//! - Looping each sink's monitor into the headset output
//! - Applying per-sink volumes
//!
//! The [`GraphManager`] only depends on the [`AudioServer`] trait;
//! [`PactlServer`] is the real backend and [`MemoryServer`] an in-process
//! stand-in used for dry runs and tests.

pub mod error;
pub mod graph;
pub mod link;
pub mod memory;
pub mod pactl;
pub mod server;
pub mod sink;

pub use error::{PwError, PwResult};
pub use graph::GraphManager;
pub use link::LoopbackParams;
pub use memory::{MemoryServer, ServerCall};
pub use pactl::PactlServer;
pub use server::AudioServer;
pub use sink::{SinkRecord, VirtualSinkProps};
