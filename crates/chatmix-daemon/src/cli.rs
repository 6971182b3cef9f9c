//! Command line arguments.

use std::path::PathBuf;

use chatmix_core::UsbId;
use clap::Parser;

use crate::config::EnumeratorKind;

/// Map the headset chat-mix knob onto a game sink and a chat sink.
#[derive(Debug, Parser)]
#[command(name = "chatmix-daemon", version, about)]
pub struct Args {
    /// Config file (default: the user config dir's chatmix/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level for the chatmix crates, or a full tracing filter directive
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    pub log_json: bool,

    /// Device description as printed by lsusb
    #[arg(long)]
    pub device_name: Option<String>,

    /// Match the device by VVVV:PPPP instead of its description
    #[arg(long)]
    pub usb_id: Option<UsbId>,

    /// USB enumeration backend
    #[arg(long, value_enum)]
    pub enumerator: Option<EnumeratorKind>,

    /// Physical headset output sink
    #[arg(long)]
    pub headset_sink: Option<String>,

    /// Virtual game sink name
    #[arg(long)]
    pub game_sink: Option<String>,

    /// Virtual chat sink name
    #[arg(long)]
    pub chat_sink: Option<String>,

    /// Clamp knob values to 0-100 instead of passing them through
    #[arg(long)]
    pub clamp_volume: bool,

    /// Give up on the capture after this many silent seconds
    #[arg(long, value_name = "SECS")]
    pub read_timeout: Option<u64>,

    /// Look for the headset again when the capture ends
    #[arg(long)]
    pub reconnect: bool,

    /// Log audio server calls instead of running pactl
    #[arg(long)]
    pub dry_run: bool,
}
