//! Chatmix Daemon - headset chat-mix knob to audio sink mapping.
//!
//! This is the main entry point. It loads configuration, picks the USB
//! enumeration and audio server backends, and runs the mixer loop until the
//! report stream ends or a shutdown signal arrives.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod mixer;
mod signals;

use chatmix_hid::{HidCapture, LsusbEnumerator, ReportSource, RusbEnumerator, UsbEnumerator};
use chatmix_pipewire::{AudioServer, MemoryServer, PactlServer};

use crate::cli::Args;
use crate::config::{DaemonConfig, EnumeratorKind};
use crate::mixer::MixerLoop;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let (mut config, source) = config::load_config(args.config.as_deref())?;
    config.apply_args(&args);

    init_logging(&config.daemon)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting chatmix daemon");
    info!(%source, "Configuration source");

    let mixer_config = config.mixer_config();
    mixer_config.validate().context("Invalid configuration")?;
    info!(
        device = %mixer_config.device_name,
        headset = %mixer_config.headset_sink,
        game = %mixer_config.game_sink,
        chat = %mixer_config.chat_sink,
        policy = ?mixer_config.volume_policy,
        reconnect = mixer_config.reconnect,
        "Configuration loaded"
    );

    let enumerator: Arc<dyn UsbEnumerator> = match config.device.enumerator {
        EnumeratorKind::Lsusb => Arc::new(LsusbEnumerator::default()),
        EnumeratorKind::Rusb => Arc::new(RusbEnumerator),
    };

    let mut shutdown_rx = signals::setup_signal_handlers()?;

    if args.dry_run {
        info!("Dry run: audio server calls are logged, not executed");
        let server = MemoryServer::with_sinks(&[mixer_config.headset_sink.as_str()]);
        let mixer = MixerLoop::new(mixer_config, enumerator, server, HidCapture::default());
        run_until_shutdown(mixer, &mut shutdown_rx).await?;
    } else {
        let mixer =
            MixerLoop::new(mixer_config, enumerator, PactlServer::default(), HidCapture::default());
        run_until_shutdown(mixer, &mut shutdown_rx).await?;
    }

    info!("Chatmix daemon stopped");
    Ok(())
}

/// Drive the mixer loop, stopping early on SIGINT/SIGTERM.
///
/// Dropping the loop kills the capture process; sinks and loopbacks stay.
async fn run_until_shutdown<S: AudioServer, R: ReportSource>(
    mut mixer: MixerLoop<S, R>,
    shutdown_rx: &mut mpsc::Receiver<&'static str>,
) -> Result<()> {
    tokio::select! {
        result = mixer.run() => {
            result.context("Mixer loop failed")?;
        }
        Some(signal) = shutdown_rx.recv() => {
            info!(signal, "Shutdown signal received");
        }
    }
    info!(phase = %mixer.phase(), "Mixer stopped");
    Ok(())
}

fn init_logging(daemon: &DaemonConfig) -> Result<()> {
    let filter = log_filter(&daemon.log_level)?;

    if daemon.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

/// Build the log filter.
///
/// A plain level applies to the chatmix crates on top of `RUST_LOG`; anything
/// else is taken as a full filter directive string.
fn log_filter(log_level: &str) -> Result<EnvFilter> {
    if log_level.parse::<LevelFilter>().is_err() {
        return EnvFilter::try_new(log_level)
            .with_context(|| format!("Invalid log filter: {log_level:?}"));
    }

    let mut filter = EnvFilter::from_default_env();
    for krate in ["chatmix_daemon", "chatmix_core", "chatmix_hid", "chatmix_pipewire"] {
        filter = filter.add_directive(format!("{krate}={log_level}").parse()?);
    }
    Ok(filter)
}
