//! The mixer loop.
//!
//! Locates the headset, makes sure both virtual sinks exist and feed the
//! headset output, then applies every decoded knob report to the sinks.

use std::sync::Arc;
use std::time::Duration;

use chatmix_core::{DeviceAddress, MixState, MixerConfig, MixerPhase, SinkRole};
use chatmix_hid::{DeviceLocator, HidError, MixStream, ReportSource, UsbEnumerator};
use chatmix_pipewire::{AudioServer, GraphManager, PwError};
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tracing::{debug, error, info, warn};

/// Errors that stop the mixer loop.
#[derive(Debug, Error)]
pub enum MixerError {
    #[error("Headset not found: {0}")]
    DeviceNotFound(String),

    #[error(transparent)]
    Hid(#[from] HidError),

    #[error("Audio graph setup failed: {0}")]
    Setup(#[from] PwError),

    #[error(transparent)]
    Phase(#[from] chatmix_core::Error),
}

/// Counters reported when the loop finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Mixer reports decoded
    pub reports: u64,
    /// Volume changes that reached an existing sink
    pub volumes_applied: u64,
    /// Successful reconnects
    pub reconnects: u32,
}

/// Why a capture stopped producing states.
#[derive(Debug)]
enum StreamEnd {
    Exited,
    TimedOut(Duration),
    Failed(HidError),
}

/// Orchestrates the locator, the report source and the graph manager.
pub struct MixerLoop<S, R> {
    config: MixerConfig,
    locator: DeviceLocator,
    enumerator: Arc<dyn UsbEnumerator>,
    graph: GraphManager<S>,
    source: R,
    phase: MixerPhase,
    summary: RunSummary,
}

impl<S: AudioServer, R: ReportSource> MixerLoop<S, R> {
    pub fn new(
        config: MixerConfig,
        enumerator: Arc<dyn UsbEnumerator>,
        server: S,
        source: R,
    ) -> Self {
        let locator = DeviceLocator::new(config.device_name.clone(), config.usb_id);
        Self {
            config,
            locator,
            enumerator,
            graph: GraphManager::new(server),
            source,
            phase: MixerPhase::Init,
            summary: RunSummary::default(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> MixerPhase {
        self.phase
    }

    /// Run until the report stream ends for good.
    ///
    /// Sinks and loopbacks are left in place when the loop returns.
    pub async fn run(&mut self) -> Result<RunSummary, MixerError> {
        let mut address = self.locate().await?;

        self.phase.transition(MixerPhase::Linked)?;
        self.setup().await?;

        let mut stream =
            self.source.open(address, self.config.report_marker, self.config.read_timeout)?;
        // Consecutive reconnect attempts that did not produce a report
        let mut failures = 0u32;
        loop {
            self.phase.transition(MixerPhase::Streaming)?;

            let reports_before = self.summary.reports;
            match self.stream(&mut stream).await {
                StreamEnd::Exited => info!("Report stream ended"),
                StreamEnd::TimedOut(limit) => {
                    warn!(?limit, "No reports received, giving up on stream");
                }
                StreamEnd::Failed(e) => warn!(error = %e, "Report stream failed"),
            }

            if !self.config.reconnect {
                break;
            }

            if self.summary.reports > reports_before {
                failures = 0;
            } else {
                failures += 1;
                debug!(failures, "Capture ended without a mixer report");
            }

            self.phase.transition(MixerPhase::Reconnecting)?;
            match self.reconnect(&mut failures).await {
                Some((new_address, new_stream)) => {
                    address = new_address;
                    stream = new_stream;
                    self.summary.reconnects += 1;
                    info!(%address, "Reconnected to headset");
                }
                None => break,
            }
        }

        self.phase.transition(MixerPhase::Terminated)?;
        info!(
            reports = self.summary.reports,
            volumes_applied = self.summary.volumes_applied,
            reconnects = self.summary.reconnects,
            "Mixer loop terminated"
        );
        Ok(self.summary)
    }

    /// Run the locator off the async threads; enumeration blocks.
    async fn locate(&self) -> Result<DeviceAddress, MixerError> {
        let locator = self.locator.clone();
        let enumerator = Arc::clone(&self.enumerator);
        let located = tokio::task::spawn_blocking(move || locator.locate(enumerator.as_ref()))
            .await
            .map_err(|e| HidError::EnumerationFailed(format!("enumeration task failed: {e}")))?;

        match located {
            Ok(found) => Ok(found.address),
            Err(HidError::DeviceNotFound(name)) => Err(MixerError::DeviceNotFound(name)),
            Err(e) => Err(e.into()),
        }
    }

    /// Ensure both sinks, then loop both monitors into the headset.
    async fn setup(&self) -> Result<(), MixerError> {
        for role in SinkRole::ALL {
            self.graph.ensure_sink(self.config.sink_name(role)).await?;
        }

        for role in SinkRole::ALL {
            let sink = self.config.sink_name(role);
            if !self.graph.link(sink, &self.config.headset_sink).await? {
                warn!(%role, sink, headset = %self.config.headset_sink, "Sink not linked to headset");
            }
        }

        Ok(())
    }

    async fn stream<B: AsyncBufRead + Unpin>(&mut self, stream: &mut MixStream<B>) -> StreamEnd {
        loop {
            match stream.next_state().await {
                Ok(Some(state)) => self.apply(state).await,
                Ok(None) => return StreamEnd::Exited,
                Err(HidError::ReadTimeout(limit)) => return StreamEnd::TimedOut(limit),
                Err(e) => return StreamEnd::Failed(e),
            }
        }
    }

    /// Apply one state: game first, then chat.
    async fn apply(&mut self, state: MixState) {
        self.summary.reports += 1;
        debug!(%state, "Applying mix");

        for role in SinkRole::ALL {
            let sink = self.config.sink_name(role);
            let percent = self.config.volume_policy.apply(state.volume_for(role));
            match self.graph.set_volume(sink, percent).await {
                Ok(true) => self.summary.volumes_applied += 1,
                Ok(false) => {}
                Err(e) => error!(%role, sink, error = %e, "Failed to set volume"),
            }
        }
    }

    /// Find the headset again and reopen the capture.
    ///
    /// `failures` counts consecutive attempts without a report, including
    /// captures that ended before producing one. The caller resets it once
    /// a reopened capture yields a state.
    async fn reconnect(
        &self,
        failures: &mut u32,
    ) -> Option<(DeviceAddress, MixStream<R::Reader>)> {
        loop {
            if self.config.max_reconnect_attempts.is_some_and(|max| *failures >= max) {
                warn!(failures = *failures, "Giving up on reconnecting");
                return None;
            }

            tokio::time::sleep(self.config.reconnect_delay).await;

            let address = match self.locate().await {
                Ok(address) => address,
                Err(e) => {
                    *failures += 1;
                    debug!(failures = *failures, error = %e, "Headset not back yet");
                    continue;
                }
            };

            match self.source.open(address, self.config.report_marker, self.config.read_timeout) {
                Ok(stream) => return Some((address, stream)),
                Err(e) => {
                    *failures += 1;
                    warn!(failures = *failures, %address, error = %e, "Failed to reopen capture");
                }
            }
        }
    }
}
