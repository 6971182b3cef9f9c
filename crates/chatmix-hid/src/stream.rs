//! Raw report capture through `usbhid-dump`.

use std::process::Stdio;
use std::time::Duration;

use chatmix_core::{DeviceAddress, MixState};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, trace, warn};

use crate::error::{HidError, HidResult};
use crate::report::decode_line;

/// Something that can start a report capture for a device.
pub trait ReportSource {
    /// Line source the decoded stream reads from.
    type Reader: AsyncBufRead + Unpin;

    /// Start capturing reports from `address`.
    ///
    /// # Errors
    /// Returns an error if the capture cannot be started.
    fn open(
        &self,
        address: DeviceAddress,
        marker: u8,
        read_timeout: Option<Duration>,
    ) -> HidResult<MixStream<Self::Reader>>;
}

/// Launches `usbhid-dump` for a device.
#[derive(Debug, Clone)]
pub struct HidCapture {
    program: String,
}

impl Default for HidCapture {
    fn default() -> Self {
        Self { program: "usbhid-dump".to_string() }
    }
}

impl HidCapture {
    /// Use a different `usbhid-dump` binary.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl ReportSource for HidCapture {
    type Reader = BufReader<ChildStdout>;

    /// Start streaming interrupt reports from `address`.
    ///
    /// The capture runs with no timeout of its own and is killed when the
    /// returned stream is dropped. Must be called from within a Tokio
    /// runtime.
    fn open(
        &self,
        address: DeviceAddress,
        marker: u8,
        read_timeout: Option<Duration>,
    ) -> HidResult<MixStream<Self::Reader>> {
        let selector = address.to_string();
        let mut child = Command::new(&self.program)
            .args(["-s", selector.as_str(), "-f", "-e", "stream", "-t", "0"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => HidError::PermissionDenied,
                _ => HidError::CaptureFailed(format!("{}: {e}", self.program)),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HidError::CaptureFailed("capture stdout not piped".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        info!(device = %selector, pid = ?child.id(), "Report capture started");

        let mut stream = MixStream::new(BufReader::new(stdout), marker, read_timeout);
        stream.child = Some(child);
        Ok(stream)
    }
}

/// Longest diagnostic kept before it is logged without waiting for a newline.
const MAX_DIAGNOSTIC_LEN: usize = 4096;

/// Log capture diagnostics.
async fn forward_stderr(stderr: ChildStderr) {
    for_each_diagnostic(BufReader::new(stderr), |line| debug!(line, "usbhid-dump")).await;
}

/// Split capture stderr into messages.
///
/// `-f` prints one dot per transfer and never a newline while the capture is
/// healthy, so dots between messages are dropped as they arrive and only
/// message text is buffered.
async fn for_each_diagnostic<R: AsyncBufRead + Unpin>(
    mut reader: R,
    mut emit: impl FnMut(&str),
) {
    let mut line = Vec::new();
    loop {
        let chunk = match reader.fill_buf().await {
            Ok(chunk) => chunk,
            Err(e) => {
                trace!(error = %e, "Capture stderr closed");
                break;
            }
        };
        if chunk.is_empty() {
            break;
        }

        let len = chunk.len();
        for &byte in chunk {
            match byte {
                b'.' if line.is_empty() => {}
                b'\n' => flush_diagnostic(&mut line, &mut emit),
                _ => {
                    line.push(byte);
                    if line.len() >= MAX_DIAGNOSTIC_LEN {
                        flush_diagnostic(&mut line, &mut emit);
                    }
                }
            }
        }
        reader.consume(len);
    }
    flush_diagnostic(&mut line, &mut emit);
}

fn flush_diagnostic(line: &mut Vec<u8>, emit: &mut impl FnMut(&str)) {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if !text.is_empty() {
        emit(text);
    }
    line.clear();
}

/// Lazy sequence of mix states decoded from a capture.
///
/// The sequence ends when the capture output ends and cannot be restarted;
/// open a new capture instead.
pub struct MixStream<R> {
    reader: R,
    marker: u8,
    read_timeout: Option<Duration>,
    child: Option<Child>,
    finished: bool,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> MixStream<R> {
    /// Decode reports from any line source.
    pub fn new(reader: R, marker: u8, read_timeout: Option<Duration>) -> Self {
        Self { reader, marker, read_timeout, child: None, finished: false, buf: Vec::new() }
    }

    /// Wait for the next decoded state.
    ///
    /// Lines that are not mixer reports are skipped. Returns `Ok(None)`
    /// once the capture has ended.
    ///
    /// # Errors
    /// Returns [`HidError::ReadTimeout`] if a read timeout is configured and
    /// no line arrives in time, or an IO error from the capture pipe. Either
    /// ends the sequence.
    pub async fn next_state(&mut self) -> HidResult<Option<MixState>> {
        while !self.finished {
            self.buf.clear();
            let read = match self.read_timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.reader.read_until(b'\n', &mut self.buf))
                        .await
                    {
                        Ok(read) => read,
                        Err(_) => {
                            self.finish().await;
                            return Err(HidError::ReadTimeout(limit));
                        }
                    }
                }
                None => self.reader.read_until(b'\n', &mut self.buf).await,
            };

            match read {
                Ok(0) => self.finish().await,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&self.buf);
                    match decode_line(&line, self.marker) {
                        Ok(state) => {
                            trace!(%state, "Mixer report decoded");
                            return Ok(Some(state));
                        }
                        Err(reason) => trace!(%reason, "Skipping capture line"),
                    }
                }
                Err(e) => {
                    self.finish().await;
                    return Err(e.into());
                }
            }
        }

        Ok(None)
    }

    /// Whether the sequence has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    async fn finish(&mut self) {
        self.finished = true;

        let Some(mut child) = self.child.take() else {
            debug!("Report source ended");
            return;
        };

        // Still running after a timeout or pipe error
        if let Err(e) = child.start_kill() {
            trace!(error = %e, "Capture already exited");
        }

        match child.wait().await {
            Ok(status) if status.success() => info!(%status, "Report capture exited"),
            Ok(status) => warn!(%status, "Report capture exited (device removed or access lost?)"),
            Err(e) => warn!(error = %e, "Failed to reap report capture"),
        }
    }
}
