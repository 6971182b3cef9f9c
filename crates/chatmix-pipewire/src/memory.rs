//! In-process audio server.
//!
//! Keeps a sink table in memory and records every mutating call. The daemon
//! uses it for `--dry-run`; tests use it to assert on side effects.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::error::PwResult;
use crate::link::LoopbackParams;
use crate::server::AudioServer;
use crate::sink::{SinkRecord, VirtualSinkProps};

/// A mutating call received by [`MemoryServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCall {
    LoadNullSink { name: String },
    LoadLoopback { source: String, sink: String },
    SetSinkVolume { sink: String, percent: u32 },
}

#[derive(Debug, Default)]
struct Inner {
    sinks: Vec<SinkRecord>,
    volumes: HashMap<String, u32>,
    calls: Vec<ServerCall>,
    list_count: usize,
    next_index: u32,
}

/// Shared handle to an in-memory sink table.
#[derive(Debug, Clone, Default)]
pub struct MemoryServer {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryServer {
    /// Create an empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a server that already has sinks with these names.
    #[must_use]
    pub fn with_sinks(names: &[&str]) -> Self {
        let server = Self::new();
        for name in names {
            server.add_sink(name);
        }
        server
    }

    /// Add a sink without recording a call, as if another client made it.
    pub fn add_sink(&self, name: &str) {
        let mut inner = self.inner.lock();
        inner.next_index += 1;
        let index = inner.next_index;
        inner.sinks.push(SinkRecord {
            index,
            name: name.to_string(),
            driver: Some("memory".to_string()),
            sample_spec: Some("float32le 2ch 48000Hz".to_string()),
            state: Some("IDLE".to_string()),
        });
    }

    /// Drop a sink, as if it were unloaded externally.
    pub fn remove_sink(&self, name: &str) {
        self.inner.lock().sinks.retain(|s| s.name != name);
    }

    /// All mutating calls so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<ServerCall> {
        self.inner.lock().calls.clone()
    }

    /// How many times the sink listing was read.
    #[must_use]
    pub fn list_count(&self) -> usize {
        self.inner.lock().list_count
    }

    /// Last volume applied to a sink.
    #[must_use]
    pub fn volume(&self, sink: &str) -> Option<u32> {
        self.inner.lock().volumes.get(sink).copied()
    }
}

impl AudioServer for MemoryServer {
    async fn list_sinks(&self) -> PwResult<Vec<SinkRecord>> {
        let mut inner = self.inner.lock();
        inner.list_count += 1;
        Ok(inner.sinks.clone())
    }

    async fn load_null_sink(&self, props: &VirtualSinkProps) -> PwResult<u32> {
        info!(name = %props.name, "[dry-run] load-module module-null-sink");
        self.add_sink(&props.name);

        let mut inner = self.inner.lock();
        inner.calls.push(ServerCall::LoadNullSink { name: props.name.clone() });
        Ok(inner.next_index)
    }

    async fn load_loopback(&self, params: &LoopbackParams) -> PwResult<u32> {
        info!(source = %params.source(), sink = %params.sink, "[dry-run] load-module module-loopback");

        let mut inner = self.inner.lock();
        inner.next_index += 1;
        inner
            .calls
            .push(ServerCall::LoadLoopback { source: params.source(), sink: params.sink.clone() });
        Ok(inner.next_index)
    }

    async fn set_sink_volume(&self, sink: &str, percent: u32) -> PwResult<()> {
        info!(sink, percent, "[dry-run] set-sink-volume");

        let mut inner = self.inner.lock();
        inner.volumes.insert(sink.to_string(), percent);
        inner.calls.push(ServerCall::SetSinkVolume { sink: sink.to_string(), percent });
        Ok(())
    }
}
