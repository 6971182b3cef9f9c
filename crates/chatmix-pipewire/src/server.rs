//! Audio server control interface.

use std::future::Future;

use crate::error::PwResult;
use crate::link::LoopbackParams;
use crate::sink::{SinkRecord, VirtualSinkProps};

/// The four audio server operations chat-mix needs.
///
/// Implementations act unconditionally; existence checks belong to
/// [`GraphManager`](crate::GraphManager).
pub trait AudioServer {
    /// List the sinks currently known to the server.
    fn list_sinks(&self) -> impl Future<Output = PwResult<Vec<SinkRecord>>> + Send;

    /// Create a null sink. Returns the module index.
    fn load_null_sink(
        &self,
        props: &VirtualSinkProps,
    ) -> impl Future<Output = PwResult<u32>> + Send;

    /// Create a loopback from a sink's monitor into another sink. Returns
    /// the module index.
    fn load_loopback(&self, params: &LoopbackParams)
    -> impl Future<Output = PwResult<u32>> + Send;

    /// Set a sink's volume in percent.
    fn set_sink_volume(
        &self,
        sink: &str,
        percent: u32,
    ) -> impl Future<Output = PwResult<()>> + Send;
}
