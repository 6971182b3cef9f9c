//! Audio graph management.

use tracing::{debug, info, warn};

use crate::error::PwResult;
use crate::link::LoopbackParams;
use crate::server::AudioServer;
use crate::sink::{SinkRecord, VirtualSinkProps};

/// Idempotent sink, loopback and volume operations.
///
/// Nothing is cached: every operation reads the sink listing right before
/// acting, so sinks added or removed by other clients are picked up. An
/// operation whose sink is missing does nothing and reports `Ok(false)`.
pub struct GraphManager<S> {
    server: S,
}

impl<S: AudioServer> GraphManager<S> {
    /// Create a graph manager on top of an audio server.
    #[must_use]
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Get the underlying server.
    #[must_use]
    pub fn server(&self) -> &S {
        &self.server
    }

    /// Read the current sink listing.
    ///
    /// # Errors
    /// Returns an error if the server cannot be queried.
    pub async fn sinks(&self) -> PwResult<Vec<SinkRecord>> {
        self.server.list_sinks().await
    }

    /// Check whether a sink with exactly this name exists.
    ///
    /// # Errors
    /// Returns an error if the server cannot be queried.
    pub async fn sink_exists(&self, name: &str) -> PwResult<bool> {
        Ok(has_sink(&self.sinks().await?, name))
    }

    /// Create a stereo null sink unless one with this name exists.
    ///
    /// Returns `true` if a sink was created.
    ///
    /// # Errors
    /// Returns an error if the server cannot be queried or creation fails.
    pub async fn ensure_sink(&self, name: &str) -> PwResult<bool> {
        if self.sink_exists(name).await? {
            debug!(sink = name, "Sink already exists");
            return Ok(false);
        }

        let module = self.server.load_null_sink(&VirtualSinkProps::stereo(name)).await?;
        info!(sink = name, module, "Virtual sink created");
        Ok(true)
    }

    /// Loop `monitor_of`'s monitor into `into` if both sinks exist.
    ///
    /// Returns `true` if a loopback was created. Calling this twice creates
    /// two loopbacks; the mixer only links once per run.
    ///
    /// # Errors
    /// Returns an error if the server cannot be queried or creation fails.
    pub async fn link(&self, monitor_of: &str, into: &str) -> PwResult<bool> {
        let sinks = self.sinks().await?;
        for name in [monitor_of, into] {
            if !has_sink(&sinks, name) {
                warn!(sink = name, monitor_of, into, "Sink missing, not linking");
                return Ok(false);
            }
        }

        let params = LoopbackParams::new(monitor_of, into);
        let module = self.server.load_loopback(&params).await?;
        info!(source = %params.source(), sink = into, module, "Loopback created");
        Ok(true)
    }

    /// Set a sink's volume if the sink exists.
    ///
    /// Returns `true` if the volume was applied.
    ///
    /// # Errors
    /// Returns an error if the server cannot be queried or the volume
    /// change fails.
    pub async fn set_volume(&self, name: &str, percent: u32) -> PwResult<bool> {
        if !self.sink_exists(name).await? {
            debug!(sink = name, percent, "Sink missing, volume not applied");
            return Ok(false);
        }

        self.server.set_sink_volume(name, percent).await?;
        debug!(sink = name, percent, "Volume applied");
        Ok(true)
    }
}

fn has_sink(sinks: &[SinkRecord], name: &str) -> bool {
    sinks.iter().any(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryServer, ServerCall};

    const HEADSET: &str = "alsa_output.usb-SteelSeries_Arctis_Nova_7-00.analog-stereo";

    #[tokio::test]
    async fn test_ensure_sink_creates_once() {
        let server = MemoryServer::new();
        let graph = GraphManager::new(server.clone());

        assert!(graph.ensure_sink("gamemix").await.unwrap());
        assert!(!graph.ensure_sink("gamemix").await.unwrap());

        assert_eq!(server.calls(), vec![ServerCall::LoadNullSink { name: "gamemix".into() }]);
    }

    #[tokio::test]
    async fn test_ensure_existing_sink_is_noop() {
        let server = MemoryServer::with_sinks(&[HEADSET, "chatmix"]);
        let graph = GraphManager::new(server.clone());

        assert!(!graph.ensure_sink("chatmix").await.unwrap());
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn test_existence_is_exact_name_match() {
        let server = MemoryServer::with_sinks(&["chatmix-old", "my-gamemix"]);
        let graph = GraphManager::new(server.clone());

        assert!(!graph.sink_exists("chatmix").await.unwrap());
        assert!(graph.ensure_sink("chatmix").await.unwrap());
        assert!(graph.ensure_sink("gamemix").await.unwrap());
        assert_eq!(server.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_link_when_both_sinks_exist() {
        let server = MemoryServer::with_sinks(&[HEADSET, "chatmix"]);
        let graph = GraphManager::new(server.clone());

        assert!(graph.link("chatmix", HEADSET).await.unwrap());
        assert_eq!(
            server.calls(),
            vec![ServerCall::LoadLoopback { source: "chatmix.monitor".into(), sink: HEADSET.into() }]
        );
    }

    #[tokio::test]
    async fn test_link_missing_sink_is_noop() {
        let server = MemoryServer::with_sinks(&["chatmix"]);
        let graph = GraphManager::new(server.clone());

        assert!(!graph.link("chatmix", HEADSET).await.unwrap());
        assert!(!graph.link("gamemix", "chatmix").await.unwrap());
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn test_set_volume_on_existing_sink() {
        let server = MemoryServer::with_sinks(&["gamemix"]);
        let graph = GraphManager::new(server.clone());

        assert!(graph.set_volume("gamemix", 50).await.unwrap());
        assert_eq!(server.volume("gamemix"), Some(50));
    }

    #[tokio::test]
    async fn test_set_volume_missing_sink_is_noop() {
        let server = MemoryServer::new();
        let graph = GraphManager::new(server.clone());

        assert!(!graph.set_volume("gamemix", 50).await.unwrap());
        assert!(server.calls().is_empty());
        assert_eq!(server.volume("gamemix"), None);
    }

    #[tokio::test]
    async fn test_every_operation_reads_listing_fresh() {
        let server = MemoryServer::with_sinks(&["gamemix"]);
        let graph = GraphManager::new(server.clone());

        assert!(graph.set_volume("gamemix", 10).await.unwrap());
        server.remove_sink("gamemix");
        assert!(!graph.set_volume("gamemix", 20).await.unwrap());
        server.add_sink("gamemix");
        assert!(graph.set_volume("gamemix", 30).await.unwrap());

        assert_eq!(server.list_count(), 3);
        assert_eq!(server.volume("gamemix"), Some(30));
    }
}
