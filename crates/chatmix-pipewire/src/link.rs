//! Loopback link parameters.

use crate::sink::monitor_name;

/// Parameters for a monitor-to-sink loopback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackParams {
    /// Sink whose monitor feeds the loopback
    pub monitor_of: String,
    /// Sink the loopback plays into
    pub sink: String,
}

impl LoopbackParams {
    #[must_use]
    pub fn new(monitor_of: &str, sink: &str) -> Self {
        Self { monitor_of: monitor_of.to_string(), sink: sink.to_string() }
    }

    /// Source the loopback reads from.
    #[must_use]
    pub fn source(&self) -> String {
        monitor_name(&self.monitor_of)
    }

    /// `module-loopback` arguments.
    #[must_use]
    pub fn module_args(&self) -> Vec<String> {
        vec![format!("source={}", self.source()), format!("sink={}", self.sink)]
    }
}
