//! Sink listing records and virtual sink properties.

/// One row of `pactl list short sinks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRecord {
    /// Server object index
    pub index: u32,
    /// Sink name
    pub name: String,
    /// Driver or module that owns the sink
    pub driver: Option<String>,
    /// Sample spec, e.g. `s32le 2ch 48000Hz`
    pub sample_spec: Option<String>,
    /// RUNNING, IDLE or SUSPENDED
    pub state: Option<String>,
}

impl SinkRecord {
    /// Name of the monitor source the server attaches to this sink.
    #[must_use]
    pub fn monitor_name(&self) -> String {
        monitor_name(&self.name)
    }
}

/// Monitor source name for a sink name.
#[must_use]
pub fn monitor_name(sink: &str) -> String {
    format!("{sink}.monitor")
}

/// Parse one row of the short sink listing.
///
/// Rows are tab separated; rows from tools that collapse tabs to spaces are
/// accepted as long as the index and name come first.
#[must_use]
pub fn parse_short_sink(line: &str) -> Option<SinkRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let fields: Vec<&str> = if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };

    let index = fields.first()?.parse().ok()?;
    let name = fields.get(1).filter(|n| !n.is_empty())?.to_string();
    let field = |i: usize| fields.get(i).map(|s| (*s).to_string());

    Some(SinkRecord { index, name, driver: field(2), sample_spec: field(3), state: field(4) })
}

/// Parse the full short sink listing, skipping rows that do not parse.
#[must_use]
pub fn parse_short_sinks(output: &str) -> Vec<SinkRecord> {
    output.lines().filter_map(parse_short_sink).collect()
}

/// Properties for creating a virtual sink node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualSinkProps {
    /// Sink name (e.g., "gamemix")
    pub name: String,
    /// Media class advertised to the session manager
    pub media_class: String,
    /// Channel map (e.g., "front-left,front-right")
    pub channel_map: String,
}

impl VirtualSinkProps {
    /// Create properties for a stereo virtual sink.
    #[must_use]
    pub fn stereo(name: &str) -> Self {
        Self {
            name: name.to_string(),
            media_class: "Audio/Sink".to_string(),
            channel_map: "front-left,front-right".to_string(),
        }
    }

    /// `module-null-sink` arguments for these properties.
    #[must_use]
    pub fn module_args(&self) -> Vec<String> {
        vec![
            format!("media.class={}", self.media_class),
            format!("sink_name={}", self.name),
            format!("channel_map={}", self.channel_map),
        ]
    }
}
