//! Declarative topology schema: a mapping from plugin-instance name to
//! `{plugin-type, configuration, matcher, capacity, queue options}`.

use heka_queue::{CapacityPolicy, QueueConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyConfig {
    pub pipeline_name: String,

    #[serde(default = "default_pack_pool_size")]
    pub pack_pool_size: usize,

    #[serde(default)]
    pub inputs: HashMap<String, InputConfig>,

    #[serde(default)]
    pub filters: HashMap<String, DestinationConfig>,

    #[serde(default)]
    pub outputs: HashMap<String, DestinationConfig>,
}

fn default_pack_pool_size() -> usize {
    1000
}

/// An input instance. Inputs have no matcher (they produce messages, they
/// don't subscribe to them) and no `depends_on` — the config loader always
/// constructs them last — they drive the system once everything
/// downstream is ready.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub plugin_type: String,

    #[serde(default)]
    pub settings: Option<toml::Value>,

    #[serde(default = "default_use_message_bytes")]
    pub use_message_bytes: bool,
}

fn default_use_message_bytes() -> bool {
    false
}

/// A filter or output instance: both are router destinations with a matcher,
/// an inbox, and optional durable-queue backing.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    pub plugin_type: String,

    #[serde(default)]
    pub settings: Option<toml::Value>,

    /// Matcher DSL expression. `"TRUE"` subscribes to everything.
    pub matcher: String,

    #[serde(default = "default_capacity")]
    pub capacity: usize,

    #[serde(default)]
    pub queue: Option<QueueSpec>,

    /// Other destination instance names that must be constructed before this
    /// one. Most destinations have none; present for plugins whose init
    /// reaches for another plugin's already-running state.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

fn default_capacity() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSpec {
    pub dir: PathBuf,

    #[serde(default = "default_max_segment_bytes")]
    pub max_segment_bytes: u64,

    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,

    #[serde(default)]
    pub capacity_policy: CapacityPolicySpec,
}

fn default_max_segment_bytes() -> u64 {
    16 * 1024 * 1024
}

fn default_max_total_bytes() -> u64 {
    256 * 1024 * 1024
}

impl QueueSpec {
    pub fn to_queue_config(&self) -> QueueConfig {
        QueueConfig {
            dir: self.dir.clone(),
            max_segment_bytes: self.max_segment_bytes,
            max_total_bytes: self.max_total_bytes,
            capacity_policy: self.capacity_policy.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicySpec {
    #[default]
    Backpressure,
    DropOldest,
}

impl From<CapacityPolicySpec> for CapacityPolicy {
    fn from(spec: CapacityPolicySpec) -> Self {
        match spec {
            CapacityPolicySpec::Backpressure => CapacityPolicy::Backpressure,
            CapacityPolicySpec::DropOldest => CapacityPolicy::DropOldest,
        }
    }
}
