//! # Heka Config
//!
//! Declarative topology construction from TOML: a mapping from
//! plugin-instance name to {plugin-type, configuration, matcher, capacity,
//! queue options}. Validates plugin types, precompiles every matcher, and
//! resolves construction order before any runner starts.

mod builder;
mod error;
mod registry;
mod spec;
mod topology;

pub use builder::{build_topology, CompiledTopology, DestinationHandle};
pub use error::ConfigError;
pub use registry::PluginTypeRegistry;
pub use spec::{CapacityPolicySpec, DestinationConfig, InputConfig, QueueSpec, TopologyConfig};
pub use topology::order_destinations;
