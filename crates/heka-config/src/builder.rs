//! Builds a running topology from a parsed [`TopologyConfig`]:
//! validate plugin types, compile every matcher, resolve dependency order,
//! then wire inboxes and the router. Nothing is started here — constructing
//! the topology is a pure validation-and-wiring step; driving inputs and
//! destinations through their run loops is the embedding binary's job.

use crate::error::ConfigError;
use crate::registry::PluginTypeRegistry;
use crate::spec::{DestinationConfig, TopologyConfig};
use crate::topology::order_destinations;
use heka_core::pack::PackPool;
use heka_matcher::Specification;
use heka_queue::DurableQueue;
use heka_router::{Router, Sink, Subscription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// A destination's inbox, handed to the embedding binary so it can drive a
/// [`heka_runner::DestinationRunner`] against the plugin instance it
/// constructs for `plugin_type`.
pub struct DestinationHandle {
    pub name: String,
    pub plugin_type: String,
    pub settings: Option<toml::Value>,
    pub inbox: mpsc::Receiver<heka_core::pack::PackRef>,
    pub queue: Option<Arc<DurableQueue>>,
}

/// A fully validated, wired topology: a router ready to fan packs out, a
/// pack pool sized from config, and one inbox per destination still waiting
/// to be claimed by its runner.
pub struct CompiledTopology {
    pub pipeline_name: String,
    pub pack_pool: PackPool,
    pub router: Arc<Router>,
    pub destinations: Vec<DestinationHandle>,
    /// Input instance names in construction order (constructed
    /// last, order among themselves is otherwise unconstrained).
    pub input_order: Vec<(String, crate::spec::InputConfig)>,
}

fn parse(toml_src: &str) -> Result<TopologyConfig, ConfigError> {
    Ok(toml::from_str(toml_src)?)
}

fn check_unique_names(config: &TopologyConfig) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::new();
    for name in config
        .inputs
        .keys()
        .chain(config.filters.keys())
        .chain(config.outputs.keys())
    {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicateName(name.clone()));
        }
    }
    Ok(())
}

fn validate_plugin_types(
    config: &TopologyConfig,
    input_types: &PluginTypeRegistry,
    filter_types: &PluginTypeRegistry,
    output_types: &PluginTypeRegistry,
) -> Result<(), ConfigError> {
    for (name, input) in &config.inputs {
        if !input_types.contains(&input.plugin_type) {
            return Err(ConfigError::UnresolvablePluginType {
                instance: name.clone(),
                plugin_type: input.plugin_type.clone(),
            });
        }
    }
    for (name, filter) in &config.filters {
        if !filter_types.contains(&filter.plugin_type) {
            return Err(ConfigError::UnresolvablePluginType {
                instance: name.clone(),
                plugin_type: filter.plugin_type.clone(),
            });
        }
    }
    for (name, output) in &config.outputs {
        if !output_types.contains(&output.plugin_type) {
            return Err(ConfigError::UnresolvablePluginType {
                instance: name.clone(),
                plugin_type: output.plugin_type.clone(),
            });
        }
    }
    Ok(())
}

fn compile_matcher(name: &str, dest: &DestinationConfig) -> Result<Specification, ConfigError> {
    Specification::compile(&dest.matcher).map_err(|source| ConfigError::InvalidMatcher {
        plugin: name.to_string(),
        source,
    })
}

/// Parse, validate, and wire a topology from TOML source. No plugin is
/// started; the caller drives each destination/input using the returned
/// handles once it has constructed the actual plugin instances for each
/// `plugin_type`.
pub async fn build_topology(
    toml_src: &str,
    input_types: &PluginTypeRegistry,
    filter_types: &PluginTypeRegistry,
    output_types: &PluginTypeRegistry,
) -> Result<CompiledTopology, ConfigError> {
    let config = parse(toml_src)?;
    check_unique_names(&config)?;
    validate_plugin_types(&config, input_types, filter_types, output_types)?;

    let mut combined: HashMap<String, DestinationConfig> = config.filters.clone();
    combined.extend(config.outputs.clone());
    let order = order_destinations(&combined)?;

    // Matchers compile before anything is constructed ("compiles
    // all matchers before any plugin is started").
    let mut matchers = HashMap::with_capacity(combined.len());
    for name in &order {
        let dest = &combined[name];
        matchers.insert(name.clone(), compile_matcher(name, dest)?);
    }

    let mut subscriptions = Vec::with_capacity(order.len());
    let mut destinations = Vec::with_capacity(order.len());

    for name in &order {
        let dest = combined[name].clone();
        let (tx, rx) = mpsc::channel(dest.capacity);

        let queue = match &dest.queue {
            Some(queue_spec) => {
                let queue = DurableQueue::open(queue_spec.to_queue_config()).await?;
                Some(Arc::new(queue))
            }
            None => None,
        };

        let sink = match &queue {
            Some(queue) => Sink::Queued {
                inbox: tx,
                queue: Arc::clone(queue),
            },
            None => Sink::Inbox(tx),
        };

        let matcher = matchers.remove(name).expect("compiled above");
        subscriptions.push(Subscription::new(name.clone(), matcher, sink));
        destinations.push(DestinationHandle {
            name: name.clone(),
            plugin_type: dest.plugin_type,
            settings: dest.settings,
            inbox: rx,
            queue,
        });
    }

    let router = Arc::new(Router::new(subscriptions));
    let pack_pool = PackPool::new(config.pack_pool_size);
    let input_order = config.inputs.into_iter().collect();

    info!(
        pipeline = %config.pipeline_name,
        destinations = destinations.len(),
        "topology compiled"
    );

    Ok(CompiledTopology {
        pipeline_name: config.pipeline_name,
        pack_pool,
        router,
        destinations,
        input_order,
    })
}
