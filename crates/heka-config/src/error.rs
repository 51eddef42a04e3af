use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("matcher compile failure in {plugin}: {source}")]
    InvalidMatcher {
        plugin: String,
        #[source]
        source: heka_matcher::MatchError,
    },

    #[error("unresolvable plugin type {plugin_type:?} for instance {instance}")]
    UnresolvablePluginType { instance: String, plugin_type: String },

    #[error("circular dependency among plugin instances: {0}")]
    CircularDependency(String),

    #[error("duplicate plugin instance name: {0}")]
    DuplicateName(String),

    #[error("durable queue setup failed: {0}")]
    Queue(#[from] heka_queue::QueueError),
}
