//! Concrete plugin implementations bundled with the daemon purely as
//! examples of the host contracts; production plugin types are external
//! collaborators registered through [`heka_config::PluginTypeRegistry`].

mod stdout_output;

pub use stdout_output::StdoutOutput;
