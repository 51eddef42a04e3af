//! # hekad
//!
//! The daemon entry point: loads a TOML topology, constructs the pack pool
//! and router, spawns one task per input and destination, and drives them
//! until shutdown.
//!
//! ```bash
//! hekad --config topology.toml
//! RUST_LOG=debug hekad --config topology.toml
//! ```

mod plugins;

use anyhow::{Context, Result};
use clap::Parser;
use heka_config::{build_topology, PluginTypeRegistry};
use heka_decoder::PassthroughDecoder;
use heka_runner::{supervise, DestinationRunner, InputRunner, RestartPolicy, RunnerState, StreamContext};
use heka_splitter::{SplitOptions, TokenSplitter};
use plugins::StdoutOutput;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for the Heka daemon.
#[derive(Parser, Debug)]
#[command(name = "hekad")]
#[command(about = "Heka data-processing daemon")]
struct Args {
    /// Path to the TOML topology configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Output plugin tick interval, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    tick_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let toml_src = std::fs::read_to_string(&args.config)
        .with_context(|| format!("reading config file {}", args.config.display()))?;

    // Only "stdin" (input) and "stdout" (output) are recognized by this
    // binary; every other concrete transport plugin is registered by
    // whatever embeds the config and runner crates, not by hekad itself.
    let input_types = PluginTypeRegistry::new().register("stdin");
    let filter_types = PluginTypeRegistry::new();
    let output_types = PluginTypeRegistry::new().register("stdout");

    let topology = build_topology(&toml_src, &input_types, &filter_types, &output_types)
        .await
        .context("compiling topology")?;

    tracing::info!(pipeline = %topology.pipeline_name, "topology loaded, starting runners");

    let tick_interval = Duration::from_millis(args.tick_interval_ms);
    let mut handles = Vec::new();

    for dest in topology.destinations {
        match dest.plugin_type.as_str() {
            "stdout" => {
                let runner = DestinationRunner::new(dest.name.clone(), tick_interval);
                let mut plugin = StdoutOutput::new(dest.name.clone());
                let handle = tokio::spawn(async move {
                    if let Err(err) = runner.run(&mut plugin, dest.inbox, None).await {
                        tracing::error!(destination = %dest.name, %err, "destination runner exited");
                    }
                });
                handles.push(handle);
            }
            other => anyhow::bail!("unhandled output plugin type: {other}"),
        }
    }

    let router = topology.router;
    let pack_pool = topology.pack_pool;

    for (name, input) in topology.input_order {
        match input.plugin_type.as_str() {
            "stdin" => {
                let router = router.clone();
                let pool = pack_pool.clone();
                let use_message_bytes = input.use_message_bytes;
                let handle = tokio::spawn(async move {
                    let state = RunnerState::default();
                    let result = supervise(&name, &state, RestartPolicy::default(), || {
                        let router = router.clone();
                        let pool = pool.clone();
                        let name = name.clone();
                        async move {
                            let mut ctx = StreamContext::new(
                                TokenSplitter::newline(SplitOptions::default()),
                                PassthroughDecoder::new(format!("{name}.line"), name.clone()),
                                use_message_bytes,
                            );
                            let runner = InputRunner::new(name.clone());
                            runner
                                .run_stream(&mut ctx, tokio::io::stdin(), &pool, &router, None)
                                .await
                        }
                    })
                    .await;
                    if let Err(report) = result {
                        tracing::error!(input = %report.plugin_name, reason = %report.reason, "input halted permanently");
                    }
                });
                handles.push(handle);
            }
            other => anyhow::bail!("unhandled input plugin type: {other}"),
        }
    }

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("received Ctrl-C, draining in-flight packs");
            tokio::select! {
                _ = signal::ctrl_c() => {
                    tracing::warn!("second Ctrl-C, aborting all runners");
                    for handle in &handles {
                        handle.abort();
                    }
                }
                _ = drain_handles(&mut handles) => {}
            }
        }
        _ = drain_handles(&mut handles) => {}
    }

    Ok(())
}

async fn drain_handles(handles: &mut Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles.drain(..) {
        let _ = handle.await;
    }
}
