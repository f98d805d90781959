//! # tanksim
//!
//! Hosts one simulation engine from a TOML config until Ctrl-C.
//! Transport bindings (HTTP/WebSocket) attach through [`EngineHandle`];
//! this binary wires up logging, a demonstration trend subscriber, and
//! graceful shutdown.

use std::path::PathBuf;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tanksim_engine::engine::{Engine, EngineConfig, EngineHandle};

/// Real-time single-tank process simulator.
#[derive(Debug, Parser)]
#[command(name = "tanksim", version)]
struct Args {
    /// Path to the engine configuration TOML.
    #[arg(long, default_value = "tanksim.toml")]
    config: PathBuf,

    /// Override the disturbance seed from the config file.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    info!(config = %args.config.display(), "starting tanksim");

    let raw = std::fs::read_to_string(&args.config)?;
    let mut config: EngineConfig = toml::from_str(&raw)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let (engine, handle) = Engine::new(config)?;
    let descriptor = handle.descriptor();
    info!(
        area = descriptor.tank.area,
        discharge_coeff = descriptor.tank.discharge_coeff,
        max_height = descriptor.tank.max_height,
        dt = descriptor.dt,
        controllers = descriptor.controllers.len(),
        historian_capacity = descriptor.historian_capacity,
        "engine configured"
    );

    let engine_task = tokio::spawn(engine.run());
    let trend_task = tokio::spawn(log_trend(handle.clone()));

    match signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl-C; shutting down"),
        Err(err) => error!(%err, "unable to listen for shutdown signal"),
    }

    handle.shutdown();
    engine_task.await?;
    trend_task.abort();

    if let Some(last) = handle.snapshot() {
        info!(
            t = last.t,
            level = last.level,
            history_len = handle.descriptor().historian_len,
            "final state"
        );
    }
    info!("tanksim shutdown complete");
    Ok(())
}

/// Demonstration subscriber: logs one trend line every ten snapshots.
async fn log_trend(handle: EngineHandle) {
    let mut stream = handle.subscribe();
    loop {
        match stream.recv().await {
            Ok(snapshot) => {
                if snapshot.t as u64 % 10 == 0 {
                    info!(
                        t = snapshot.t,
                        level = snapshot.level,
                        inlet = snapshot.inlet_flow,
                        outlet = snapshot.outlet_flow,
                        valve = snapshot.valve_position,
                        mode = %snapshot.inlet_mode,
                        "trend"
                    );
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                info!(skipped, "trend subscriber lagged; continuing");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
