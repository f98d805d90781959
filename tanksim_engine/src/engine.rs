//! The engine loop: one owning task, drift-free cadence, bounded
//! channels in and out.
//!
//! Tick protocol, in order: drain the command queue (non-blocking),
//! update the inlet disturbance, step the simulator, append a snapshot
//! to the historian, publish the snapshot to subscribers. The append
//! happens before the publish, so a subscriber that has seen tick `k`
//! will find it (or a newer tick) in the historian.
//!
//! The loop suspends only in the timed wait between ticks and exits at
//! its next suspension point once shutdown is signalled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info};

use tanksim_core::config::{DisturbanceConfig, PidConfig, SimConfig, TankParams};
use tanksim_core::disturbance::Disturbance;
use tanksim_core::error::{ConfigError, ConfigResult};
use tanksim_core::model::INLET_FLOW_INDEX;
use tanksim_core::pid::PidGains;
use tanksim_core::simulator::Simulator;
use tanksim_core::snapshot::{ControllerSnapshot, Snapshot};

use crate::command::{Command, CommandOutcome, CommandReply, CommandRequest, EngineError};
use crate::historian::{DEFAULT_CAPACITY, Historian};

/// Heartbeat log cadence [ticks].
const HEARTBEAT_INTERVAL_TICKS: u64 = 60;

// ─── Engine Configuration ───────────────────────────────────────────

/// Full engine configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Simulator configuration (plant, step, initial condition,
    /// controllers).
    pub sim: SimConfig,
    /// Inlet disturbance mode at start.
    #[serde(default)]
    pub disturbance: DisturbanceConfig,
    /// Disturbance generator seed; drawn from OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Historian capacity [entries].
    #[serde(default = "default_historian_capacity")]
    pub historian_capacity: usize,
    /// Command queue capacity [entries]; producers beyond it get `busy`.
    #[serde(default = "default_command_queue_capacity")]
    pub command_queue_capacity: usize,
    /// Per-subscriber snapshot buffer [entries]; a subscriber this far
    /// behind starts losing its oldest queued snapshots.
    #[serde(default = "default_subscriber_capacity")]
    pub subscriber_capacity: usize,
}

fn default_historian_capacity() -> usize {
    DEFAULT_CAPACITY
}
fn default_command_queue_capacity() -> usize {
    32
}
fn default_subscriber_capacity() -> usize {
    64
}

impl EngineConfig {
    /// Validate the engine-level knobs. Simulator and disturbance
    /// configs are validated by their own constructors.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("historian_capacity", self.historian_capacity),
            ("command_queue_capacity", self.command_queue_capacity),
            ("subscriber_capacity", self.subscriber_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroCapacity { name });
            }
        }
        Ok(())
    }
}

// ─── Descriptor ─────────────────────────────────────────────────────

/// Read-only engine description served to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineDescriptor {
    /// Tank parameters.
    pub tank: TankParams,
    /// Integration step [s].
    pub dt: f64,
    /// Controller configurations (initial gains and fixed limits).
    pub controllers: Vec<PidConfig>,
    /// Initial state vector.
    pub initial_state: Vec<f64>,
    /// Initial input vector.
    pub initial_inputs: Vec<f64>,
    /// Historian capacity [entries].
    pub historian_capacity: usize,
    /// Historian size at the time of the query [entries].
    pub historian_len: usize,
}

// ─── Tick Statistics ────────────────────────────────────────────────

/// O(1) per-tick computation-time statistics, for the heartbeat log.
#[derive(Debug, Clone)]
pub struct TickStats {
    /// Total ticks executed.
    pub tick_count: u64,
    /// Last tick computation time [ns].
    pub last_tick_ns: u64,
    /// Maximum tick computation time [ns].
    pub max_tick_ns: u64,
    /// Running sum for the average.
    pub sum_tick_ns: u64,
}

impl TickStats {
    /// Zeroed statistics.
    pub const fn new() -> Self {
        Self {
            tick_count: 0,
            last_tick_ns: 0,
            max_tick_ns: 0,
            sum_tick_ns: 0,
        }
    }

    /// Record one tick's computation time.
    #[inline]
    pub fn record(&mut self, elapsed: Duration) {
        let ns = elapsed.as_nanos() as u64;
        self.tick_count += 1;
        self.last_tick_ns = ns;
        if ns > self.max_tick_ns {
            self.max_tick_ns = ns;
        }
        self.sum_tick_ns += ns;
    }

    /// Average tick computation time [ns] (0 before the first tick).
    #[inline]
    pub fn avg_tick_ns(&self) -> u64 {
        if self.tick_count == 0 {
            0
        } else {
            self.sum_tick_ns / self.tick_count
        }
    }
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Engine ─────────────────────────────────────────────────────────

/// The engine: sole owner and writer of the simulator, the disturbance
/// process, and the historian.
///
/// Construct with [`Engine::new`], then either spawn [`Engine::run`] on
/// a runtime or drive [`Engine::tick`] directly (tests do the latter to
/// avoid wall-clock waits).
pub struct Engine {
    sim: Simulator,
    disturbance: Disturbance,
    period: Duration,
    historian: Arc<RwLock<Historian>>,
    commands: mpsc::Receiver<CommandRequest>,
    snapshots: broadcast::Sender<Snapshot>,
    shutdown: watch::Receiver<bool>,
    stats: TickStats,
    commands_closed: bool,
}

impl Engine {
    /// Validate `config`, construct the engine, and hand back the handle
    /// used by every other actor.
    ///
    /// The engine is an ordinary value: a process may construct as many
    /// as it wants (deployments typically host one).
    pub fn new(config: EngineConfig) -> ConfigResult<(Self, EngineHandle)> {
        config.validate()?;
        let sim = Simulator::new(&config.sim)?;
        let disturbance = Disturbance::new(config.disturbance, config.seed)?;

        let historian = Arc::new(RwLock::new(Historian::new(config.historian_capacity)));
        let (command_tx, command_rx) = mpsc::channel(config.command_queue_capacity);
        let (snapshot_tx, _) = broadcast::channel(config.subscriber_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let descriptor = EngineDescriptor {
            tank: config.sim.tank,
            dt: config.sim.dt,
            controllers: config.sim.controllers.clone(),
            initial_state: config.sim.initial_state.clone(),
            initial_inputs: config.sim.initial_inputs.clone(),
            historian_capacity: config.historian_capacity,
            historian_len: 0,
        };

        let engine = Self {
            period: Duration::from_secs_f64(sim.dt()),
            sim,
            disturbance,
            historian: Arc::clone(&historian),
            commands: command_rx,
            snapshots: snapshot_tx.clone(),
            shutdown: shutdown_rx,
            stats: TickStats::new(),
            commands_closed: false,
        };
        let handle = EngineHandle {
            commands: command_tx,
            snapshots: snapshot_tx,
            historian,
            shutdown: Arc::new(shutdown_tx),
            descriptor,
        };
        Ok((engine, handle))
    }

    /// Tick statistics so far.
    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Execute one full tick: commands, disturbance, step, historian,
    /// publish.
    pub fn tick(&mut self) {
        let started = Instant::now();

        self.drain_commands();
        self.apply_disturbance();
        self.sim.step();

        let snapshot = self.build_snapshot();
        self.historian.write().append(snapshot.clone());
        // Publishing after the append guarantees a received snapshot is
        // already queryable. No subscribers is not an error.
        let _ = self.snapshots.send(snapshot);

        self.stats.record(started.elapsed());
        if self.stats.tick_count % HEARTBEAT_INTERVAL_TICKS == 0 {
            info!(
                t = self.sim.time(),
                level = self.sim.level(),
                avg_tick_ns = self.stats.avg_tick_ns(),
                max_tick_ns = self.stats.max_tick_ns,
                "engine heartbeat"
            );
        }
    }

    /// Run the loop at the configured cadence until shutdown.
    ///
    /// Tick boundaries are scheduled from the loop's start time, not
    /// from cumulative sleeps, so the cadence does not drift.
    pub async fn run(mut self) {
        info!(period_s = self.period.as_secs_f64(), "engine loop started");
        let mut shutdown = self.shutdown.clone();
        let mut ticker = tokio::time::interval(self.period);
        // An interval's first tick completes immediately; consume it so
        // the first simulated step lands one period after start.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                    if self.commands_closed {
                        info!("all command producers dropped; engine loop exiting");
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("shutdown signalled; engine loop exiting");
                        break;
                    }
                }
            }
        }
        info!(
            ticks = self.stats.tick_count,
            t = self.sim.time(),
            "engine loop stopped"
        );
    }

    /// Drain every queued command without blocking. Commands are applied
    /// in arrival order, so the last command of a kind within a tick
    /// wins while every command is still observed and answered.
    fn drain_commands(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(CommandRequest { command, reply }) => {
                    debug!(?command, "command observed");
                    let outcome = self.handle_command(command);
                    if let Err(ref err) = outcome {
                        debug!(kind = err.kind(), %err, "command rejected");
                    }
                    // A requester that gave up on the reply is fine.
                    let _ = reply.send(outcome);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.commands_closed = true;
                    break;
                }
            }
        }
    }

    /// Validate and apply one command. The engine state is untouched on
    /// any rejection.
    fn handle_command(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::Setpoint { controller, value } => {
                let max = self.sim.model().params().max_height;
                if !value.is_finite() || value < 0.0 || value > max {
                    return Err(EngineError::Range {
                        name: "setpoint",
                        value,
                        min: 0.0,
                        max,
                    });
                }
                self.sim.set_setpoint(controller as usize, value)?;
                Ok(CommandReply::Ack)
            }
            Command::Pid {
                controller,
                kc,
                tau_i,
                tau_d,
            } => {
                if !kc.is_finite() {
                    return Err(EngineError::Validation(format!(
                        "kc must be finite, got {kc}"
                    )));
                }
                for (name, value) in [("tau_i", tau_i), ("tau_d", tau_d)] {
                    if !value.is_finite() || value < 0.0 {
                        return Err(EngineError::Range {
                            name,
                            value,
                            min: 0.0,
                            max: f64::INFINITY,
                        });
                    }
                }
                self.sim
                    .set_gains(controller as usize, PidGains { kc, tau_i, tau_d })?;
                Ok(CommandReply::Ack)
            }
            Command::InletFlow { value } => {
                if !value.is_finite() || value < 0.0 {
                    return Err(EngineError::Range {
                        name: "inlet_flow",
                        value,
                        min: 0.0,
                        max: f64::INFINITY,
                    });
                }
                self.disturbance.set_mode(DisturbanceConfig::Constant)?;
                self.sim.set_input(INLET_FLOW_INDEX, value)?;
                Ok(CommandReply::Ack)
            }
            Command::InletMode { mode } => {
                self.disturbance.set_mode(mode)?;
                Ok(CommandReply::Ack)
            }
            Command::Reset => {
                self.sim.reset();
                self.disturbance.reset();
                self.historian.write().clear();
                info!("simulation reset; history cleared");
                Ok(CommandReply::Ack)
            }
            Command::History { duration_s } => {
                let historian = self.historian.read();
                let capacity = historian.capacity();
                if duration_s == 0 || duration_s as usize > capacity {
                    return Err(EngineError::Range {
                        name: "duration_s",
                        value: f64::from(duration_s),
                        min: 1.0,
                        max: capacity as f64,
                    });
                }
                Ok(CommandReply::History(historian.range(f64::from(duration_s))))
            }
        }
    }

    /// In Brownian mode, walk the inlet flow one increment and write it
    /// back; in constant mode the last written value holds.
    fn apply_disturbance(&mut self) {
        let current = self.sim.inputs()[INLET_FLOW_INDEX];
        if let Some(next) = self.disturbance.next_inlet_flow(current) {
            if let Err(err) = self.sim.set_input(INLET_FLOW_INDEX, next) {
                // Unreachable with a validated config; never take the
                // loop down over it.
                error!(%err, "failed to write disturbed inlet flow");
            }
        }
    }

    /// Flatten the simulator state into the historian record.
    fn build_snapshot(&self) -> Snapshot {
        let controllers = (0..self.sim.controller_count())
            .map(|i| ControllerSnapshot {
                setpoint: self.sim.setpoint(i).unwrap_or_default(),
                error: self.sim.controller_error(i).unwrap_or_default(),
                output: self.sim.controller_output(i).unwrap_or_default(),
            })
            .collect();
        Snapshot {
            t: self.sim.time(),
            level: self.sim.level(),
            inlet_flow: self.sim.inputs()[INLET_FLOW_INDEX],
            outlet_flow: self.sim.outlet_flow(),
            valve_position: self.sim.inputs()[tanksim_core::model::VALVE_INDEX],
            controllers,
            inlet_mode: self.disturbance.kind(),
        }
    }
}

// ─── Handle ─────────────────────────────────────────────────────────

/// Cloneable handle to a running (or about-to-run) engine: the command
/// sink, both read surfaces, and the subscription point.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<CommandRequest>,
    snapshots: broadcast::Sender<Snapshot>,
    historian: Arc<RwLock<Historian>>,
    shutdown: Arc<watch::Sender<bool>>,
    descriptor: EngineDescriptor,
}

impl EngineHandle {
    /// Queue a command without waiting for the outcome.
    ///
    /// Returns `busy` when the queue is full (retry later) and
    /// `not_ready` when the engine is gone. The returned receiver yields
    /// the outcome once the engine drains the command; a dropped sender
    /// side means the engine shut down first.
    pub fn submit(&self, command: Command) -> Result<oneshot::Receiver<CommandOutcome>, EngineError> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .try_send(CommandRequest { command, reply })
            .map_err(|err| match err {
                TrySendError::Full(_) => EngineError::Busy,
                TrySendError::Closed(_) => EngineError::NotReady,
            })?;
        Ok(outcome)
    }

    /// Queue a command and await its outcome.
    pub async fn request(&self, command: Command) -> CommandOutcome {
        let outcome = self.submit(command)?;
        outcome.await.map_err(|_| EngineError::NotReady)?
    }

    /// Change a controller's setpoint.
    pub async fn set_setpoint(&self, controller: u32, value: f64) -> Result<(), EngineError> {
        self.expect_ack(Command::Setpoint { controller, value }).await
    }

    /// Retune a controller (bumpless: the accumulator is preserved).
    pub async fn set_gains(&self, controller: u32, gains: PidGains) -> Result<(), EngineError> {
        self.expect_ack(Command::Pid {
            controller,
            kc: gains.kc,
            tau_i: gains.tau_i,
            tau_d: gains.tau_d,
        })
        .await
    }

    /// Force a constant inlet flow.
    pub async fn set_inlet_flow(&self, value: f64) -> Result<(), EngineError> {
        self.expect_ack(Command::InletFlow { value }).await
    }

    /// Switch the inlet disturbance mode.
    pub async fn set_inlet_mode(&self, mode: DisturbanceConfig) -> Result<(), EngineError> {
        self.expect_ack(Command::InletMode { mode }).await
    }

    /// Reset the simulation and clear the historian.
    pub async fn reset(&self) -> Result<(), EngineError> {
        self.expect_ack(Command::Reset).await
    }

    /// Request the trailing `duration_s` seconds of history through the
    /// command queue (serialised with reconfiguration).
    pub async fn request_history(&self, duration_s: u32) -> Result<Vec<Snapshot>, EngineError> {
        match self.request(Command::History { duration_s }).await? {
            CommandReply::History(entries) => Ok(entries),
            CommandReply::Ack => Err(EngineError::Internal(
                "history request answered with a bare ack".into(),
            )),
        }
    }

    async fn expect_ack(&self, command: Command) -> Result<(), EngineError> {
        match self.request(command).await? {
            CommandReply::Ack => Ok(()),
            CommandReply::History(_) => Err(EngineError::Internal(
                "command answered with a history payload".into(),
            )),
        }
    }

    /// The most recent snapshot, or `None` before the first tick.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.historian.read().latest().cloned()
    }

    /// Direct read of the historian tail (not serialised with the
    /// command queue; linearised at an append boundary).
    pub fn history(&self, duration_s: f64) -> Vec<Snapshot> {
        self.historian.read().range(duration_s)
    }

    /// Subscribe to the snapshot stream. Every subsequent tick is
    /// delivered in order; falling more than the configured buffer
    /// behind loses the oldest queued snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Read-only configuration descriptor plus the current historian
    /// size.
    pub fn descriptor(&self) -> EngineDescriptor {
        let mut descriptor = self.descriptor.clone();
        descriptor.historian_len = self.historian.read().len();
        descriptor
    }

    /// Signal shutdown; the engine exits at its next suspension point.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
