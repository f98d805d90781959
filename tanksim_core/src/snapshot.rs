//! Per-tick telemetry record.
//!
//! One `Snapshot` is built after every simulator step and appended to the
//! historian. The state and input vectors are flattened into named
//! scalars so downstream consumers never index raw vectors.

use serde::{Deserialize, Serialize};

use crate::config::DisturbanceKind;

/// Per-controller view within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    /// Active setpoint [m].
    pub setpoint: f64,
    /// Error `setpoint - level` at the end of the step [m].
    pub error: f64,
    /// Last emitted action (valve position).
    pub output: f64,
}

/// Full state of the simulation at one tick.
///
/// `PartialEq` is derived so replay tests can assert trajectories are
/// reproduced exactly, not approximately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulation time [s].
    pub t: f64,
    /// Liquid level [m].
    pub level: f64,
    /// Inlet volumetric flow [m³/s].
    pub inlet_flow: f64,
    /// Outlet volumetric flow [m³/s].
    pub outlet_flow: f64,
    /// Outlet valve position in [0, 1].
    pub valve_position: f64,
    /// One entry per controller, in declaration order.
    pub controllers: Vec<ControllerSnapshot>,
    /// Active disturbance mode.
    pub inlet_mode: DisturbanceKind,
}

// ─── Tests ──────────────────────────────────────────────────────────
