//! Prelude module for common re-exports.
//!
//! Consumers can `use tanksim_core::prelude::*;` and get the types a
//! typical simulation host needs without listing individual paths.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    DisturbanceConfig, DisturbanceKind, PidConfig, SimConfig, TankParams,
};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{ConfigError, ConfigResult};

// ─── Simulation ─────────────────────────────────────────────────────
pub use crate::disturbance::Disturbance;
pub use crate::model::{INLET_FLOW_INDEX, LEVEL_INDEX, TankModel, VALVE_INDEX};
pub use crate::pid::{Pid, PidGains};
pub use crate::simulator::Simulator;
pub use crate::snapshot::{ControllerSnapshot, Snapshot};
pub use crate::stepper::Rk4Stepper;
