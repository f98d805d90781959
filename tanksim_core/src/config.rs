//! Configuration types for the simulation core.
//!
//! All config types use `serde::Deserialize` for TOML loading. Numeric
//! parameters carry const bounds and are checked by `validate()` methods
//! returning a typed [`ConfigError`]. Optional fields use
//! `#[serde(default)]` so config files only state what they change.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::pid::PidGains;

/// Smallest accepted integration step [s].
pub const DT_MIN: f64 = 1e-3;
/// Largest accepted integration step [s].
pub const DT_MAX: f64 = 3600.0;
/// Default integration step [s] (1 Hz control period).
pub const DT_DEFAULT: f64 = 1.0;

// ─── Tank Parameters ────────────────────────────────────────────────

/// Physical parameters of the tank. Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankParams {
    /// Cross-sectional area [m²].
    pub area: f64,
    /// Discharge coefficient [m^2.5/s]; scales the sqrt-law outlet flow.
    pub discharge_coeff: f64,
    /// Maximum liquid height [m]; upper bound for setpoints.
    pub max_height: f64,
}

impl TankParams {
    /// Validate that all parameters are finite and strictly positive.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("area", self.area),
            ("discharge_coeff", self.discharge_coeff),
            ("max_height", self.max_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveParameter { name, value });
            }
        }
        Ok(())
    }
}

// ─── Controller Configuration ───────────────────────────────────────

/// Per-controller configuration: wiring (immutable) plus initial tuning.
///
/// `kc` carries its sign: this tank drains through the controlled valve,
/// so regulating level requires a reverse-acting controller (`kc < 0`,
/// level below setpoint closes the valve). The sign is part of the
/// contract and is never hidden behind an absolute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    /// Proportional gain (sign-carrying).
    pub kc: f64,
    /// Integral time constant [s]; 0 disables the integral term.
    #[serde(default)]
    pub tau_i: f64,
    /// Derivative time constant [s]; 0 disables the derivative term.
    #[serde(default)]
    pub tau_d: f64,
    /// Static bias added to the action.
    #[serde(default)]
    pub bias: f64,
    /// Lower output limit.
    pub u_min: f64,
    /// Upper output limit.
    pub u_max: f64,
    /// Integral accumulator clamp magnitude.
    #[serde(default = "default_i_max")]
    pub i_max: f64,
    /// Index into the state vector read as the process variable.
    #[serde(default)]
    pub measured_index: usize,
    /// Index into the input vector that receives the action.
    #[serde(default = "default_output_index")]
    pub output_index: usize,
    /// Setpoint at construction time.
    pub initial_setpoint: f64,
}

fn default_i_max() -> f64 {
    f64::MAX
}
fn default_output_index() -> usize {
    crate::model::VALVE_INDEX
}

impl PidConfig {
    /// Tuning gains as a value type, for `set_gains`-style hand-off.
    pub fn gains(&self) -> PidGains {
        PidGains {
            kc: self.kc,
            tau_i: self.tau_i,
            tau_d: self.tau_d,
        }
    }

    /// Validate wiring and tuning for controller `index` against the model
    /// dimensions and the tank ceiling.
    pub fn validate(
        &self,
        index: usize,
        state_dim: usize,
        input_dim: usize,
        max_height: f64,
    ) -> ConfigResult<()> {
        if self.measured_index >= state_dim {
            return Err(ConfigError::IndexOutOfRange {
                controller: index,
                what: "measured_index",
                index: self.measured_index,
                len: state_dim,
            });
        }
        if self.output_index >= input_dim {
            return Err(ConfigError::IndexOutOfRange {
                controller: index,
                what: "output_index",
                index: self.output_index,
                len: input_dim,
            });
        }
        if !self.u_min.is_finite() || !self.u_max.is_finite() || self.u_min >= self.u_max {
            return Err(ConfigError::InvalidOutputLimits {
                controller: index,
                min: self.u_min,
                max: self.u_max,
            });
        }
        self.gains().validate()?;
        if !self.bias.is_finite() {
            return Err(ConfigError::NonFiniteParameter {
                name: "bias",
                value: self.bias,
            });
        }
        if !self.i_max.is_finite() || self.i_max < 0.0 {
            return Err(ConfigError::NegativeParameter {
                name: "i_max",
                value: self.i_max,
            });
        }
        if !self.initial_setpoint.is_finite()
            || self.initial_setpoint < 0.0
            || self.initial_setpoint > max_height
        {
            return Err(ConfigError::OutOfRange {
                name: "initial_setpoint",
                value: self.initial_setpoint,
                min: 0.0,
                max: max_height,
            });
        }
        Ok(())
    }
}

// ─── Disturbance Configuration ──────────────────────────────────────

/// Inlet-flow disturbance mode.
///
/// `Constant` holds the inlet at whatever was last written. `Brownian`
/// applies an `N(0, sigma)` increment per tick, hard-clipped to
/// `[min, max]`; `sigma` is the standard deviation of the per-tick
/// increment, not of the stationary distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DisturbanceConfig {
    /// No disturbance; inlet flow only changes by explicit command.
    Constant,
    /// Bounded Brownian walk on the inlet flow.
    Brownian {
        /// Lower clip bound [m³/s].
        min: f64,
        /// Upper clip bound [m³/s].
        max: f64,
        /// Per-tick increment standard deviation [m³/s].
        sigma: f64,
    },
}

impl Default for DisturbanceConfig {
    fn default() -> Self {
        Self::Constant
    }
}

/// Discriminant of [`DisturbanceConfig`], reported in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisturbanceKind {
    Constant,
    Brownian,
}

impl std::fmt::Display for DisturbanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant => f.write_str("constant"),
            Self::Brownian => f.write_str("brownian"),
        }
    }
}

impl DisturbanceConfig {
    /// The mode label without parameters.
    pub fn kind(&self) -> DisturbanceKind {
        match self {
            Self::Constant => DisturbanceKind::Constant,
            Self::Brownian { .. } => DisturbanceKind::Brownian,
        }
    }

    /// Structural validation: finite bounds with `0 <= min < max`,
    /// finite non-negative `sigma`.
    pub fn validate(&self) -> ConfigResult<()> {
        match *self {
            Self::Constant => Ok(()),
            Self::Brownian { min, max, sigma } => {
                if !min.is_finite() || !max.is_finite() || min < 0.0 || min >= max {
                    return Err(ConfigError::InvalidDisturbanceBounds { min, max });
                }
                if !sigma.is_finite() || sigma < 0.0 {
                    return Err(ConfigError::NegativeParameter {
                        name: "sigma",
                        value: sigma,
                    });
                }
                Ok(())
            }
        }
    }
}

// ─── Simulator Configuration ────────────────────────────────────────

/// Full simulator configuration: plant, step size, initial condition,
/// and controllers. Immutable once the simulator is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Tank parameters.
    pub tank: TankParams,
    /// Integration step [s].
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Initial state vector `[h]`.
    #[serde(default = "default_initial_state")]
    pub initial_state: Vec<f64>,
    /// Initial input vector `[q_in, v]`.
    #[serde(default = "default_initial_inputs")]
    pub initial_inputs: Vec<f64>,
    /// Controllers, applied in declaration order each step.
    #[serde(default)]
    pub controllers: Vec<PidConfig>,
}

fn default_dt() -> f64 {
    DT_DEFAULT
}
fn default_initial_state() -> Vec<f64> {
    vec![0.0]
}
fn default_initial_inputs() -> Vec<f64> {
    vec![0.0, 0.0]
}

// ─── Tests ──────────────────────────────────────────────────────────
