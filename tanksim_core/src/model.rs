//! Gravity-drained tank model.
//!
//! Stateless physics: level rises with inlet flow and falls through a
//! valve obeying the sqrt law `q_out = k_v * v * sqrt(h)`. The sqrt makes
//! the plant non-linear, so controller tuning is exercised non-trivially.

use crate::config::TankParams;
use crate::error::ConfigResult;

/// Index of the liquid level in the state vector.
pub const LEVEL_INDEX: usize = 0;
/// Index of the inlet volumetric flow in the input vector.
pub const INLET_FLOW_INDEX: usize = 0;
/// Index of the outlet valve position in the input vector.
pub const VALVE_INDEX: usize = 1;

/// Single-tank model with one state (`h`) and two inputs (`q_in`, `v`).
#[derive(Debug, Clone, Copy)]
pub struct TankModel {
    params: TankParams,
}

impl TankModel {
    /// Construct a model from validated parameters.
    pub fn new(params: TankParams) -> ConfigResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Number of state components.
    pub fn state_dim(&self) -> usize {
        1
    }

    /// Number of input components.
    pub fn input_dim(&self) -> usize {
        2
    }

    /// Physical parameters.
    pub fn params(&self) -> &TankParams {
        &self.params
    }

    /// Outlet flow [m³/s] from the sqrt law.
    ///
    /// Zero whenever the tank is empty (`h <= 0`, which the integrator may
    /// transiently produce between sub-stages) or the valve is closed.
    pub fn outlet_flow(&self, x: &[f64], u: &[f64]) -> f64 {
        let h = x[LEVEL_INDEX];
        let v = u[VALVE_INDEX];
        if h <= 0.0 || v <= 0.0 {
            return 0.0;
        }
        self.params.discharge_coeff * v * h.sqrt()
    }

    /// State derivative: `dh/dt = (q_in - q_out) / area`, written into
    /// `dxdt`. Finite for any `h >= 0` and `v` in `[0, 1]`.
    pub fn derivative(&self, x: &[f64], u: &[f64], dxdt: &mut [f64]) {
        let q_in = u[INLET_FLOW_INDEX];
        let q_out = self.outlet_flow(x, u);
        dxdt[LEVEL_INDEX] = (q_in - q_out) / self.params.area;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
