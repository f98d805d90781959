//! The simulator: plant, integrator, and controllers coupled into one
//! deterministic step function.
//!
//! Each step integrates the state over one `dt` with inputs frozen
//! (zero-order hold), then recomputes every controller from the new
//! measurement and writes its action into the input vector for the next
//! step. Reconfiguration therefore never affects the step in flight;
//! changes are observed from the following step on.

use tracing::warn;

use crate::config::SimConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{LEVEL_INDEX, TankModel};
use crate::pid::{Pid, PidGains};
use crate::stepper::Rk4Stepper;

/// Immutable wiring of one controller into the state/input vectors.
#[derive(Debug, Clone, Copy)]
struct ControllerChannel {
    measured_index: usize,
    output_index: usize,
}

/// Construction-time values restored by [`Simulator::reset`].
#[derive(Debug, Clone)]
struct InitialValues {
    x: Vec<f64>,
    u: Vec<f64>,
    setpoints: Vec<f64>,
}

/// Deterministic single-tank simulator.
pub struct Simulator {
    model: TankModel,
    stepper: Rk4Stepper,
    controllers: Vec<Pid>,
    channels: Vec<ControllerChannel>,
    dt: f64,
    t: f64,
    x: Vec<f64>,
    u: Vec<f64>,
    setpoints: Vec<f64>,
    prev_errors: Vec<f64>,
    last_outputs: Vec<f64>,
    initial: InitialValues,
}

impl Simulator {
    /// Validate `config` and construct. Checks run in a fixed order so
    /// the first failure reported is deterministic: dimensions, `dt`,
    /// then each controller's wiring, limits, and tuning.
    pub fn new(config: &SimConfig) -> ConfigResult<Self> {
        let model = TankModel::new(config.tank)?;

        if config.initial_state.len() != model.state_dim() {
            return Err(ConfigError::DimensionMismatch {
                what: "initial_state",
                got: config.initial_state.len(),
                expected: model.state_dim(),
            });
        }
        if config.initial_inputs.len() != model.input_dim() {
            return Err(ConfigError::DimensionMismatch {
                what: "initial_inputs",
                got: config.initial_inputs.len(),
                expected: model.input_dim(),
            });
        }
        if !config.dt.is_finite()
            || config.dt < crate::config::DT_MIN
            || config.dt > crate::config::DT_MAX
        {
            return Err(ConfigError::InvalidDt {
                dt: config.dt,
                min: crate::config::DT_MIN,
                max: crate::config::DT_MAX,
            });
        }
        for (i, c) in config.controllers.iter().enumerate() {
            c.validate(i, model.state_dim(), model.input_dim(), config.tank.max_height)?;
        }

        let h0 = config.initial_state[LEVEL_INDEX];
        if !h0.is_finite() || h0 < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "initial level",
                value: h0,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        let q0 = config.initial_inputs[crate::model::INLET_FLOW_INDEX];
        if !q0.is_finite() || q0 < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "initial inlet flow",
                value: q0,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        let v0 = config.initial_inputs[crate::model::VALVE_INDEX];
        if !v0.is_finite() || !(0.0..=1.0).contains(&v0) {
            return Err(ConfigError::OutOfRange {
                name: "initial valve position",
                value: v0,
                min: 0.0,
                max: 1.0,
            });
        }

        let controllers: Vec<Pid> = config.controllers.iter().map(Pid::new).collect();
        let channels: Vec<ControllerChannel> = config
            .controllers
            .iter()
            .map(|c| ControllerChannel {
                measured_index: c.measured_index,
                output_index: c.output_index,
            })
            .collect();
        let setpoints: Vec<f64> = config
            .controllers
            .iter()
            .map(|c| c.initial_setpoint)
            .collect();
        let last_outputs: Vec<f64> = channels
            .iter()
            .map(|ch| config.initial_inputs[ch.output_index])
            .collect();

        let initial = InitialValues {
            x: config.initial_state.clone(),
            u: config.initial_inputs.clone(),
            setpoints: setpoints.clone(),
        };

        Ok(Self {
            stepper: Rk4Stepper::new(model.state_dim()),
            model,
            controllers,
            channels,
            dt: config.dt,
            t: 0.0,
            x: config.initial_state.clone(),
            u: config.initial_inputs.clone(),
            setpoints,
            prev_errors: vec![0.0; config.controllers.len()],
            last_outputs,
            initial,
        })
    }

    /// Execute one tick: integrate, advance the clock, then run every
    /// controller against the new measurement.
    pub fn step(&mut self) {
        let model = &self.model;
        self.stepper
            .step(self.t, self.dt, &mut self.x, &self.u, |_t, x, u, dxdt| {
                model.derivative(x, u, dxdt)
            });

        // The combined step can land slightly below empty while draining;
        // the level itself is defined on [0, inf).
        if self.x[LEVEL_INDEX] < 0.0 {
            warn!(
                level = self.x[LEVEL_INDEX],
                t = self.t,
                "level integrated below zero; clamping to empty tank"
            );
            self.x[LEVEL_INDEX] = 0.0;
        }

        self.t += self.dt;

        for i in 0..self.controllers.len() {
            let ch = self.channels[i];
            let measurement = self.x[ch.measured_index];
            let error = self.setpoints[i] - measurement;
            let error_rate = (error - self.prev_errors[i]) / self.dt;
            let action = self.controllers[i].compute(error, error_rate, self.dt);
            self.u[ch.output_index] = action;
            self.prev_errors[i] = error;
            self.last_outputs[i] = action;
        }
    }

    /// Change controller `i`'s setpoint. Takes effect on the next step;
    /// does not touch the integral accumulator.
    pub fn set_setpoint(&mut self, i: usize, value: f64) -> ConfigResult<()> {
        let n = self.setpoints.len();
        if i >= n {
            return Err(ConfigError::IndexOutOfRange {
                controller: i,
                what: "controller",
                index: i,
                len: n,
            });
        }
        self.setpoints[i] = value;
        Ok(())
    }

    /// Override input component `j` (exogenous drivers such as inlet
    /// flow). Takes effect on the next step.
    pub fn set_input(&mut self, j: usize, value: f64) -> ConfigResult<()> {
        let n = self.u.len();
        if j >= n {
            return Err(ConfigError::IndexOutOfRange {
                controller: 0,
                what: "input",
                index: j,
                len: n,
            });
        }
        self.u[j] = value;
        Ok(())
    }

    /// Retune controller `i`, preserving its integral accumulator.
    pub fn set_gains(&mut self, i: usize, gains: PidGains) -> ConfigResult<()> {
        gains.validate()?;
        let n = self.controllers.len();
        match self.controllers.get_mut(i) {
            Some(pid) => {
                pid.set_gains(gains);
                Ok(())
            }
            None => Err(ConfigError::IndexOutOfRange {
                controller: i,
                what: "controller",
                index: i,
                len: n,
            }),
        }
    }

    /// Restore clock, state, inputs, setpoints, accumulators, and error
    /// history to their construction-time values. Gains and limits are
    /// preserved.
    pub fn reset(&mut self) {
        self.t = 0.0;
        self.x.copy_from_slice(&self.initial.x);
        self.u.copy_from_slice(&self.initial.u);
        self.setpoints.copy_from_slice(&self.initial.setpoints);
        for e in &mut self.prev_errors {
            *e = 0.0;
        }
        for (out, ch) in self.last_outputs.iter_mut().zip(&self.channels) {
            *out = self.initial.u[ch.output_index];
        }
        for pid in &mut self.controllers {
            pid.reset();
        }
    }

    // ── Read accessors ──────────────────────────────────────────────

    /// Simulation clock [s].
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Integration step [s].
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// State vector.
    pub fn state(&self) -> &[f64] {
        &self.x
    }

    /// Input vector.
    pub fn inputs(&self) -> &[f64] {
        &self.u
    }

    /// The plant model.
    pub fn model(&self) -> &TankModel {
        &self.model
    }

    /// Liquid level [m].
    pub fn level(&self) -> f64 {
        self.x[LEVEL_INDEX]
    }

    /// Current outlet flow [m³/s], from the algebraic valve relation.
    pub fn outlet_flow(&self) -> f64 {
        self.model.outlet_flow(&self.x, &self.u)
    }

    /// Number of configured controllers.
    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Setpoint of controller `i`.
    pub fn setpoint(&self, i: usize) -> Option<f64> {
        self.setpoints.get(i).copied()
    }

    /// Error of controller `i` at the end of the last step.
    pub fn controller_error(&self, i: usize) -> Option<f64> {
        self.prev_errors.get(i).copied()
    }

    /// Last action emitted by controller `i`.
    pub fn controller_output(&self, i: usize) -> Option<f64> {
        self.last_outputs.get(i).copied()
    }

    /// Integral accumulator of controller `i`.
    pub fn controller_integral(&self, i: usize) -> Option<f64> {
        self.controllers.get(i).map(Pid::integral)
    }

    /// Current tuning of controller `i`.
    pub fn controller_gains(&self, i: usize) -> Option<PidGains> {
        self.controllers.get(i).map(Pid::gains)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
