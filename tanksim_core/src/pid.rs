//! Discrete-time positional PID with bias, output saturation, and
//! conditional-integration anti-windup.
//!
//! `tau_i = 0` disables the integral term; `tau_d = 0` disables the
//! derivative term. `kc` carries the control direction: this plant is
//! reverse-acting (level below setpoint must close the outlet valve), so
//! a correctly tuned level controller has `kc < 0`.

use serde::{Deserialize, Serialize};

use crate::config::PidConfig;
use crate::error::{ConfigError, ConfigResult};

/// Tuning gains, replaceable at runtime via [`Pid::set_gains`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain (sign-carrying).
    pub kc: f64,
    /// Integral time constant [s]; 0 disables the integral term.
    pub tau_i: f64,
    /// Derivative time constant [s]; 0 disables the derivative term.
    pub tau_d: f64,
}

impl PidGains {
    /// Validate: `kc` finite, time constants finite and non-negative.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.kc.is_finite() {
            return Err(ConfigError::NonFiniteParameter {
                name: "kc",
                value: self.kc,
            });
        }
        for (name, value) in [("tau_i", self.tau_i), ("tau_d", self.tau_d)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeParameter { name, value });
            }
        }
        Ok(())
    }
}

/// One PID controller: tuning, fixed output shape, and the integral
/// accumulator.
///
/// The accumulator survives [`Pid::set_gains`] (bumpless transfer) and is
/// zeroed only by [`Pid::reset`].
#[derive(Debug, Clone)]
pub struct Pid {
    gains: PidGains,
    bias: f64,
    u_min: f64,
    u_max: f64,
    i_max: f64,
    integral: f64,
}

impl Pid {
    /// Build from a validated config.
    pub fn new(config: &PidConfig) -> Self {
        Self {
            gains: config.gains(),
            bias: config.bias,
            u_min: config.u_min,
            u_max: config.u_max,
            i_max: config.i_max,
            integral: 0.0,
        }
    }

    /// Compute one action from the current error and its rate of change.
    ///
    /// The raw action is `bias + Kc*e + (Kc/tau_i)*I + Kc*tau_d*de`,
    /// saturated to `[u_min, u_max]`. The accumulator only integrates
    /// when the raw action was not saturated, and is clamped to
    /// `|I| <= i_max` after every update.
    pub fn compute(&mut self, error: f64, error_rate: f64, dt: f64) -> f64 {
        let p_term = self.gains.kc * error;
        let i_term = if self.gains.tau_i > 0.0 {
            (self.gains.kc / self.gains.tau_i) * self.integral
        } else {
            0.0
        };
        let d_term = self.gains.kc * self.gains.tau_d * error_rate;

        let raw = self.bias + p_term + i_term + d_term;
        let action = raw.clamp(self.u_min, self.u_max);

        // clamp() returns its input untouched when in range, so this
        // equality is exact: the accumulator freezes while saturated.
        if self.gains.tau_i > 0.0 && action == raw {
            self.integral = (self.integral + error * dt).clamp(-self.i_max, self.i_max);
        }

        action
    }

    /// Replace the tuning without touching the accumulator.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    /// Current tuning.
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Zero the integral accumulator.
    pub fn reset(&mut self) {
        self.integral = 0.0;
    }

    /// Integral accumulator, exposed for observability.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Output saturation limits `(u_min, u_max)`.
    pub fn output_limits(&self) -> (f64, f64) {
        (self.u_min, self.u_max)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
