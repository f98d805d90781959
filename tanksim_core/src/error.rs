//! Construction-error taxonomy.
//!
//! Every variant is fatal to startup: a simulator or engine refuses to
//! construct from a config that trips any of these. Runtime command
//! rejection uses the engine's error envelope instead.

use thiserror::Error;

/// Errors raised while validating a simulation configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// State or input vector length does not match the model.
    #[error("dimension mismatch: {what} has length {got}, model expects {expected}")]
    DimensionMismatch {
        /// Which vector is wrong ("initial_state" or "initial_inputs").
        what: &'static str,
        /// Configured length.
        got: usize,
        /// Length the model requires.
        expected: usize,
    },

    /// A parameter that must be finite and strictly positive is not.
    #[error("{name} must be finite and positive, got {value}")]
    NonPositiveParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A parameter that must be finite and non-negative is not.
    #[error("{name} must be finite and non-negative, got {value}")]
    NegativeParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A parameter that must be finite is not.
    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Integration step outside the supported range.
    #[error("dt {dt} out of range ({min}, {max}]")]
    InvalidDt {
        /// Configured step [s].
        dt: f64,
        /// Exclusive lower bound [s].
        min: f64,
        /// Inclusive upper bound [s].
        max: f64,
    },

    /// A controller's index into the state or input vector is out of range.
    #[error("controller {controller}: {what} {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Controller position in the config list.
        controller: usize,
        /// Which index field ("measured_index" or "output_index").
        what: &'static str,
        /// Configured index.
        index: usize,
        /// Vector length it must index into.
        len: usize,
    },

    /// Output limits do not form a valid interval.
    #[error("controller {controller}: output limits [{min}, {max}] require min < max")]
    InvalidOutputLimits {
        /// Controller position in the config list.
        controller: usize,
        /// Configured lower limit.
        min: f64,
        /// Configured upper limit.
        max: f64,
    },

    /// Disturbance bounds do not form a valid interval.
    #[error("disturbance bounds [{min}, {max}] require 0 <= min < max, both finite")]
    InvalidDisturbanceBounds {
        /// Configured lower bound [m³/s].
        min: f64,
        /// Configured upper bound [m³/s].
        max: f64,
    },

    /// An initial or configured value lies outside its permitted range.
    #[error("{name} {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Value name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A capacity that must be at least 1 is zero.
    #[error("{name} must be at least 1")]
    ZeroCapacity {
        /// Capacity name.
        name: &'static str,
    },
}

/// Result alias for construction-time validation.
pub type ConfigResult<T> = Result<T, ConfigError>;
