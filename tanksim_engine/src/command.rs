//! Command sink types and the runtime error envelope.
//!
//! Commands are a tagged union, validated exhaustively by the engine when
//! it drains its queue; there is no string-keyed dispatch anywhere.
//! Rejections carry a machine-readable kind plus a short human-readable
//! message, and never surface source paths or backtraces.

use thiserror::Error;
use tokio::sync::oneshot;

use serde::{Deserialize, Serialize};
use tanksim_core::config::DisturbanceConfig;
use tanksim_core::error::ConfigError;
use tanksim_core::snapshot::Snapshot;

/// Reconfiguration and query commands accepted by the engine loop.
///
/// Commands submitted before a tick begins are observed by that tick;
/// commands submitted during a tick are observed by the next one. All
/// take effect on the step after the one in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Change a controller's setpoint [m].
    Setpoint {
        /// Controller index (0 for the single-controller configuration).
        #[serde(default)]
        controller: u32,
        /// New setpoint, within `[0, max_height]`.
        value: f64,
    },
    /// Retune a controller, preserving its integral accumulator.
    Pid {
        /// Controller index.
        #[serde(default)]
        controller: u32,
        /// Proportional gain (sign-carrying; reverse-acting loops use
        /// `kc < 0`).
        kc: f64,
        /// Integral time constant [s], non-negative.
        tau_i: f64,
        /// Derivative time constant [s], non-negative.
        tau_d: f64,
    },
    /// Force the inlet to a fixed flow [m³/s]; switches the disturbance
    /// mode to constant.
    InletFlow {
        /// New inlet flow, non-negative.
        value: f64,
    },
    /// Switch the inlet disturbance mode.
    InletMode {
        /// New mode, structurally validated before it takes effect.
        mode: DisturbanceConfig,
    },
    /// Restore the construction-time state and clear the historian.
    Reset,
    /// Request the trailing `duration_s` seconds of history, answered
    /// out-of-band on the reply channel.
    History {
        /// Window length [s], between 1 and the historian capacity.
        duration_s: u32,
    },
}

/// Successful command outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    /// Command applied (or queued for the next step boundary).
    Ack,
    /// Reply to [`Command::History`].
    History(Vec<Snapshot>),
}

/// Outcome delivered on a command's reply channel.
pub type CommandOutcome = Result<CommandReply, EngineError>;

/// One queued command plus its reply channel.
///
/// The engine answers every request exactly once; a dropped receiver is
/// silently ignored. A dropped *sender* (engine shut down before the
/// command was drained) reads as cancellation on the requester side.
#[derive(Debug)]
pub struct CommandRequest {
    /// The command to apply.
    pub command: Command,
    /// Where the outcome goes.
    pub reply: oneshot::Sender<CommandOutcome>,
}

/// Runtime error envelope.
///
/// Every variant maps to a machine-readable kind via
/// [`EngineError::kind`]; the `Display` form is the human-readable
/// message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Structurally invalid command payload.
    #[error("{0}")]
    Validation(String),

    /// A value outside its permitted range.
    #[error("{name} {value} out of range [{min}, {max}]")]
    Range {
        /// Field name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// Command queue at capacity; retry later.
    #[error("command queue full")]
    Busy,

    /// The engine is not running or shut down before replying.
    #[error("engine is not running")]
    NotReady,

    /// Unexpected internal failure.
    #[error("internal engine error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Range { .. } => "range",
            Self::Busy => "busy",
            Self::NotReady => "not_ready",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::Validation(err.to_string())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
