//! # Tanksim Engine
//!
//! Wall-clock host for the deterministic simulation core. One dedicated
//! task owns the simulator and drives it at a fixed cadence (nominally
//! 1 Hz); every other actor talks to it through bounded channels or the
//! historian's read interface.
//!
//! Each tick the loop drains the command queue, applies the inlet
//! disturbance, steps the simulator, appends a snapshot to the bounded
//! historian, and broadcasts the snapshot to subscribers. Slow
//! subscribers lose their oldest queued snapshots, never blocking the
//! loop or their peers.

pub mod command;
pub mod engine;
pub mod historian;

pub use command::{Command, CommandReply, EngineError};
pub use engine::{Engine, EngineConfig, EngineDescriptor, EngineHandle};
pub use historian::Historian;
