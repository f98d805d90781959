//! # Tanksim Core
//!
//! Deterministic simulation core for a gravity-drained liquid-storage tank
//! under feedback control. Provides the physics model, a fixed-step RK4
//! integrator, a discrete-time PID controller with anti-windup, the
//! simulator that couples them, and the stochastic inlet disturbance
//! process.
//!
//! Everything in this crate is pure computation: no wall clock, no async,
//! no I/O. The wall-clock loop, command surface, and historian live in
//! `tanksim_engine`.
//!
//! ## Determinism
//!
//! Given identical configuration, seed, and call sequence, every type in
//! this crate produces bit-identical results on the same platform. The
//! disturbance generator owns a seedable RNG so that runs can be replayed
//! exactly.

pub mod config;
pub mod disturbance;
pub mod error;
pub mod model;
pub mod pid;
pub mod prelude;
pub mod simulator;
pub mod snapshot;
pub mod stepper;
