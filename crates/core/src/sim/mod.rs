//! The simulation loop.
//!
//! Owns the design handle and the peripheral models and steps them in strict
//! half-cycle sequence: clock flip → settle → sample → model update →
//! bus arbitration → drive-back. Single-threaded and synchronous; nothing
//! suspends mid-step.

/// Top-level simulator and run control.
pub mod simulator;

pub use self::simulator::{BusBinding, ExitReason, RunSummary, Simulator};
