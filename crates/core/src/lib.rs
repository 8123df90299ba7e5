//! Clocked co-simulation library.
//!
//! This crate drives an externally supplied synchronous digital design
//! against pluggable peripheral models, one clock edge at a time:
//! 1. **Design:** The `Design` trait and `PinSet`: named pins with
//!    width-masked accessors and an `advance()` settling operation.
//! 2. **Bus:** Tri-state values and single-point arbitration; two drivers
//!    on one bus in the same half-cycle abort the run.
//! 3. **Peripherals:** An SDR-SDRAM controller model (command decode,
//!    per-bank rows, CAS-latency pipeline, mmap-backed array) and a VGA
//!    decoder (sync-edge framing, geometry inference, frame emission).
//! 4. **Loop:** The `Simulator` half-cycle stepper with completion-pin,
//!    stop-flag, and cycle-budget termination.
//! 5. **Support:** Construction-time JSON configuration and run statistics.

/// Common building blocks (bus values, errors).
pub mod common;
/// Harness configuration (defaults, enums, hierarchical structures).
pub mod config;
/// The design handle: named pins and the `Design` trait.
pub mod design;
/// Peripheral models (SDRAM controller, VGA decoder).
pub mod periph;
/// The simulation loop.
pub mod sim;
/// Run statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or load JSON.
pub use crate::config::Config;
/// Fatal error taxonomy.
pub use crate::common::error::SimError;
/// The design trait every simulated design implements.
pub use crate::design::Design;
/// The top-level simulation loop; construct with `Simulator::new`.
pub use crate::sim::Simulator;
