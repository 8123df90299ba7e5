//! Peripheral model trait and implementations.
//!
//! A peripheral is a model of an external chip wired to the design's pins.
//! Each half-cycle, after the design has settled, the loop hands every
//! peripheral the full pin state; the peripheral samples what it is wired
//! to, detects its own clock edges, and records any value it wants to drive
//! back over a bidirectional bus. Drive requests are arbitrated by the loop,
//! never applied directly.

/// SDR-SDRAM controller model.
pub mod sdram;

/// VGA signal decoder model.
pub mod video;

use crate::common::bus::BusState;
use crate::common::error::SimError;
use crate::design::{PinId, PinSet};

/// A request to drive a design input pin through a bus binding.
#[derive(Debug, Clone, Copy)]
pub struct PinDrive {
    /// The design input pin the value is destined for.
    pub pin: PinId,
    /// Driven level, or `HighZ` when the peripheral releases the bus.
    pub state: BusState,
}

/// Trait for peripheral models attached to the design's pins.
///
/// Implementations sample the settled pin state once per half-cycle and keep
/// all protocol state internal. Recoverable protocol violations are logged
/// and counted, not returned; an `Err` from [`eval`](Self::eval) is fatal
/// and aborts the run.
pub trait Peripheral {
    /// Returns a short name for this peripheral (e.g. `"SDRAM"`).
    fn name(&self) -> &str;

    /// Samples the settled pin state for one half-cycle and updates internal
    /// state. `edge` is the number of half-cycles elapsed since reset.
    fn eval(&mut self, edge: u64, pins: &PinSet) -> Result<(), SimError>;

    /// Appends this peripheral's current bus drive requests.
    ///
    /// Called after every [`eval`](Self::eval); the default drives nothing.
    fn drives(&self, out: &mut Vec<PinDrive>) {
        let _ = out;
    }

    /// Returns a mutable reference as `Sdram` if this is the SDRAM model.
    fn as_sdram_mut(&mut self) -> Option<&mut sdram::Sdram> {
        None
    }

    /// Returns a mutable reference as `Vga` if this is the video decoder.
    fn as_video_mut(&mut self) -> Option<&mut video::Vga> {
        None
    }
}
