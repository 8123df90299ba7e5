//! Fatal error definitions for the simulation core.
//!
//! Only conditions that leave the simulation state meaningless are errors:
//! a corrupted run cannot be continued. Recoverable protocol violations
//! (e.g. a write command with no open row) are *not* represented here: the
//! peripheral models log and ignore those, mirroring real hardware's
//! undefined-but-non-fatal behavior.

use std::io;

use thiserror::Error;

/// Fatal simulation errors.
///
/// Every variant carries enough context to diagnose the failure without a
/// debugger: pin names, driver names, and the half-cycle count at which the
/// condition was detected.
#[derive(Debug, Error)]
pub enum SimError {
    /// The harness requested a pin the design does not expose.
    ///
    /// Raised during pin binding, before the first clock edge. Indicates a
    /// configuration or version mismatch between harness and design.
    #[error("design does not expose pin \"{0}\"")]
    UnknownPin(String),

    /// Two parties drove the shared bus in the same half-cycle.
    ///
    /// This is a modeling bug, not a protocol violation: every transaction
    /// after the collision would be corrupted, so the run aborts.
    #[error("edge {edge}: bus contention on \"{bus}\": \"{first}\" and \"{second}\" are both driving")]
    BusContention {
        /// Half-cycle count at which the collision occurred.
        edge: u64,
        /// Name of the contended bus binding.
        bus: String,
        /// First driver detected.
        first: String,
        /// Second driver detected.
        second: String,
    },

    /// A peripheral model hit an internal assertion it cannot recover from.
    #[error("edge {edge}: peripheral \"{peripheral}\": {detail}")]
    PeripheralFault {
        /// Half-cycle count at which the fault occurred.
        edge: u64,
        /// Name of the faulting peripheral.
        peripheral: String,
        /// Human-readable fault description.
        detail: String,
    },

    /// A memory image file could not be read or written.
    #[error("memory image \"{path}\": {source}")]
    Image {
        /// Path of the offending image file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A memory image file is larger than the configured backing array.
    #[error("memory image \"{path}\" is {actual} bytes, larger than the {capacity}-byte array")]
    ImageTooLarge {
        /// Path of the offending image file.
        path: String,
        /// Size of the image file in bytes.
        actual: u64,
        /// Capacity of the backing array in bytes.
        capacity: u64,
    },

    /// A configuration file could not be read or parsed.
    #[error("configuration \"{path}\": {detail}")]
    ConfigFile {
        /// Path of the offending configuration file.
        path: String,
        /// Human-readable parse or I/O failure description.
        detail: String,
    },

    /// A configuration value is out of the supported range.
    #[error("invalid configuration: {0}")]
    Config(String),
}
