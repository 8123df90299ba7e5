//! Common building blocks shared across the co-simulation core.
//!
//! This module provides the fundamental vocabulary used by every component:
//! 1. **Bus Values:** Tri-state bus modeling and single-point arbitration.
//! 2. **Error Handling:** The fatal error taxonomy for the simulation core.

/// Tri-state bus values and per-half-cycle arbitration.
pub mod bus;

/// Fatal error definitions for the simulation core.
pub mod error;

pub use self::bus::{BusClaim, BusState};
pub use self::error::SimError;
