//! Mock implementations of the core traits.

/// Scriptable `Design` implementation.
pub mod design;

/// Mockall-based `Peripheral` mock.
pub mod peripheral;
