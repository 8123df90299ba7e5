//! Shared infrastructure for the co-simulation test suite.

/// Fluent builders for model inputs.
pub mod builder;


/// Mock implementations of the `Design` and `Peripheral` traits.
pub mod mocks;

/// Installs a test-friendly tracing subscriber (idempotent).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}
