//! Version information.
//!
//! The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time; prefer this constant over
//! repeating `env!("CARGO_PKG_VERSION")`.

/// The testbase version string (for example, `0.3.0`).
pub const TESTBASE_VERSION: &str = env!("CARGO_PKG_VERSION");
