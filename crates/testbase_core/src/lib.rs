//! Provide shared, pure vocabulary and naming helpers for the testbase generator and runner.
//!
//! This crate is intentionally small and dependency-free. It contains deterministic helpers that both:
//! - the script-test generator uses to recognise markers and derive test names, and
//! - the retrying runner uses to map exception spellings onto failure categories.
//!
//! ## Notes
//!
//! - **No IO**, no global state, and no runner- or generator-specific types.
//! - Current scope: failure-category registry, script marker spellings, and test/module name derivation.

pub mod failures;
pub mod markers;
pub mod naming;

pub use failures::{FailureCategoryId, FailureFamily};
