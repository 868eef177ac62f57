#![forbid(unsafe_code)]
//! Testbase: integration-test scaffolding for example-script repositories
//!
//! Two halves share one vocabulary crate (`testbase_core`):
//!
//! - **Generation**: walk script directories, classify each example script, and write one generated test file.
//! - **Running**: execute units of work with retries for transient infrastructure failures, soft skips for known
//!   breakage, and fatal propagation for everything else.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod artifacts;
pub mod checker;
pub mod cli;
pub mod generator;
pub mod runner;
pub mod version;

pub use checker::{PythonExecutor, ScriptChecker, ScriptExecutor, ScriptRun};
pub use generator::{GenerateError, GeneratedTests, GeneratorConfig, ScriptTestGenerator};
pub use runner::{Failure, RetryRunner, RunOutcome, RunnerConfig, SkipSet};
