//! Retrying test runner
//!
//! Executes a unit of work and sorts whatever it fails with into one of three outcomes:
//!
//! - **Transient infrastructure failures** are logged to the shared error log and retried after a fixed delay,
//!   up to the attempt limit. A category in the caller's skip set becomes a soft skip without a retry.
//! - **Resource-allocation failures** are never retried. On an excluded physical board they always become a
//!   soft skip; otherwise a category in the skip set becomes a soft skip and anything else is fatal.
//! - **Unclassified failures** propagate immediately.
//!
//! ## States
//!
//! ```text
//! Running ──ok──────────────────────────> Succeeded
//! Running ──transient, attempts left────> Retrying ──delay──> Running
//! Running ──skip set / hardware guard───> SoftSkipped
//! Running ──resource / exhausted / other> FatalFailed
//! ```

pub mod config;
pub mod error_log;
pub mod failure;

use std::fmt;
use std::thread;
use std::time::Duration;

use testbase_core::FailureFamily;

pub use config::{MachineInfo, RunnerConfig};
pub use error_log::{ErrorLog, ReportSink};
pub use failure::{Failure, SkipSet};

/// Terminal non-fatal outcome of a runner invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The unit of work returned normally on attempt `attempts`.
    Succeeded { attempts: u32 },
    /// The work was not meaningfully executed; report it as "not run", never as passed or failed.
    SoftSkipped { reason: String },
}

impl RunOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, RunOutcome::SoftSkipped { .. })
    }
}

/// Runner state, reported in logs as the invocation progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Retrying,
    SoftSkipped,
    Succeeded,
    FatalFailed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Running => "running",
            RunState::Retrying => "retrying",
            RunState::SoftSkipped => "soft-skipped",
            RunState::Succeeded => "succeeded",
            RunState::FatalFailed => "fatal",
        };
        f.write_str(name)
    }
}

/// Per-invocation retry bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    /// Transient failures seen so far.
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub last_error: Option<Failure>,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt_count: 0,
            max_attempts: max_attempts.max(1),
            last_error: None,
        }
    }

    /// Count a transient failure; returns `true` once the attempt limit is reached.
    pub fn record(&mut self, failure: &Failure) -> bool {
        self.attempt_count += 1;
        self.last_error = Some(failure.clone());
        self.attempt_count >= self.max_attempts
    }
}

/// Blocks the calling thread between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps with [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Runs units of work for one test module.
#[derive(Debug, Clone)]
pub struct RetryRunner<S = ThreadSleeper> {
    config: RunnerConfig,
    error_log: ErrorLog,
    sleeper: S,
    test_module: String,
}

impl RetryRunner<ThreadSleeper> {
    /// Create a runner; `test_module` identifies the caller in error-log entries.
    pub fn new(config: RunnerConfig, test_module: impl Into<String>) -> Self {
        Self {
            error_log: ErrorLog::new(config.error_file.clone()),
            config,
            sleeper: ThreadSleeper,
            test_module: test_module.into(),
        }
    }
}

impl<S: Sleeper> RetryRunner<S> {
    /// Replace the delay mechanism.
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> RetryRunner<T> {
        RetryRunner {
            config: self.config,
            error_log: self.error_log,
            sleeper,
            test_module: self.test_module,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Run `work`, retrying transient failures.
    ///
    /// ## Errors
    ///
    /// Returns the failure that ended the invocation: an unclassified failure, a resource-allocation failure
    /// not covered by the skip set or the hardware guard, or the last transient failure once attempts run out.
    pub fn run_safe<F>(&self, work: F, skip: &SkipSet) -> Result<RunOutcome, Failure>
    where
        F: FnMut() -> Result<(), Failure>,
    {
        self.run_safe_for(&self.test_module, work, skip)
    }

    /// [`run_safe`](Self::run_safe), logging transient failures under `test_module` instead of the runner's own.
    #[tracing::instrument(skip_all, fields(module = %test_module))]
    pub fn run_safe_for<F>(&self, test_module: &str, mut work: F, skip: &SkipSet) -> Result<RunOutcome, Failure>
    where
        F: FnMut() -> Result<(), Failure>,
    {
        let mut state = RetryState::new(self.config.max_attempts());
        loop {
            tracing::debug!(state = %RunState::Running, attempt = state.attempt_count + 1);
            let failure = match work() {
                Ok(()) => {
                    tracing::debug!(state = %RunState::Succeeded);
                    return Ok(RunOutcome::Succeeded {
                        attempts: state.attempt_count + 1,
                    });
                }
                Err(failure) => failure,
            };

            match failure.family() {
                Some(FailureFamily::TransientInfrastructure) => {
                    if skip.matches(&failure) {
                        return Ok(soft_skip(format!("{failure} Still not fixed!")));
                    }
                    self.error_log.record(test_module, &failure.to_string());
                    if state.record(&failure) {
                        tracing::error!(state = %RunState::FatalFailed, attempts = state.attempt_count, "{failure}");
                        return Err(failure);
                    }
                    let delay = self.config.retry_delay();
                    tracing::warn!(
                        state = %RunState::Retrying,
                        retry = state.attempt_count,
                        "will run again in {:.1} seconds after: {failure}",
                        delay.as_secs_f64()
                    );
                    self.sleeper.sleep(delay);
                }
                Some(FailureFamily::ResourceAllocation) => {
                    if let Some(reason) = self.config.machine.unsupported_reason() {
                        return Ok(soft_skip(reason));
                    }
                    if skip.matches(&failure) {
                        return Ok(soft_skip(format!("{failure} Still not fixed!")));
                    }
                    tracing::error!(state = %RunState::FatalFailed, "{failure}");
                    return Err(failure);
                }
                None => return Err(failure),
            }
        }
    }
}

fn soft_skip(reason: String) -> RunOutcome {
    tracing::info!(state = %RunState::SoftSkipped, %reason);
    RunOutcome::SoftSkipped { reason }
}
