//! Runner configuration
//!
//! Settings come from an optional JSON file; the attempt limit falls back to the `CONTINUOUS_INTEGRATION`
//! environment flag when the file does not set one.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment flag naming a continuous-integration run.
pub const CI_ENV_VAR: &str = "CONTINUOUS_INTEGRATION";

/// Attempts allowed under continuous integration.
pub const CI_MAX_ATTEMPTS: u32 = 3;

/// Attempts allowed elsewhere.
pub const LOCAL_MAX_ATTEMPTS: u32 = 1;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 3.0;

/// Board versions whose physical (non-virtual) boards cannot run resource-heavy tests.
pub const EXCLUDED_BOARD_VERSIONS: &[&str] = &["2", "3"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read runner config '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid runner config '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The machine the tests target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineInfo {
    /// Board version, if configured.
    pub version: Option<String>,
    /// Whether the board is simulated.
    pub virtual_board: bool,
}

impl MachineInfo {
    /// A physical board of the given version.
    pub fn physical(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            virtual_board: false,
        }
    }

    /// Reason resource-allocation failures should be skipped on this machine, if any.
    pub fn unsupported_reason(&self) -> Option<String> {
        let version = self.version.as_deref()?;
        if self.virtual_board || !EXCLUDED_BOARD_VERSIONS.contains(&version) {
            return None;
        }
        Some(format!("This test will not run on a spin {version} board"))
    }
}

/// Settings for the retrying runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Attempt limit; derived from the environment when unset.
    pub max_attempts: Option<u32>,
    /// Seconds to wait between attempts.
    pub retry_delay_secs: f64,
    /// Shared append-only log of transient failures.
    pub error_file: PathBuf,
    /// Directory for global reports.
    pub reports_dir: PathBuf,
    pub machine: MachineInfo,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            error_file: PathBuf::from("ErrorFile.txt"),
            reports_dir: PathBuf::from("global_reports"),
            machine: MachineInfo::default(),
        }
    }
}

impl RunnerConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config with the attempt limit fixed from `CONTINUOUS_INTEGRATION`.
    pub fn from_env() -> Self {
        Self {
            max_attempts: Some(max_attempts_for(env::var(CI_ENV_VAR).ok().as_deref())),
            ..Self::default()
        }
    }

    /// Config whose error file and reports live in `test_dir`.
    pub fn for_test_dir(test_dir: &Path) -> Self {
        Self {
            error_file: test_dir.join("ErrorFile.txt"),
            reports_dir: test_dir.join("global_reports"),
            ..Self::default()
        }
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fix the attempt limit.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the pause between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_secs = delay.as_secs_f64();
        self
    }

    /// Set the target machine.
    pub fn with_machine(mut self, machine: MachineInfo) -> Self {
        self.machine = machine;
        self
    }

    /// Effective attempt limit, never below one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
            .unwrap_or_else(|| max_attempts_for(env::var(CI_ENV_VAR).ok().as_deref()))
            .max(1)
    }

    /// Effective pause between attempts; invalid values collapse to zero.
    pub fn retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_delay_secs).unwrap_or(Duration::ZERO)
    }
}

/// Attempt limit for a value of the continuous-integration flag.
pub fn max_attempts_for(ci_flag: Option<&str>) -> u32 {
    match ci_flag {
        Some(flag) if flag.eq_ignore_ascii_case("true") => CI_MAX_ATTEMPTS,
        _ => LOCAL_MAX_ATTEMPTS,
    }
}
