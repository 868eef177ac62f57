//! CLI module for testbase
//!
//! ## Commands
//!
//! - `generate <DIR>...` - Write the generated script test file
//! - `check <SCRIPT>` - Run one example script through the retrying runner
//! - `error-log` - Fail if any transient failure was logged
//! - `provenance <DIR> <PATTERN>` - Query the provenance database of a run
//! - `placements <REPORT_DIR> <LABEL>` - List the cores a vertex was placed on
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::version::TESTBASE_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The script was not meaningfully run.
    pub const SKIPPED: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Script test generator and retrying runner for hardware integration suites
#[derive(Parser, Debug)]
#[command(name = "testbase")]
#[command(version = TESTBASE_VERSION)]
#[command(about = "Generate and run example-script integration tests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the script test file
    Generate {
        /// Script directories, relative to the repository
        #[arg(value_name = "DIR", required = true)]
        dirs: Vec<PathBuf>,
        /// Repository root
        #[arg(long, value_name = "DIR", default_value = ".")]
        repo: PathBuf,
        /// Output file (default: <repo>/integration_tests/test_scripts.py)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Header file copied verbatim to the top of the output
        #[arg(long, value_name = "FILE")]
        header: Option<PathBuf>,
        /// JSON file with too_long, exceptions and skip_exceptions tables
        #[arg(long, value_name = "FILE")]
        tables: Option<PathBuf>,
        /// Suppress scripts listed as too long
        #[arg(long)]
        thorough: bool,
    },

    /// Run one example script with retries
    Check {
        /// Script path, relative to the repository
        #[arg(value_name = "SCRIPT")]
        script: String,
        /// Repository root
        #[arg(long, value_name = "DIR", default_value = ".")]
        repo: PathBuf,
        /// Runner config (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Failure category to turn into a skip (repeatable)
        #[arg(long = "skip", value_name = "CATEGORY")]
        skip: Vec<String>,
        /// Report name for a known-broken script; failures are recorded there instead of failing
        #[arg(long = "broken", value_name = "MSG")]
        broken: Option<String>,
        /// Python interpreter
        #[arg(long, value_name = "EXE", default_value = "python3")]
        python: PathBuf,
    },

    /// Fail if the shared error log has any entries
    ErrorLog {
        /// Runner config (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Query the provenance database of a run
    Provenance {
        /// Provenance directory containing provenance.sqlite3
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        /// SQL LIKE pattern matched against description names
        #[arg(value_name = "PATTERN")]
        pattern: String,
    },

    /// List the cores a vertex was placed on
    Placements {
        /// Run report directory
        #[arg(value_name = "REPORT_DIR")]
        report_dir: PathBuf,
        /// Vertex label
        #[arg(value_name = "LABEL")]
        label: String,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Generate {
            dirs,
            repo,
            output,
            header,
            tables,
            thorough,
        } => commands::generate(&commands::GenerateArgs {
            dirs,
            repo,
            output,
            header,
            tables,
            thorough,
        }),
        Command::Check {
            script,
            repo,
            config,
            skip,
            broken,
            python,
        } => commands::check(&commands::CheckArgs {
            script,
            repo,
            config,
            skip,
            broken,
            python,
        }),
        Command::ErrorLog { config } => commands::error_log(config.as_deref()),
        Command::Provenance { dir, pattern } => commands::provenance(&dir, &pattern),
        Command::Placements { report_dir, label } => commands::placements(&report_dir, &label),
    }
}

// ============================================================================
// Tests
// ============================================================================
