//! Classification of scanned scripts into test shapes.
//!
//! Exactly one [`Classification`] is produced per script. The outcome is a total function of the descriptor,
//! the script's file name, the override tables, and the thoroughness toggle.

use std::fmt;

use super::config::GeneratorConfig;
use super::inspect::ScriptDescriptor;

/// Why a script gets no runnable test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Listed in `too_long` and the run is thorough.
    TooLong(String),
    /// Listed in `exceptions`.
    Exception(String),
    /// Has a guarded entry point but no run-hook, so importing it would run nothing.
    UnhandledMain,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooLong(reason) | SkipReason::Exception(reason) => f.write_str(reason),
            SkipReason::UnhandledMain => f.write_str("Unhandled main"),
        }
    }
}

/// Workload configuration a run-hook test exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunConfiguration {
    Combined,
    Split,
}

impl RunConfiguration {
    /// Both configurations, in emission order.
    pub const ALL: [RunConfiguration; 2] = [RunConfiguration::Combined, RunConfiguration::Split];

    /// Value passed as `run_script(split=...)`.
    pub fn is_split(self) -> bool {
        self == RunConfiguration::Split
    }

    /// Suffix appended to the test-method name.
    pub fn suffix(self) -> &'static str {
        match self {
            RunConfiguration::Combined => "_combined",
            RunConfiguration::Split => "_split",
        }
    }
}

/// How a script is wrapped into generated tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// No runnable test; a comment explains why.
    Skip(SkipReason),
    /// Invoke the script's run-hook once per [`RunConfiguration`].
    RunScriptStyle {
        combined_binaries: Vec<String>,
        split_binaries: Vec<String>,
    },
    /// Run the script as a module through `check_script`.
    ImportStyle {
        skip_imports: Vec<String>,
        binaries: Vec<String>,
    },
}

impl Classification {
    /// Whether at least one runnable test method will be emitted.
    pub fn is_runnable(&self) -> bool {
        !matches!(self, Classification::Skip(_))
    }
}

/// Classify a script.
///
/// Order of precedence: `too_long` (thorough runs only), `exceptions`, run-hook, unhandled main, import style.
pub fn classify(
    descriptor: &ScriptDescriptor,
    file_name: &str,
    config: &GeneratorConfig,
    thorough: bool,
) -> Classification {
    if thorough {
        if let Some(reason) = config.too_long.get(file_name) {
            return Classification::Skip(SkipReason::TooLong(reason.clone()));
        }
    }
    if let Some(reason) = config.exceptions.get(file_name) {
        return Classification::Skip(SkipReason::Exception(reason.clone()));
    }
    if descriptor.exposes_run_script_hook {
        return Classification::RunScriptStyle {
            combined_binaries: descriptor.declared_binaries_combined.clone(),
            split_binaries: descriptor.declared_binaries_split.clone(),
        };
    }
    if descriptor.has_main_guard {
        if descriptor.declares_binaries() {
            tracing::warn!(
                script = %descriptor.relative_path,
                "binaries declared in a script with an unhandled main are ignored"
            );
        }
        return Classification::Skip(SkipReason::UnhandledMain);
    }
    Classification::ImportStyle {
        skip_imports: config.skip_exceptions.get(file_name).cloned().unwrap_or_default(),
        binaries: descriptor.declared_binaries_combined.clone(),
    }
}
