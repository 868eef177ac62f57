//! Generator lookup tables.
//!
//! All tables are keyed by bare file name (including `.py`), not by path, so one entry covers every copy of a
//! script with that name under the scanned roots.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::GenerateError;

/// Override tables and header selection for a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Scripts that take too long, mapped to how long. Suppressed only in thorough mode.
    pub too_long: BTreeMap<String, String>,
    /// Scripts that are never tested, mapped to the reason.
    pub exceptions: BTreeMap<String, String>,
    /// Scripts mapped to `from X import Y` statements naming failures to skip on.
    pub skip_exceptions: BTreeMap<String, Vec<String>>,
    /// Header file to copy verbatim; the embedded header is used when absent.
    pub header: Option<PathBuf>,
}

impl GeneratorConfig {
    /// Create an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a script as too long to run outside thorough mode.
    pub fn with_too_long(mut self, file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.too_long.insert(file_name.into(), reason.into());
        self
    }

    /// Never test a script.
    pub fn with_exception(mut self, file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.exceptions.insert(file_name.into(), reason.into());
        self
    }

    /// Attach skip-on imports to a script.
    pub fn with_skip_exceptions<S: Into<String>>(
        mut self,
        file_name: impl Into<String>,
        imports: impl IntoIterator<Item = S>,
    ) -> Self {
        self.skip_exceptions
            .insert(file_name.into(), imports.into_iter().map(Into::into).collect());
        self
    }

    /// Use a header file instead of the embedded header.
    pub fn with_header(mut self, header: impl Into<PathBuf>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Load tables from a JSON file.
    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let text = fs::read_to_string(path).map_err(|source| GenerateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| GenerateError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
