//! Shared error log and global reports.
//!
//! Both files are shared between sibling test processes. Every write is a single open-append-close cycle with no
//! cross-process locking.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Report that collects `"<seconds> for <script>"` lines for scripts that ran.
pub const SCRIPTS_RAN_REPORT: &str = "scripts_ran_successfully";

#[derive(Debug, Error)]
pub enum ErrorLogError {
    #[error("transient failures were logged to '{}':\n{contents}", path.display())]
    Dirty { path: PathBuf, contents: String },
    #[error("cannot read error log '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Append-only log of transient failures, written before each retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the (possibly non-existent) log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry: the failing test module, then the failure text.
    pub fn append(&self, module: &str, message: &str) -> io::Result<()> {
        append_line(&self.path, &format!("{module}\n{message}\n"))
    }

    /// Append one entry, logging instead of failing if the write does not succeed.
    pub fn record(&self, module: &str, message: &str) {
        if let Err(e) = self.append(module, message) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not write error log");
        }
    }

    /// Contents of the log, or `None` if nothing was ever logged.
    pub fn read(&self) -> Result<Option<String>, ErrorLogError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ErrorLogError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Fail with the log contents if any transient failure was logged.
    pub fn ensure_clean(&self) -> Result<(), ErrorLogError> {
        match self.read()? {
            None => Ok(()),
            Some(contents) => Err(ErrorLogError::Dirty {
                path: self.path.clone(),
                contents,
            }),
        }
    }
}

/// Directory of append-only global reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSink {
    dir: PathBuf,
}

impl ReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append `message` to the report `file_name`, adding a trailing newline when missing.
    pub fn report(&self, message: &str, file_name: &str) -> io::Result<()> {
        // Another process may create the directory concurrently; `create_dir_all` tolerates that.
        fs::create_dir_all(&self.dir)?;
        let mut line = message.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        append_line(&self.dir.join(file_name), &line)
    }
}

fn append_line(path: &Path, text: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())
}
