//! Run artifacts
//!
//! Read-only helpers over what a hardware run leaves behind: the provenance database, provenance and iobuf
//! directories, the placement report, and captured log records.

pub mod logs;
pub mod placements;
pub mod provenance;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use logs::{LogAssertionError, LogCapture, LogRecord, assert_logs_messages};
pub use placements::{PLACEMENT_REPORT, Placement, parse_placements, read_placements};
pub use provenance::{PROVENANCE_DB, ProvenanceStore};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("provenance query on '{}' failed", path.display())]
    Sqlite {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("malformed placement on line {line_number}: {line:?}")]
    MalformedPlacement { line_number: usize, line: String },
}

/// Output directories of the most recent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectories {
    pub provenance: PathBuf,
    pub system_provenance: PathBuf,
    pub app_provenance: PathBuf,
    pub run_reports: PathBuf,
}

impl RunDirectories {
    /// Names in the provenance directory, sorted.
    pub fn provenance_files(&self) -> Result<Vec<String>, ArtifactError> {
        list_dir(&self.provenance)
    }

    /// Names in the system iobuf directory, sorted.
    pub fn system_iobuf_files(&self) -> Result<Vec<String>, ArtifactError> {
        list_dir(&self.system_provenance)
    }

    /// Names in the application iobuf directory, sorted.
    pub fn app_iobuf_files(&self) -> Result<Vec<String>, ArtifactError> {
        list_dir(&self.app_provenance)
    }

    pub fn provenance_store(&self) -> Result<ProvenanceStore, ArtifactError> {
        ProvenanceStore::open(&self.provenance)
    }

    /// Placements of the vertex `label` from the run's placement report.
    pub fn placements(&self, label: &str) -> Result<Vec<Placement>, ArtifactError> {
        read_placements(&self.run_reports, label)
    }
}

fn list_dir(dir: &Path) -> Result<Vec<String>, ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
