//! Script-to-test generator
//!
//! Walks one or more script directories under a repository root, classifies every example script, and emits a
//! single generated test file: a verbatim header followed by one method per runnable test.
//!
//! ## Pipeline
//!
//! ```text
//! walk (sorted, hidden dirs pruned) ──> ScriptInspector ──> classify ──> TestFileWriter
//! ```
//!
//! Generation is all-or-nothing: a script that cannot be read or decoded aborts the run and nothing is written.

pub mod classify;
pub mod config;
pub mod emit;
pub mod inspect;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;
use walkdir::WalkDir;

use testbase_core::markers;
use testbase_core::naming::{normalize_separators, relative_script_path, test_method_name};

pub use classify::{Classification, RunConfiguration, SkipReason, classify};
pub use config::GeneratorConfig;
pub use emit::TestFileWriter;
pub use inspect::{ScriptDescriptor, ScriptInspector, TextScanInspector};

/// Header written at the top of every generated file unless the config names another.
pub const DEFAULT_HEADER: &str = include_str!("../../assets/test_scripts_header");

/// Name of the generated file inside the integration-test directory.
pub const GENERATED_FILE_NAME: &str = "test_scripts.py";

/// Errors that abort a generation run
#[derive(Debug, Error, Diagnostic)]
pub enum GenerateError {
    #[error("cannot read '{}'", path.display())]
    #[diagnostic(code(testbase::generate::read))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{}' is not valid UTF-8", path.display())]
    #[diagnostic(code(testbase::generate::decode), help("example scripts must be UTF-8 encoded"))]
    Decode {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("script directory '{}' does not exist", path.display())]
    #[diagnostic(
        code(testbase::generate::missing_root),
        help("script directories are resolved relative to the repository root")
    )]
    MissingRoot { path: PathBuf },

    #[error("failed to walk '{}'", path.display())]
    #[diagnostic(code(testbase::generate::walk))]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid generator tables in '{}'", path.display())]
    #[diagnostic(code(testbase::generate::config))]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write generated tests to '{}'", path.display())]
    #[diagnostic(code(testbase::generate::write))]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTests {
    /// Full text of the generated file.
    pub source: String,
    /// Scripts that produced at least one runnable method.
    pub tested: usize,
    /// Scripts that produced a not-testing comment.
    pub not_tested: usize,
}

/// Generates the script test file.
#[derive(Debug, Clone)]
pub struct ScriptTestGenerator<I = TextScanInspector> {
    config: GeneratorConfig,
    inspector: I,
    thorough: bool,
}

impl ScriptTestGenerator<TextScanInspector> {
    /// Create a generator using the text-scanning inspector.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            inspector: TextScanInspector,
            thorough: false,
        }
    }
}

impl<I: ScriptInspector> ScriptTestGenerator<I> {
    /// Replace the script inspector.
    pub fn with_inspector<J: ScriptInspector>(self, inspector: J) -> ScriptTestGenerator<J> {
        ScriptTestGenerator {
            config: self.config,
            inspector,
            thorough: self.thorough,
        }
    }

    /// Enable suppression of `too_long` scripts.
    pub fn thorough(mut self, thorough: bool) -> Self {
        self.thorough = thorough;
        self
    }

    /// The tables this generator classifies against.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the test file text for `dirs` (relative to `repository_dir`).
    #[tracing::instrument(skip_all, fields(roots = dirs.len(), thorough = self.thorough))]
    pub fn generate<P: AsRef<Path>>(&self, repository_dir: &Path, dirs: &[P]) -> Result<GeneratedTests, GenerateError> {
        let header = self.header()?;
        let mut writer = TestFileWriter::with_header(&header);
        let mut tested = 0;
        let mut not_tested = 0;

        for dir in dirs {
            let root = repository_dir.join(dir);
            if !root.is_dir() {
                return Err(GenerateError::MissingRoot { path: root });
            }
            for script in discover_scripts(&root)? {
                let relative = relative_to(&script, repository_dir);
                let file_name = script
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                let descriptor = self.inspector.inspect(&script, &relative)?;
                let classification = classify(&descriptor, &file_name, &self.config, self.thorough);
                let long_running = if classification.is_runnable() {
                    self.config.too_long.get(&file_name).map(String::as_str)
                } else {
                    None
                };

                tracing::info!(script = %relative, runnable = classification.is_runnable(), "classified");
                if classification.is_runnable() {
                    tested += 1;
                } else {
                    not_tested += 1;
                }
                writer.emit_script(&test_method_name(&relative), &relative, &classification, long_running);
            }
        }

        Ok(GeneratedTests {
            source: writer.finish(),
            tested,
            not_tested,
        })
    }

    /// Generate and write the test file to `output`.
    ///
    /// The file is only written once every script has been classified.
    pub fn write<P: AsRef<Path>>(
        &self,
        repository_dir: &Path,
        dirs: &[P],
        output: &Path,
    ) -> Result<GeneratedTests, GenerateError> {
        let generated = self.generate(repository_dir, dirs)?;
        fs::write(output, &generated.source).map_err(|source| GenerateError::Write {
            path: output.to_path_buf(),
            source,
        })?;
        tracing::info!(
            output = %output.display(),
            tested = generated.tested,
            not_tested = generated.not_tested,
            "wrote script tests"
        );
        Ok(generated)
    }

    /// Write `test_scripts.py` into `integration_dir`, scanning `dirs` relative to its parent (the repository).
    pub fn create_test_scripts<P: AsRef<Path>>(
        &self,
        integration_dir: &Path,
        dirs: &[P],
    ) -> Result<GeneratedTests, GenerateError> {
        let repository_dir = integration_dir.parent().unwrap_or(Path::new("."));
        self.write(repository_dir, dirs, &integration_dir.join(GENERATED_FILE_NAME))
    }

    fn header(&self) -> Result<String, GenerateError> {
        match &self.config.header {
            Some(path) => fs::read_to_string(path).map_err(|source| GenerateError::Read {
                path: path.clone(),
                source,
            }),
            None => Ok(DEFAULT_HEADER.to_string()),
        }
    }
}

/// Collect scripts under `root` depth-first in sorted order, pruning hidden directories.
pub fn discover_scripts(root: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let mut scripts = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !markers::is_hidden_dir(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry.map_err(|source| GenerateError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if markers::is_script_file(&entry.file_name().to_string_lossy()) {
            scripts.push(entry.into_path());
        }
    }
    Ok(scripts)
}

/// Path of `script` relative to `repository_dir`, always `/`-separated.
fn relative_to(script: &Path, repository_dir: &Path) -> String {
    let relative = script.strip_prefix(repository_dir).unwrap_or(script);
    let components: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    normalize_separators(&relative_script_path(components.iter().map(String::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn discovery_is_sorted_and_prunes_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.py", "");
        touch(dir.path(), "a.py", "");
        touch(dir.path(), "sub/c.py", "");
        touch(dir.path(), "sub/__init__.py", "");
        touch(dir.path(), ".hidden/d.py", "");
        touch(dir.path(), "notes.txt", "");

        let found: Vec<String> = discover_scripts(dir.path())
            .unwrap()
            .iter()
            .map(|p| relative_to(p, dir.path()))
            .collect();
        assert_eq!(found, vec!["a.py", "b.py", "sub/c.py"]);
    }

    #[test]
    fn hidden_root_is_still_walked() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), ".examples/a.py", "");
        let found = discover_scripts(&dir.path().join(".examples")).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let repo = Path::new("/repo");
        assert_eq!(relative_to(Path::new("/repo/examples/x/y.py"), repo), "examples/x/y.py");
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScriptTestGenerator::new(GeneratorConfig::default())
            .generate(dir.path(), &["nope"])
            .unwrap_err();
        assert!(matches!(err, GenerateError::MissingRoot { .. }));
    }

    #[test]
    fn counts_tested_and_not_tested() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "examples/a.py", "print(1)\n");
        touch(dir.path(), "examples/b.py", "if __name__ == '__main__':\n    pass\n");
        let generated = ScriptTestGenerator::new(GeneratorConfig::default())
            .generate(dir.path(), &["examples"])
            .unwrap();
        assert_eq!(generated.tested, 1);
        assert_eq!(generated.not_tested, 1);
        assert!(generated.source.starts_with(DEFAULT_HEADER));
    }

    #[test]
    fn unreadable_script_aborts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "examples/a.py", "print(1)\n");
        fs::write(dir.path().join("examples/z.py"), [0xffu8, 0xfe]).unwrap();
        let output = dir.path().join("out.py");
        let err = ScriptTestGenerator::new(GeneratorConfig::default())
            .write(dir.path(), &["examples"], &output)
            .unwrap_err();
        assert!(matches!(err, GenerateError::Decode { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn custom_inspector_replaces_scanning() {
        struct EverythingHasAHook;
        impl ScriptInspector for EverythingHasAHook {
            fn inspect(&self, _: &Path, relative_path: &str) -> Result<ScriptDescriptor, GenerateError> {
                Ok(ScriptDescriptor {
                    relative_path: relative_path.to_string(),
                    exposes_run_script_hook: true,
                    ..Default::default()
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "examples/a.py", "print(1)\n");
        let generated = ScriptTestGenerator::new(GeneratorConfig::default())
            .with_inspector(EverythingHasAHook)
            .generate(dir.path(), &["examples"])
            .unwrap();
        assert!(generated.source.contains("def test_examples_a_combined(self):"));
        assert!(generated.source.contains("def test_examples_a_split(self):"));
    }

    #[test]
    fn create_test_scripts_writes_next_to_integration_dir() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "examples/a.py", "print(1)\n");
        fs::create_dir_all(dir.path().join("integration_tests")).unwrap();
        ScriptTestGenerator::new(GeneratorConfig::default())
            .create_test_scripts(&dir.path().join("integration_tests"), &["examples"])
            .unwrap();
        let written = fs::read_to_string(dir.path().join("integration_tests").join(GENERATED_FILE_NAME)).unwrap();
        assert!(written.contains("self.check_script(\"examples/a.py\")"));
    }
}
