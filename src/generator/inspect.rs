//! Script inspection: recover structural metadata from an example script.
//!
//! The default [`TextScanInspector`] is a best-effort substring heuristic over the script's lines. It sits behind
//! the [`ScriptInspector`] trait so a stricter source (for example an explicit manifest) can replace it without
//! touching classification or emission.

use std::fs;
use std::io;
use std::path::Path;

use testbase_core::markers::{self, COMBINED_BINARIES, LIST_CLOSE, MAIN_GUARD, SPLIT_BINARIES};
use testbase_core::naming::extract_binaries;

use super::GenerateError;

/// Structural facts about one script, built once by scanning its text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptDescriptor {
    /// Path relative to the repository root, `/`-separated.
    pub relative_path: String,
    /// The script guards an entry point behind `__name__`.
    pub has_main_guard: bool,
    /// The script defines `run_script(..., split: ...)`.
    pub exposes_run_script_hook: bool,
    /// Binaries expected when the workload runs combined.
    pub declared_binaries_combined: Vec<String>,
    /// Binaries expected when the workload runs split.
    pub declared_binaries_split: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum BinariesBlock {
    Combined,
    Split,
}

impl ScriptDescriptor {
    /// Scan script source text in a single pass over its lines.
    ///
    /// A binaries comment block starts on a line containing `combined binaries` or `split binaries` and
    /// accumulates lines until one contains `]`. A block left open at end of file is discarded.
    pub fn scan(relative_path: impl Into<String>, source: &str) -> Self {
        let mut descriptor = ScriptDescriptor {
            relative_path: relative_path.into(),
            ..Default::default()
        };
        let mut open: Option<(BinariesBlock, String)> = None;

        for line in source.lines() {
            match open.as_mut() {
                Some((_, text)) => {
                    text.push('\n');
                    text.push_str(line);
                }
                None => {
                    if markers::is_run_hook(line) {
                        tracing::debug!(script = %descriptor.relative_path, "found split-capable run_script");
                        descriptor.exposes_run_script_hook = true;
                    } else if line.contains(COMBINED_BINARIES) {
                        open = Some((BinariesBlock::Combined, line.to_string()));
                    } else if line.contains(SPLIT_BINARIES) {
                        open = Some((BinariesBlock::Split, line.to_string()));
                    } else if line.contains(MAIN_GUARD) {
                        descriptor.has_main_guard = true;
                    }
                }
            }

            if line.contains(LIST_CLOSE) {
                if let Some((block, text)) = open.take() {
                    let binaries = extract_binaries(&text);
                    match block {
                        BinariesBlock::Combined => descriptor.declared_binaries_combined = binaries,
                        BinariesBlock::Split => descriptor.declared_binaries_split = binaries,
                    }
                }
            }
        }

        descriptor
    }

    /// Whether the script declared binaries for either configuration.
    pub fn declares_binaries(&self) -> bool {
        !self.declared_binaries_combined.is_empty() || !self.declared_binaries_split.is_empty()
    }
}

/// Source of script descriptors.
pub trait ScriptInspector {
    /// Describe the script at `script_path`, reported under `relative_path`.
    ///
    /// A script that cannot be read or decoded is a hard failure.
    fn inspect(&self, script_path: &Path, relative_path: &str) -> Result<ScriptDescriptor, GenerateError>;
}

/// Line-oriented substring scanner (the default inspector).
#[derive(Debug, Default, Clone, Copy)]
pub struct TextScanInspector;

impl ScriptInspector for TextScanInspector {
    fn inspect(&self, script_path: &Path, relative_path: &str) -> Result<ScriptDescriptor, GenerateError> {
        let source = fs::read_to_string(script_path).map_err(|source| {
            if source.kind() == io::ErrorKind::InvalidData {
                GenerateError::Decode {
                    path: script_path.to_path_buf(),
                    source,
                }
            } else {
                GenerateError::Read {
                    path: script_path.to_path_buf(),
                    source,
                }
            }
        })?;
        Ok(ScriptDescriptor::scan(relative_path, &source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_script_has_no_markers() {
        let d = ScriptDescriptor::scan("examples/a.py", "import sys\nprint(1)\n");
        assert_eq!(d.relative_path, "examples/a.py");
        assert!(!d.has_main_guard);
        assert!(!d.exposes_run_script_hook);
        assert!(!d.declares_binaries());
    }

    #[test]
    fn main_guard_detected() {
        let d = ScriptDescriptor::scan("a.py", "def f():\n    pass\n\nif __name__ == \"__main__\":\n    f()\n");
        assert!(d.has_main_guard);
        assert!(!d.exposes_run_script_hook);
    }

    #[test]
    fn run_hook_detected() {
        let source = "def run_script(*, split: bool = False):\n    pass\n\nif __name__ == \"__main__\":\n    run_script()\n";
        let d = ScriptDescriptor::scan("a.py", source);
        assert!(d.exposes_run_script_hook);
        assert!(d.has_main_guard);
    }

    #[test]
    fn run_script_without_split_is_not_a_hook() {
        let d = ScriptDescriptor::scan("a.py", "def run_script():\n    pass\n");
        assert!(!d.exposes_run_script_hook);
    }

    #[test]
    fn multi_line_combined_binaries() {
        let source = "# combined binaries\n# [ \"aplx1\",\n#   \"aplx2\" ]\nimport x\n";
        let d = ScriptDescriptor::scan("a.py", source);
        assert_eq!(d.declared_binaries_combined, vec!["aplx1", "aplx2"]);
        assert!(d.declared_binaries_split.is_empty());
    }

    #[test]
    fn both_binaries_lists() {
        let source = "\
# combined binaries [\"delay.aplx\", \"neuron.aplx\"]
# split binaries
# [\"delay.aplx\",
#  \"synapse.aplx\",
#  \"neuron_only.aplx\"]
def run_script(*, split: bool = False):
    pass
";
        let d = ScriptDescriptor::scan("a.py", source);
        assert_eq!(d.declared_binaries_combined, vec!["delay.aplx", "neuron.aplx"]);
        assert_eq!(
            d.declared_binaries_split,
            vec!["delay.aplx", "synapse.aplx", "neuron_only.aplx"]
        );
        assert!(d.exposes_run_script_hook);
    }

    #[test]
    fn markers_inside_open_block_are_ignored() {
        // The guard line is swallowed by the still-open list.
        let source = "# combined binaries [\"a.aplx\",\nif __name__ == \"__main__\": \"b.aplx\"]\n";
        let d = ScriptDescriptor::scan("a.py", source);
        assert!(!d.has_main_guard);
        assert_eq!(d.declared_binaries_combined.len(), 2);
    }

    #[test]
    fn unterminated_block_is_discarded() {
        let d = ScriptDescriptor::scan("a.py", "# split binaries [\"a.aplx\",\n# \"b.aplx\"\n");
        assert!(d.declared_binaries_split.is_empty());
    }

    #[test]
    fn inspector_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.py");
        fs::write(&path, "if __name__ == '__main__':\n    pass\n").unwrap();
        let d = TextScanInspector.inspect(&path, "s.py").unwrap();
        assert!(d.has_main_guard);
    }

    #[test]
    fn inspector_rejects_non_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.py");
        fs::write(&path, [0x66, 0x6f, 0xff, 0xfe, 0x0a]).unwrap();
        let err = TextScanInspector.inspect(&path, "bad.py").unwrap_err();
        assert!(matches!(err, GenerateError::Decode { .. }));
    }

    #[test]
    fn inspector_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TextScanInspector
            .inspect(&dir.path().join("missing.py"), "missing.py")
            .unwrap_err();
        assert!(matches!(err, GenerateError::Read { .. }));
    }
}
