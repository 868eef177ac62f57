//! Running scripts in a Python subprocess.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::runner::Failure;

use super::{ScriptExecutor, ScriptRun};

/// Line the bootstrap prints on stderr for every `pyplot.show` call.
pub const SHOW_SENTINEL: &str = "<<testbase:pyplot.show>>";

/// Exception name used when a script fails without a readable traceback.
const SCRIPT_ERROR: &str = "ScriptError";

/// Forces a headless backend, replaces `pyplot.show`, then runs the script as a module
/// (so a `__main__` guard is not entered).
const BOOTSTRAP: &str = r#"import runpy
import sys

try:
    import matplotlib
    matplotlib.use("Agg")
    import matplotlib.pyplot as _pyplot

    def _show(*args, **kwargs):
        sys.stderr.write("<<testbase:pyplot.show>>\n")
        sys.stderr.flush()

    _pyplot.show = _show
except ImportError:
    pass

_script = sys.argv[1]
sys.argv = sys.argv[1:]
runpy.run_path(_script)
"#;

/// Runs scripts with a Python interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonExecutor {
    python: PathBuf,
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl PythonExecutor {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self { python: python.into() }
    }

    pub fn python(&self) -> &Path {
        &self.python
    }
}

impl ScriptExecutor for PythonExecutor {
    fn execute(&self, script: &Path, working_dir: &Path) -> Result<ScriptRun, Failure> {
        let output = Command::new(&self.python)
            .arg("-c")
            .arg(BOOTSTRAP)
            .arg(script)
            .current_dir(working_dir)
            .env("MPLBACKEND", "Agg")
            .output()
            .map_err(|e| {
                Failure::unclassified(
                    SCRIPT_ERROR,
                    format!("cannot start '{}': {e}", self.python.display()),
                )
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            return Ok(ScriptRun {
                plots_shown: count_shows(&stderr),
            });
        }
        tracing::debug!(script = %script.display(), status = %output.status, "script failed");
        Err(failure_from_traceback(&stderr)
            .unwrap_or_else(|| Failure::unclassified(SCRIPT_ERROR, format!("script exited with {}", output.status))))
    }
}

fn count_shows(stderr: &str) -> usize {
    stderr.lines().filter(|line| line.trim_end() == SHOW_SENTINEL).count()
}

/// Recover the failure from the last line of a Python traceback (`pkg.mod.ClassName: message`).
///
/// Returns `None` when stderr has no such line.
pub fn failure_from_traceback(stderr: &str) -> Option<Failure> {
    let line = stderr
        .lines()
        .rev()
        .map(str::trim_end)
        .find(|line| !line.is_empty() && !line.starts_with(char::is_whitespace) && *line != SHOW_SENTINEL)?;

    let (exception, message) = match line.split_once(": ") {
        Some((exception, message)) => (exception, message),
        None => (line.trim_end_matches(':'), ""),
    };
    if !is_exception_name(exception) {
        return None;
    }
    Some(Failure::new(exception, message))
}

fn is_exception_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

#[cfg(test)]
mod tests {
    use testbase_core::FailureCategoryId;

    use super::*;

    #[test]
    fn traceback_last_line_gives_category() {
        let stderr = "Traceback (most recent call last):\n  File \"a.py\", line 3, in <module>\n    run()\n\
                      spinnman.exceptions.SpinnmanTimeoutException: Operation timed out\n";
        let failure = failure_from_traceback(stderr).unwrap();
        assert_eq!(failure.category, Some(FailureCategoryId::Communication));
        assert_eq!(failure.exception, "spinnman.exceptions.SpinnmanTimeoutException");
        assert_eq!(failure.message, "Operation timed out");
    }

    #[test]
    fn unknown_exception_is_unclassified() {
        let failure = failure_from_traceback("Traceback:\n  x\nZeroDivisionError: division by zero\n").unwrap();
        assert_eq!(failure.category, None);
        assert_eq!(failure.to_string(), "ZeroDivisionError: division by zero");
    }

    #[test]
    fn bare_exception_without_message() {
        let failure = failure_from_traceback("Traceback:\n  x\nKeyboardInterrupt\n").unwrap();
        assert_eq!(failure.exception, "KeyboardInterrupt");
        assert_eq!(failure.message, "");
    }

    #[test]
    fn no_traceback() {
        assert_eq!(failure_from_traceback(""), None);
        assert_eq!(failure_from_traceback("Segmentation fault (core dumped)\n"), None);
    }

    #[test]
    fn sentinel_lines_are_ignored() {
        let stderr = format!("{SHOW_SENTINEL}\nTraceback:\n  x\npacman.exceptions.PacmanValueError: bad\n{SHOW_SENTINEL}\n");
        let failure = failure_from_traceback(&stderr).unwrap();
        assert_eq!(failure.category, Some(FailureCategoryId::Value));
    }

    #[test]
    fn counts_show_sentinels() {
        assert_eq!(count_shows(&format!("warn\n{SHOW_SENTINEL}\n{SHOW_SENTINEL}\r\n")), 2);
        assert_eq!(count_shows("nothing\n"), 0);
    }

    #[test]
    fn bootstrap_prints_the_sentinel() {
        assert!(BOOTSTRAP.contains(SHOW_SENTINEL));
    }

    #[test]
    fn missing_interpreter_is_unclassified() {
        let dir = tempfile::tempdir().unwrap();
        let executor = PythonExecutor::new(dir.path().join("no-such-python"));
        let failure = executor.execute(&dir.path().join("a.py"), dir.path()).unwrap_err();
        assert_eq!(failure.category, None);
        assert_eq!(failure.exception, SCRIPT_ERROR);
    }
}
