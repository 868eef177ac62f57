//! Script checker
//!
//! Runs one example script inside the retrying runner and records how long it took. The script executes with
//! its own directory as working directory; execution itself sits behind [`ScriptExecutor`] so the checker can be
//! driven without a Python interpreter.

pub mod process;

use std::fs;
use std::io;
use std::path::{self, Path, PathBuf};
use std::time::Instant;

use testbase_core::markers::PLOTTING_IMPORT;
use thiserror::Error;

use crate::runner::error_log::SCRIPTS_RAN_REPORT;
use crate::runner::{Failure, ReportSink, RetryRunner, RunOutcome, RunnerConfig, SkipSet, Sleeper, ThreadSleeper};

pub use process::{PythonExecutor, failure_from_traceback};

/// What a finished script reported back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptRun {
    /// Number of times the script called `pyplot.show`.
    pub plots_shown: usize,
}

/// Executes a script once.
pub trait ScriptExecutor {
    /// Run `script` with `working_dir` as the current directory.
    fn execute(&self, script: &Path, working_dir: &Path) -> Result<ScriptRun, Failure>;
}

impl<T: ScriptExecutor + ?Sized> ScriptExecutor for &T {
    fn execute(&self, script: &Path, working_dir: &Path) -> Result<ScriptRun, Failure> {
        (**self).execute(script, working_dir)
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("cannot read script '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error on {script}: {failure}")]
    Failed {
        script: String,
        #[source]
        failure: Failure,
    },

    #[error("{script} imports matplotlib.pyplot but never called show")]
    NoPlotShown { script: String },

    #[error("cannot write report '{file_name}'")]
    Report {
        file_name: String,
        #[source]
        source: io::Error,
    },
}

/// Checks example scripts of one repository.
#[derive(Debug, Clone)]
pub struct ScriptChecker<E = PythonExecutor, S = ThreadSleeper> {
    repository_dir: PathBuf,
    runner: RetryRunner<S>,
    reports: ReportSink,
    executor: E,
}

impl ScriptChecker<PythonExecutor, ThreadSleeper> {
    /// Checker for scripts under `repository_dir`, run with the default Python executor.
    pub fn new(repository_dir: impl Into<PathBuf>, config: RunnerConfig) -> Self {
        let reports = ReportSink::new(config.reports_dir.clone());
        Self {
            repository_dir: repository_dir.into(),
            runner: RetryRunner::new(config, "test_scripts"),
            reports,
            executor: PythonExecutor::default(),
        }
    }
}

impl<E: ScriptExecutor, S: Sleeper> ScriptChecker<E, S> {
    /// Replace the executor.
    pub fn with_executor<F: ScriptExecutor>(self, executor: F) -> ScriptChecker<F, S> {
        ScriptChecker {
            repository_dir: self.repository_dir,
            runner: self.runner,
            reports: self.reports,
            executor,
        }
    }

    /// Replace the retry delay mechanism.
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> ScriptChecker<E, T> {
        ScriptChecker {
            repository_dir: self.repository_dir,
            runner: self.runner.with_sleeper(sleeper),
            reports: self.reports,
            executor: self.executor,
        }
    }

    pub fn runner(&self) -> &RetryRunner<S> {
        &self.runner
    }

    pub fn reports(&self) -> &ReportSink {
        &self.reports
    }

    /// Run `script` (relative to the repository) and record its duration.
    ///
    /// With `broken_msg`, a failing script is appended to the report named `broken_msg` and the outcome is a
    /// soft skip carrying that message.
    ///
    /// Error-log entries for transient failures name `script`.
    #[tracing::instrument(skip_all, fields(script = %script))]
    pub fn check_script(
        &self,
        script: &str,
        skip: &SkipSet,
        broken_msg: Option<&str>,
    ) -> Result<RunOutcome, CheckError> {
        // The executor runs from the script's directory, so the path handed to it must not be relative.
        let script_path = self.repository_dir.join(script);
        let script_path = path::absolute(&script_path).map_err(|source| CheckError::Read {
            path: script_path.clone(),
            source,
        })?;
        let source = fs::read_to_string(&script_path).map_err(|source| CheckError::Read {
            path: script_path.clone(),
            source,
        })?;
        let plotting = source.contains(PLOTTING_IMPORT);
        let working_dir = script_path.parent().unwrap_or(&self.repository_dir).to_path_buf();

        let start = Instant::now();
        let mut last_run = ScriptRun::default();
        let result = self.runner.run_safe_for(
            script,
            || {
                last_run = self.executor.execute(&script_path, &working_dir)?;
                Ok(())
            },
            skip,
        );

        let failure = match result {
            Ok(RunOutcome::Succeeded { attempts }) => {
                let seconds = start.elapsed().as_secs_f64();
                self.report(&format!("{seconds} for {script}"), SCRIPTS_RAN_REPORT)?;
                if !plotting || last_run.plots_shown > 0 {
                    return Ok(RunOutcome::Succeeded { attempts });
                }
                CheckError::NoPlotShown {
                    script: script.to_string(),
                }
            }
            Ok(skipped) => return Ok(skipped),
            Err(failure) => CheckError::Failed {
                script: script.to_string(),
                failure,
            },
        };

        match broken_msg {
            Some(message) => {
                self.report(script, message)?;
                tracing::info!(script, reason = message, "known broken script failed");
                Ok(RunOutcome::SoftSkipped {
                    reason: message.to_string(),
                })
            }
            None => {
                tracing::error!("Error on {script}");
                Err(failure)
            }
        }
    }

    fn report(&self, message: &str, file_name: &str) -> Result<(), CheckError> {
        self.reports
            .report(message, file_name)
            .map_err(|source| CheckError::Report {
                file_name: file_name.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    use testbase_core::FailureCategoryId;

    use super::*;

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _: Duration) {}
    }

    /// Replays a fixed sequence of results, repeating the last one.
    struct Scripted {
        results: Vec<Result<ScriptRun, Failure>>,
        calls: Cell<usize>,
        dirs: RefCell<Vec<PathBuf>>,
    }

    impl Scripted {
        fn new(results: Vec<Result<ScriptRun, Failure>>) -> Self {
            Self {
                results,
                calls: Cell::new(0),
                dirs: RefCell::new(Vec::new()),
            }
        }
    }

    impl ScriptExecutor for Scripted {
        fn execute(&self, _: &Path, working_dir: &Path) -> Result<ScriptRun, Failure> {
            let index = self.calls.get().min(self.results.len() - 1);
            self.calls.set(self.calls.get() + 1);
            self.dirs.borrow_mut().push(working_dir.to_path_buf());
            self.results[index].clone()
        }
    }

    fn repo(script: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("examples")).unwrap();
        fs::write(dir.path().join("examples/a.py"), script).unwrap();
        dir
    }

    fn checker<'a>(dir: &tempfile::TempDir, executor: &'a Scripted) -> ScriptChecker<&'a Scripted, NoSleep> {
        let config = RunnerConfig::for_test_dir(dir.path()).with_max_attempts(3);
        ScriptChecker::new(dir.path(), config)
            .with_executor(executor)
            .with_sleeper(NoSleep)
    }

    fn report(dir: &tempfile::TempDir, name: &str) -> Option<String> {
        fs::read_to_string(dir.path().join("global_reports").join(name)).ok()
    }

    #[test]
    fn success_is_timed_and_reported() {
        let dir = repo("print(1)\n");
        let executor = Scripted::new(vec![Ok(ScriptRun::default())]);
        let outcome = checker(&dir, &executor)
            .check_script("examples/a.py", &SkipSet::new(), None)
            .unwrap();
        assert_eq!(outcome, RunOutcome::Succeeded { attempts: 1 });
        let text = report(&dir, SCRIPTS_RAN_REPORT).unwrap();
        assert!(text.ends_with(" for examples/a.py\n"), "{text}");
        assert_eq!(*executor.dirs.borrow(), vec![path::absolute(dir.path().join("examples")).unwrap()]);
    }

    #[test]
    fn transient_failures_are_retried() {
        let dir = repo("print(1)\n");
        let executor = Scripted::new(vec![
            Err(Failure::new("spalloc.job.JobDestroyedError", "gone")),
            Ok(ScriptRun::default()),
        ]);
        let checker = checker(&dir, &executor);
        let outcome = checker.check_script("examples/a.py", &SkipSet::new(), None).unwrap();
        assert_eq!(outcome, RunOutcome::Succeeded { attempts: 2 });
        let log = checker.runner().error_log().read().unwrap().unwrap();
        assert_eq!(log, "examples/a.py\nspalloc.job.JobDestroyedError: gone\n");
    }

    #[test]
    fn plotting_script_must_show() {
        let dir = repo("import matplotlib.pyplot as plt\n");
        let executor = Scripted::new(vec![Ok(ScriptRun { plots_shown: 0 })]);
        let err = checker(&dir, &executor)
            .check_script("examples/a.py", &SkipSet::new(), None)
            .unwrap_err();
        assert!(matches!(err, CheckError::NoPlotShown { .. }));

        let executor = Scripted::new(vec![Ok(ScriptRun { plots_shown: 2 })]);
        assert!(
            checker(&dir, &executor)
                .check_script("examples/a.py", &SkipSet::new(), None)
                .is_ok()
        );
    }

    #[test]
    fn failure_without_broken_msg_propagates() {
        let dir = repo("raise ValueError()\n");
        let executor = Scripted::new(vec![Err(Failure::unclassified("ValueError", "bad"))]);
        let err = checker(&dir, &executor)
            .check_script("examples/a.py", &SkipSet::new(), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Error on examples/a.py: ValueError: bad");
        assert_eq!(report(&dir, SCRIPTS_RAN_REPORT), None);
    }

    #[test]
    fn broken_msg_turns_failure_into_report() {
        let dir = repo("raise ValueError()\n");
        let executor = Scripted::new(vec![Err(Failure::unclassified("ValueError", "bad"))]);
        let outcome = checker(&dir, &executor)
            .check_script("examples/a.py", &SkipSet::new(), Some("known_broken"))
            .unwrap();
        assert_eq!(
            outcome,
            RunOutcome::SoftSkipped {
                reason: "known_broken".into()
            }
        );
        assert_eq!(report(&dir, "known_broken").as_deref(), Some("examples/a.py\n"));
    }

    #[test]
    fn skip_set_applies_to_scripts() {
        let dir = repo("print(1)\n");
        let executor = Scripted::new(vec![Err(Failure::categorized(FailureCategoryId::Partition, "full"))]);
        let skip: SkipSet = [FailureCategoryId::Partition].into_iter().collect();
        let outcome = checker(&dir, &executor)
            .check_script("examples/a.py", &skip, None)
            .unwrap();
        assert!(outcome.is_skipped());
        assert_eq!(executor.calls.get(), 1);
    }

    #[test]
    fn missing_script_is_a_read_error() {
        let dir = repo("");
        let executor = Scripted::new(vec![Ok(ScriptRun::default())]);
        let err = checker(&dir, &executor)
            .check_script("examples/missing.py", &SkipSet::new(), None)
            .unwrap_err();
        assert!(matches!(err, CheckError::Read { .. }));
        assert_eq!(executor.calls.get(), 0);
    }
}
