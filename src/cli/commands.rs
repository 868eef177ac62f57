//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::{Path, PathBuf};

use crate::artifacts::{ProvenanceStore, read_placements};
use crate::checker::{PythonExecutor, ScriptChecker};
use crate::generator::{GENERATED_FILE_NAME, GenerateError, GeneratorConfig, ScriptTestGenerator};
use crate::runner::{ErrorLog, RunOutcome, RunnerConfig, SkipSet};

use super::{CliError, CliResult, ExitCode};

/// Integration-test directory the generated file lands in by default.
const INTEGRATION_DIR: &str = "integration_tests";

/// Arguments of `testbase generate`.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub dirs: Vec<PathBuf>,
    pub repo: PathBuf,
    pub output: Option<PathBuf>,
    pub header: Option<PathBuf>,
    pub tables: Option<PathBuf>,
    pub thorough: bool,
}

/// Arguments of `testbase check`.
#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub script: String,
    pub repo: PathBuf,
    pub config: Option<PathBuf>,
    pub skip: Vec<String>,
    pub broken: Option<String>,
    pub python: PathBuf,
}

// ============================================================================
// Generation
// ============================================================================

pub fn generate(args: &GenerateArgs) -> CliResult<ExitCode> {
    let mut config = match &args.tables {
        Some(path) => GeneratorConfig::load(path).map_err(render_generate_error)?,
        None => GeneratorConfig::default(),
    };
    if let Some(header) = &args.header {
        config = config.with_header(header);
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.repo.join(INTEGRATION_DIR).join(GENERATED_FILE_NAME));
    let generated = ScriptTestGenerator::new(config)
        .thorough(args.thorough)
        .write(&args.repo, &args.dirs, &output)
        .map_err(render_generate_error)?;

    println!(
        "Wrote {} ({} scripts tested, {} not tested)",
        output.display(),
        generated.tested,
        generated.not_tested
    );
    Ok(ExitCode::SUCCESS)
}

fn render_generate_error(err: GenerateError) -> CliError {
    CliError::failure(format!("{:?}", miette::Report::new(err)))
}

// ============================================================================
// Script checking
// ============================================================================

pub fn check(args: &CheckArgs) -> CliResult<ExitCode> {
    let config = load_runner_config(args.config.as_deref())?;
    let skip = parse_skip_set(&args.skip)?;
    let checker = ScriptChecker::new(&args.repo, config).with_executor(PythonExecutor::new(&args.python));

    match checker.check_script(&args.script, &skip, args.broken.as_deref()) {
        Ok(RunOutcome::Succeeded { attempts }) => {
            println!("{} passed (attempt {attempts})", args.script);
            Ok(ExitCode::SUCCESS)
        }
        Ok(RunOutcome::SoftSkipped { reason }) => {
            println!("{} skipped: {reason}", args.script);
            Ok(ExitCode::SKIPPED)
        }
        Err(e) => Err(CliError::failure(e.to_string())),
    }
}

/// Resolve exception names (optionally module-qualified) into a skip set.
///
/// A canonical category name skips the whole category; a subclass name skips only that subclass.
pub fn parse_skip_set(names: &[String]) -> CliResult<SkipSet> {
    let mut skip = SkipSet::new();
    for name in names {
        skip.insert_name(name)
            .ok_or_else(|| CliError::failure(format!("Error: unknown failure category '{name}'")))?;
    }
    Ok(skip)
}

fn load_runner_config(path: Option<&Path>) -> CliResult<RunnerConfig> {
    match path {
        Some(path) => RunnerConfig::load(path).map_err(|e| CliError::failure(format!("Error: {e}"))),
        None => Ok(RunnerConfig::from_env()),
    }
}

// ============================================================================
// Artifacts
// ============================================================================

pub fn error_log(config: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_runner_config(config)?;
    ErrorLog::new(config.error_file)
        .ensure_clean()
        .map_err(|e| CliError::failure(e.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

pub fn provenance(dir: &Path, pattern: &str) -> CliResult<ExitCode> {
    let store = ProvenanceStore::open(dir).map_err(|e| CliError::failure(format!("Error: {e}")))?;
    let text = store.query(pattern).map_err(|e| CliError::failure(format!("Error: {e}")))?;
    print!("{text}");
    Ok(ExitCode::SUCCESS)
}

pub fn placements(report_dir: &Path, label: &str) -> CliResult<ExitCode> {
    let placements = read_placements(report_dir, label).map_err(|e| CliError::failure(format!("Error: {e}")))?;
    for placement in placements {
        println!("{} {} {}", placement.x, placement.y, placement.p);
    }
    Ok(ExitCode::SUCCESS)
}
