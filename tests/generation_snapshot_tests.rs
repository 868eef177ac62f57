//! Golden snapshot tests for script test generation
//!
//! These tests run the generator over the fixture repository in `tests/fixtures/scripts_repo` and compare the
//! generated file against stored snapshots.
//!
//! Run with: `cargo test --test generation_snapshot_tests`
//! Review changes: `cargo insta review`

use std::fs;
use std::path::{Path, PathBuf};

use testbase::generator::{DEFAULT_HEADER, GENERATED_FILE_NAME, GeneratorConfig, ScriptTestGenerator};

fn fixture_repo() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/scripts_repo")
}

fn fixture_tables() -> GeneratorConfig {
    GeneratorConfig::new()
        .with_exception("broken_board.py", "Needs a 48 chip board")
        .with_too_long("long_sim.py", "10 minutes")
        .with_skip_exceptions("uses-dash.py", ["from spalloc.job import JobDestroyedError"])
}

#[test]
fn test_fixture_repo_generation() {
    let generated = ScriptTestGenerator::new(fixture_tables())
        .generate(&fixture_repo(), &["examples"])
        .expect("generation failed");
    assert_eq!(generated.tested, 4);
    assert_eq!(generated.not_tested, 2);
    insta::assert_snapshot!("fixture_repo", generated.source);
}

#[test]
fn test_thorough_suppresses_long_scripts() {
    let generated = ScriptTestGenerator::new(fixture_tables())
        .thorough(true)
        .generate(&fixture_repo(), &["examples"])
        .expect("generation failed");
    assert!(!generated.source.contains("def test_examples_long_sim(self):"));
    assert!(
        generated
            .source
            .contains("    # Not testing file due to: 10 minutes\n    # examples/long_sim.py\n")
    );
    assert!(!generated.source.contains("# Warning this test takes"));
    assert_eq!(generated.tested, 3);
}

#[test]
fn test_hidden_and_package_files_are_skipped() {
    let generated = ScriptTestGenerator::new(GeneratorConfig::default())
        .generate(&fixture_repo(), &["examples"])
        .expect("generation failed");
    assert!(!generated.source.contains("checkpoint"));
    assert!(!generated.source.contains("__init__"));
    assert!(!generated.source.contains("notes"));
}

#[test]
fn test_custom_header_replaces_default() {
    let dir = tempfile::tempdir().unwrap();
    let header = dir.path().join("header.py");
    fs::write(&header, "class TestScripts(object):\n").unwrap();

    let generated = ScriptTestGenerator::new(GeneratorConfig::new().with_header(&header))
        .generate(&fixture_repo(), &["examples/synfire"])
        .expect("generation failed");
    assert!(generated.source.starts_with("class TestScripts(object):\n\n    def test_"));
    assert!(!generated.source.contains(DEFAULT_HEADER));
}

#[test]
fn test_create_test_scripts_in_integration_dir() {
    let dir = tempfile::tempdir().unwrap();
    let examples = dir.path().join("examples");
    fs::create_dir_all(&examples).unwrap();
    fs::create_dir_all(dir.path().join("integration_tests")).unwrap();
    fs::copy(
        fixture_repo().join("examples/standalone_main.py"),
        examples.join("standalone_main.py"),
    )
    .unwrap();

    ScriptTestGenerator::new(GeneratorConfig::default())
        .create_test_scripts(&dir.path().join("integration_tests"), &["examples"])
        .expect("generation failed");
    let written = fs::read_to_string(dir.path().join("integration_tests").join(GENERATED_FILE_NAME)).unwrap();
    assert!(written.ends_with("    # Not testing file due to: Unhandled main\n    # examples/standalone_main.py\n"));
}
