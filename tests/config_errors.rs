// tests/config_errors.rs

use std::io::Write;

use tempfile::NamedTempFile;

use buildwatch::config::{load_and_validate, ConfigFile, InputSpec};
use buildwatch::dag::DagGraph;
use buildwatch::errors::BuildwatchError;
use buildwatch_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
after = ["B"]

[task.B]
cmd = "echo B"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(BuildwatchError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        other => panic!("expected DagCycle, got {other:?}"),
    }
}

#[test]
fn unknown_dependency_is_a_config_error() {
    let raw = ConfigFileBuilder::new()
        .with_task("link", TaskConfigBuilder::new("ld").after("compile").build())
        .raw();

    match ConfigFile::try_from(raw) {
        Err(BuildwatchError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency 'compile'"), "{msg}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn invalid_input_glob_is_reported_with_its_task() {
    let raw = ConfigFileBuilder::new()
        .with_task(
            "compile",
            TaskConfigBuilder::new("cc")
                .input(InputSpec::Union {
                    union: vec![InputSpec::Dir {
                        dir: "src".into(),
                        include: vec!["**/[.c".to_string()],
                        exclude: vec![],
                    }],
                })
                .build(),
        )
        .raw();

    match ConfigFile::try_from(raw) {
        Err(BuildwatchError::ConfigError(msg)) => {
            assert!(msg.contains("task 'compile' inputs"), "{msg}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn empty_config_is_rejected() {
    let file = write_config("[watch]\nexclude = []\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(BuildwatchError::ConfigError(_))
    ));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[task.A\ncmd = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(BuildwatchError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("Buildwatch.toml")),
        Err(BuildwatchError::IoError(_))
    ));
}

#[test]
fn watch_excludes_default_to_build_and_metadata_dirs() {
    let file = write_config(
        r#"
[task.compile]
cmd = "make"
inputs = [{ dir = "src", include = ["**/*.c"] }, { file = "Makefile" }]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.watch_section().exclude, ["build/**", ".buildwatch/**"]);
    assert_eq!(cfg.tasks()["compile"].inputs.len(), 2);
}

#[test]
fn requesting_an_unknown_task_fails() {
    let cfg = ConfigFileBuilder::new()
        .with_task("compile", TaskConfigBuilder::new("cc").build())
        .build();

    let err = DagGraph::from_config(&cfg)
        .execution_order(&["deploy".to_string()])
        .unwrap_err();
    assert!(matches!(err, BuildwatchError::TaskNotFound(name) if name == "deploy"));
}
