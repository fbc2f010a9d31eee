// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use workflow_engine::config::{PipelineFile, load_and_validate, load_from_path};
use workflow_engine::errors::EngineError;
use workflow_engine_test_utils::builders::{PipelineFileBuilder, TaskConfigBuilder};

fn pipeline_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_valid_pipeline_loads() {
    let file = pipeline_file(
        r#"
[engine]
id = "nightly"

[task.fetch]
cmd = "echo fetch"
description = "Download input"
outputs = ["data.csv"]
wait_for_outputs = "30s"

[task.process]
cmd = "echo process"
after = ["fetch"]
"#,
    );

    let pipeline = load_and_validate(file.path()).unwrap();
    assert_eq!(pipeline.engine_id(), "nightly");
    assert_eq!(pipeline.tasks().len(), 2);

    let fetch = pipeline.task("fetch").unwrap();
    assert_eq!(fetch.description.as_deref(), Some("Download input"));
    assert_eq!(fetch.outputs.len(), 1);
    assert_eq!(
        workflow_engine::config::parse_duration(fetch.wait_for_outputs.as_deref().unwrap()),
        Ok(Duration::from_secs(30))
    );
    assert_eq!(pipeline.task("process").unwrap().after, vec!["fetch".to_string()]);
}

#[test]
fn test_engine_id_defaults() {
    let file = pipeline_file(
        r#"
[task.only]
cmd = "true"
"#,
    );
    let pipeline = load_and_validate(file.path()).unwrap();
    assert_eq!(pipeline.engine_id(), "workflow");
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let file = pipeline_file(
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
        Err(EngineError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    let file = pipeline_file(
        r#"
[task.A]
cmd = "echo A"
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(EngineError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency 'NonExistent'"));
        }
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_self_dependency_returns_config_error() {
    let raw = PipelineFileBuilder::new()
        .with_task("A", TaskConfigBuilder::new("echo A").after(&["A"]).build())
        .build_raw();

    match PipelineFile::try_from(raw) {
        Err(EngineError::ConfigError(msg)) => assert!(msg.contains("cannot depend on itself")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_empty_pipeline_is_rejected() {
    let file = pipeline_file("[engine]\nid = \"nothing\"\n");
    match load_and_validate(file.path()) {
        Err(EngineError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_blank_engine_id_is_rejected() {
    let raw = PipelineFileBuilder::new()
        .with_engine_id("  ")
        .with_task("A", TaskConfigBuilder::new("echo A").build())
        .build_raw();
    assert!(matches!(
        PipelineFile::try_from(raw),
        Err(EngineError::ConfigError(_))
    ));
}

#[test]
fn test_bad_duration_is_rejected() {
    let raw = PipelineFileBuilder::new()
        .with_task(
            "A",
            TaskConfigBuilder::new("echo A")
                .output("a.txt")
                .wait_for_outputs("soon")
                .build(),
        )
        .build_raw();

    match PipelineFile::try_from(raw) {
        Err(EngineError::ConfigError(msg)) => {
            assert!(msg.contains("task 'A'"));
            assert!(msg.contains("wait_for_outputs"));
        }
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_invalid_toml_returns_toml_error() {
    let file = pipeline_file("[task.A\ncmd = ");
    assert!(matches!(
        load_from_path(file.path()),
        Err(EngineError::TomlError(_))
    ));
}

#[test]
fn test_missing_cmd_returns_toml_error() {
    let file = pipeline_file("[task.A]\nafter = []\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(EngineError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Workflow.toml"));
    assert!(matches!(result, Err(EngineError::IoError(_))));
}

#[test]
fn test_builder_produces_valid_pipeline() {
    let pipeline = PipelineFileBuilder::new()
        .with_engine_id("built")
        .with_task("a", TaskConfigBuilder::new("echo a").description("first").build())
        .with_task("b", TaskConfigBuilder::new("echo b").after(&["a"]).build())
        .build();
    assert_eq!(pipeline.engine_id(), "built");
    assert_eq!(pipeline.tasks().keys().collect::<Vec<_>>(), vec!["a", "b"]);
}
