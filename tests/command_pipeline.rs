// tests/command_pipeline.rs

#![cfg(unix)]

use std::sync::Arc;

use tokio::runtime::Handle;
use workflow_engine::cli::CliArgs;
use workflow_engine::engine::drive;
use workflow_engine::exec::{CommandTask, build_engine};
use workflow_engine::{EngineError, Task, TaskState, WorkflowEngine};
use workflow_engine_test_utils::builders::{PipelineFileBuilder, TaskConfigBuilder};
use workflow_engine_test_utils::monitor::RecordingMonitor;
use workflow_engine_test_utils::{init_tracing, with_timeout};

fn state_of(engine: &WorkflowEngine, name: &str) -> TaskState {
    engine
        .tasks()
        .iter()
        .find(|t| t.base().name().as_deref() == Some(name))
        .unwrap_or_else(|| panic!("no task named {name}"))
        .base()
        .state()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pipeline_runs_commands_in_dependency_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("order.log");
    let log = log.display();

    let pipeline = PipelineFileBuilder::new()
        .with_engine_id("order")
        .with_task("first", TaskConfigBuilder::new(&format!("echo first >> {log}")).build())
        .with_task(
            "second",
            TaskConfigBuilder::new(&format!("echo second >> {log}"))
                .after(&["first"])
                .build(),
        )
        .with_task(
            "third",
            TaskConfigBuilder::new(&format!("echo third >> {log}"))
                .after(&["second"])
                .build(),
        )
        .build();

    let mut engine = build_engine(&pipeline, Handle::current()).unwrap();
    with_timeout(drive(&mut engine)).await.unwrap();

    let written = std::fs::read_to_string(dir.path().join("order.log")).unwrap();
    assert_eq!(written, "first\nsecond\nthird\n");
    for name in ["first", "second", "third"] {
        assert_eq!(state_of(&engine, name), TaskState::CompletedSuccessfully);
    }
    assert!(
        engine.tasks()[0].base().executed_on_host().is_some(),
        "host recorded"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_command_fails_its_dependents() {
    let pipeline = PipelineFileBuilder::new()
        .with_task("broken", TaskConfigBuilder::new("exit 3").build())
        .with_task("after", TaskConfigBuilder::new("true").after(&["broken"]).build())
        .with_task("unrelated", TaskConfigBuilder::new("true").build())
        .build();

    let mut engine = build_engine(&pipeline, Handle::current()).unwrap();
    let recorder = Arc::new(RecordingMonitor::new());
    engine.add_monitor(recorder.clone());

    let err = with_timeout(drive(&mut engine)).await.unwrap_err();
    assert!(matches!(err, EngineError::TaskFailed(_)));
    assert!(err.to_string().contains("exited with code 3"), "{err}");

    assert_eq!(state_of(&engine, "broken"), TaskState::RunFailed);
    assert_eq!(state_of(&engine, "after"), TaskState::InitFailed);
    assert_eq!(state_of(&engine, "unrelated"), TaskState::CompletedSuccessfully);
    assert_eq!(recorder.engine_errors().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn declared_outputs_gate_success() {
    let dir = tempfile::tempdir().unwrap();
    let produced = dir.path().join("produced.txt");
    let missing = dir.path().join("missing.txt");

    let pipeline = PipelineFileBuilder::new()
        .with_task(
            "produces",
            TaskConfigBuilder::new(&format!("touch {}", produced.display()))
                .output(&produced)
                .wait_for_outputs("2s")
                .build(),
        )
        .with_task(
            "forgets",
            TaskConfigBuilder::new("true")
                .output(&missing)
                .wait_for_outputs("100ms")
                .build(),
        )
        .build();

    let mut engine = build_engine(&pipeline, Handle::current()).unwrap();
    let err = with_timeout(drive(&mut engine)).await.unwrap_err();

    assert!(err.to_string().contains("did not appear"), "{err}");
    assert!(err.to_string().contains("missing.txt"), "{err}");
    assert_eq!(state_of(&engine, "produces"), TaskState::CompletedSuccessfully);
    assert_eq!(state_of(&engine, "forgets"), TaskState::RunFailed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_command_fails_at_dispatch() {
    let mut engine = WorkflowEngine::new("empty-cmd");
    let task = Arc::new(CommandTask::new("blank", "   ", Handle::current()));
    engine.add_task(task.clone());

    let err = with_timeout(drive(&mut engine)).await.unwrap_err();
    assert!(err.to_string().contains("empty command"));
    assert_eq!(task.base().state(), TaskState::RunFailed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn command_is_submitted_only_once() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("count.log");
    let task = CommandTask::new(
        "once",
        format!("echo run >> {}", counter.display()),
        Handle::current(),
    );

    let mut engine = WorkflowEngine::new("once");
    let task = Arc::new(task);
    engine.add_task(task.clone());
    with_timeout(drive(&mut engine)).await.unwrap();

    // A second dispatch of the same body must not start another process.
    task.run().unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let written = std::fs::read_to_string(&counter).unwrap();
    assert_eq!(written.lines().count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cli_entry_point_runs_pipeline_and_writes_dot() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("Workflow.toml");
    let dot = dir.path().join("graph.dot");
    std::fs::write(
        &config,
        r#"
[engine]
id = "cli"

[task.a]
cmd = "true"

[task.b]
cmd = "true"
after = ["a"]
"#,
    )
    .unwrap();

    let args = CliArgs {
        config: config.clone(),
        log_level: None,
        dry_run: false,
        dot: Some(dot.clone()),
    };
    with_timeout(workflow_engine::run(args)).await.unwrap();

    let rendered = std::fs::read_to_string(&dot).unwrap();
    assert!(rendered.starts_with("digraph template {"));
    assert_eq!(rendered.matches("color=green").count(), 2);
    assert!(rendered.contains("\"node_0\" -> \"node_1\""));

    let dry = CliArgs {
        config,
        log_level: None,
        dry_run: true,
        dot: None,
    };
    workflow_engine::run(dry).await.unwrap();
}
