// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod monitor;
pub mod task;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::PipelineFile;
use crate::engine::drive;
use crate::exec::build_engine;
use crate::monitor::TracingMonitor;

pub use crate::engine::{ProgressReport, Resumer, WorkflowEngine};
pub use crate::errors::{EngineError, TaskError};
pub use crate::monitor::Monitor;
pub use crate::task::{Task, TaskBase, TaskIndex, TaskState};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the pipeline, builds one command task per entry,
/// drives the engine to completion on the current tokio runtime and
/// optionally writes the final graph as Graphviz.
pub async fn run(args: CliArgs) -> Result<()> {
    let pipeline = load_and_validate(&args.config)
        .with_context(|| format!("loading pipeline {}", args.config.display()))?;

    if args.dry_run {
        print_dry_run(&pipeline);
        return Ok(());
    }

    let mut engine = build_engine(&pipeline, tokio::runtime::Handle::current())?;
    engine.add_monitor(Arc::new(TracingMonitor::new()));

    let outcome = drive(&mut engine).await;
    info!(engine = %engine.id(), report = %engine.progress(), "run finished");

    if let Some(path) = &args.dot {
        tokio::fs::write(path, engine.dump_dot())
            .await
            .with_context(|| format!("writing dot file {}", path.display()))?;
        debug!(path = %path.display(), "dot file written");
    }

    outcome?;
    Ok(())
}

/// Simple dry-run output: print tasks, deps and commands.
fn print_dry_run(pipeline: &PipelineFile) {
    println!("workflow-engine dry-run");
    println!("  engine.id = {}", pipeline.engine_id());
    println!();

    println!("tasks ({}):", pipeline.tasks().len());
    for (name, task) in pipeline.tasks() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if let Some(ref description) = task.description {
            println!("      description: {description}");
        }
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if !task.outputs.is_empty() {
            println!("      outputs: {:?}", task.outputs);
        }
        if let Some(ref wait) = task.wait_for_outputs {
            println!("      wait_for_outputs: {wait}");
        }
    }

    debug!("dry-run complete (no execution)");
}
