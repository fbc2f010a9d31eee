// src/exec/pipeline.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use crate::config::PipelineFile;
use crate::config::duration::output_wait;
use crate::engine::WorkflowEngine;
use crate::errors::{EngineError, Result};
use crate::exec::CommandTask;
use crate::task::{Task, TaskIndex};

/// Build an engine with one [`CommandTask`] per `[task.<name>]`, wired by
/// each task's `after` list. Processes are spawned on `handle`.
pub fn build_engine(pipeline: &PipelineFile, handle: Handle) -> Result<WorkflowEngine> {
    let mut engine = WorkflowEngine::new(pipeline.engine_id());
    let mut indices: HashMap<&str, TaskIndex> = HashMap::new();

    for (name, cfg) in pipeline.tasks() {
        let wait = output_wait(cfg.wait_for_outputs.as_deref()).map_err(|e| {
            EngineError::ConfigError(format!("task '{}': invalid `wait_for_outputs`: {}", name, e))
        })?;
        let mut task = CommandTask::new(name.as_str(), cfg.cmd.as_str(), handle.clone())
            .with_outputs(cfg.outputs.clone(), wait);
        if let Some(description) = &cfg.description {
            task = task.with_description(description.as_str());
        }
        let task: Arc<dyn Task> = Arc::new(task);
        indices.insert(name.as_str(), engine.add_task(task));
    }

    for (name, cfg) in pipeline.tasks() {
        let dependent = indices[name.as_str()];
        for dep in &cfg.after {
            let dependency = indices.get(dep.as_str()).copied().ok_or_else(|| {
                EngineError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                ))
            })?;
            engine.add_dependency(dependent, dependency);
        }
    }

    debug!(engine = %engine.id(), tasks = engine.num_tasks(), "engine built from pipeline");
    Ok(engine)
}
