// src/config/validate.rs

use crate::config::duration::output_wait;
use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::dag::find_cycle;
use crate::errors::{EngineError, Result};

impl TryFrom<RawPipelineFile> for PipelineFile {
    type Error = EngineError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_pipeline(&raw)?;
        Ok(PipelineFile::new_unchecked(raw.engine, raw.task))
    }
}

fn validate_raw_pipeline(cfg: &RawPipelineFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_engine_section(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_durations(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(EngineError::ConfigError(
            "pipeline must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_engine_section(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.engine.id.trim().is_empty() {
        return Err(EngineError::ConfigError(
            "[engine].id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawPipelineFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == name {
                return Err(EngineError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(EngineError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_durations(cfg: &RawPipelineFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        output_wait(task.wait_for_outputs.as_deref()).map_err(|e| {
            EngineError::ConfigError(format!("task '{}': invalid `wait_for_outputs`: {}", name, e))
        })?;
    }
    Ok(())
}

fn validate_dag(cfg: &RawPipelineFile) -> Result<()> {
    // Edge direction: dep -> task.
    let nodes = cfg.task.keys().map(String::as_str);
    let edges = cfg.task.iter().flat_map(|(name, task)| {
        task.after
            .iter()
            .map(move |dep| (dep.as_str(), name.as_str()))
    });

    match find_cycle(nodes, edges) {
        None => Ok(()),
        Some(node) => Err(EngineError::DagCycle(format!(
            "cycle detected in task DAG involving task '{}'",
            node
        ))),
    }
}
