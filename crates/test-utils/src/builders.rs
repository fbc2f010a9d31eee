#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use workflow_engine::config::{EngineSection, PipelineFile, RawPipelineFile, TaskConfig};

/// Builder for `PipelineFile` to simplify test setup.
pub struct PipelineFileBuilder {
    pipeline: RawPipelineFile,
}

impl PipelineFileBuilder {
    pub fn new() -> Self {
        Self {
            pipeline: RawPipelineFile {
                engine: EngineSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_engine_id(mut self, id: &str) -> Self {
        self.pipeline.engine.id = id.to_string();
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.pipeline.task.insert(name.to_string(), task);
        self
    }

    /// The unvalidated pipeline, for tests that expect validation to fail.
    pub fn build_raw(self) -> RawPipelineFile {
        self.pipeline
    }

    pub fn build(self) -> PipelineFile {
        PipelineFile::try_from(self.pipeline).expect("Failed to build valid pipeline from builder")
    }
}

impl Default for PipelineFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                description: None,
                after: Vec::new(),
                outputs: Vec::new(),
                wait_for_outputs: None,
            },
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.task.description = Some(description.to_string());
        self
    }

    pub fn after(mut self, deps: &[&str]) -> Self {
        self.task.after = deps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.task.outputs.push(path.into());
        self
    }

    pub fn wait_for_outputs(mut self, wait: &str) -> Self {
        self.task.wait_for_outputs = Some(wait.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
