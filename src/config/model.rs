// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Pipeline file as read from TOML, before validation.
///
/// ```toml
/// [engine]
/// id = "nightly"
///
/// [task.fetch]
/// cmd = "curl -o data.csv https://example.org/data.csv"
/// outputs = ["data.csv"]
///
/// [task.process]
/// cmd = "python process.py data.csv"
/// after = ["fetch"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineFile {
    #[serde(default)]
    pub engine: EngineSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Engine id, the prefix of every task's full id.
    #[serde(default = "default_engine_id")]
    pub id: String,
}

fn default_engine_id() -> String {
    "workflow".to_string()
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            id: default_engine_id(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command to execute.
    pub cmd: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Tasks that must succeed before this one runs.
    #[serde(default)]
    pub after: Vec<String>,

    /// Files the command is expected to produce. The task only succeeds once
    /// all of them exist.
    #[serde(default)]
    pub outputs: Vec<PathBuf>,

    /// How long to wait for `outputs` after the command exits (e.g. `"30s"`).
    /// Defaults to two minutes.
    #[serde(default)]
    pub wait_for_outputs: Option<String>,
}

/// A validated pipeline: non-empty, every dependency known, acyclic, every
/// duration parseable.
#[derive(Debug, Clone)]
pub struct PipelineFile {
    engine: EngineSection,
    task: BTreeMap<String, TaskConfig>,
}

impl PipelineFile {
    /// Wrap already-validated parts. Use `PipelineFile::try_from` otherwise.
    pub(crate) fn new_unchecked(engine: EngineSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { engine, task }
    }

    pub fn engine_id(&self) -> &str {
        &self.engine.id
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }
}
