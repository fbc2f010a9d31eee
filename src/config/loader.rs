// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::errors::Result;

/// Read and deserialize a pipeline file without validating it.
///
/// Use [`load_and_validate`] for anything that is going to be executed.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let pipeline: RawPipelineFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), tasks = pipeline.task.len(), "pipeline file parsed");

    Ok(pipeline)
}

/// Read a pipeline file and check it:
///
/// - at least one task,
/// - every `after` entry names a known task other than itself,
/// - every `wait_for_outputs` parses,
/// - no dependency cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let raw = load_from_path(&path)?;
    let pipeline = PipelineFile::try_from(raw)?;
    Ok(pipeline)
}

/// `Workflow.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Workflow.toml")
}
