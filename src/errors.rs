// src/errors.rs

//! Crate-wide error types.
//!
//! Task bodies work with `anyhow::Result`; once a failure is attributed to a
//! task it is captured as a [`TaskError`], which is cheap to clone so both the
//! task (as its `last_error`) and the final aggregate can hold it.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Exactly one task captured an error; it is surfaced as-is.
    #[error(transparent)]
    TaskFailed(TaskError),

    /// Several tasks failed (or failures carried no captured error).
    #[error("{}", composite_message(.failed, .causes))]
    Composite { failed: usize, causes: Vec<TaskError> },

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// Every captured task error carried by this failure.
    pub fn causes(&self) -> Vec<TaskError> {
        match self {
            EngineError::TaskFailed(err) => vec![err.clone()],
            EngineError::Composite { causes, .. } => causes.clone(),
            _ => Vec::new(),
        }
    }
}

fn composite_message(failed: &usize, causes: &[TaskError]) -> String {
    if causes.is_empty() {
        return format!("workflow failed: {failed} task(s) did not complete successfully");
    }
    let details: Vec<String> = causes.iter().map(|c| c.to_string()).collect();
    format!(
        "workflow failed: {failed} task(s) did not complete successfully: {}",
        details.join("; ")
    )
}

/// A failure captured from a single task.
#[derive(Clone)]
pub struct TaskError(Arc<anyhow::Error>);

impl TaskError {
    pub fn new(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }

    pub fn same_as(&self, other: &TaskError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err)
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, EngineError>;
