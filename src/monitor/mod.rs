// src/monitor/mod.rs

//! Observers of a workflow run.
//!
//! - [`Monitor`] is the observer trait; every method has a no-op default so
//!   implementations only override the events they care about.
//! - [`CombinedMonitor`] fans every event out to a list of subscribers.
//! - [`tracing_monitor`] provides a monitor that logs events via `tracing`.

pub mod tracing_monitor;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use tracing::error;

use crate::engine::ProgressReport;
use crate::errors::{EngineError, TaskError};
use crate::task::Task;

pub use tracing_monitor::TracingMonitor;

/// Task-specific progress payload, opaque to the engine.
pub type ProgressInfo = dyn Any + Send + Sync;

/// Receives every state, progress and error event of a run.
///
/// Events are delivered from whichever thread caused them, so
/// implementations must be thread-safe.
pub trait Monitor: Send + Sync {
    /// Aggregate counts changed.
    fn update_statistics(&self, _report: &ProgressReport) {}

    /// A task changed state, name or description.
    fn task_change(&self, _task: &dyn Task) {}

    /// A task failed with `error`. Followed by a `task_change`.
    fn task_error(&self, _task: &dyn Task, _error: &TaskError) {}

    /// A task reported a progress payload.
    fn task_progress(&self, _task: &dyn Task, _progress: &ProgressInfo) {}

    /// The run as a whole failed.
    fn error(&self, _error: &EngineError) {}
}

/// Fan-out to an ordered list of monitors.
///
/// A subscriber that panics is logged and skipped; the remaining
/// subscribers still receive the event.
#[derive(Default)]
pub struct CombinedMonitor {
    monitors: RwLock<Vec<Arc<dyn Monitor>>>,
}

impl CombinedMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_monitor(&self, monitor: Arc<dyn Monitor>) {
        self.monitors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(monitor);
    }

    pub fn monitors(&self) -> Vec<Arc<dyn Monitor>> {
        self.monitors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.monitors().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn for_each(&self, event: &'static str, deliver: impl Fn(&dyn Monitor)) {
        // Deliver from a snapshot so subscribers may add monitors.
        for monitor in self.monitors() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| deliver(monitor.as_ref())));
            if let Err(payload) = outcome {
                error!(
                    monitor_event = event,
                    panic = %panic_message(payload.as_ref()),
                    "monitor panicked; continuing with remaining monitors"
                );
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

impl Monitor for CombinedMonitor {
    fn update_statistics(&self, report: &ProgressReport) {
        self.for_each("update_statistics", |m| m.update_statistics(report));
    }

    fn task_change(&self, task: &dyn Task) {
        self.for_each("task_change", |m| m.task_change(task));
    }

    fn task_error(&self, task: &dyn Task, error: &TaskError) {
        self.for_each("task_error", |m| m.task_error(task, error));
    }

    fn task_progress(&self, task: &dyn Task, progress: &ProgressInfo) {
        self.for_each("task_progress", |m| m.task_progress(task, progress));
    }

    fn error(&self, error: &EngineError) {
        self.for_each("error", |m| m.error(error));
    }
}
