// src/monitor/tracing_monitor.rs

use tracing::{debug, error, info, warn};

use crate::engine::ProgressReport;
use crate::errors::{EngineError, TaskError};
use crate::monitor::{Monitor, ProgressInfo};
use crate::task::Task;

/// Logs every run event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMonitor;

impl TracingMonitor {
    pub fn new() -> Self {
        Self
    }
}

impl Monitor for TracingMonitor {
    fn update_statistics(&self, report: &ProgressReport) {
        info!(
            total = report.total,
            running = report.running,
            succeeded = report.succeeded,
            failed = report.failed,
            init_failed = report.init_failed,
            "{report}"
        );
    }

    fn task_change(&self, task: &dyn Task) {
        let base = task.base();
        debug!(
            task = %base.label(),
            id = ?base.full_id(),
            state = %base.state(),
            "task changed"
        );
    }

    fn task_error(&self, task: &dyn Task, error: &TaskError) {
        warn!(task = %task.base().label(), error = %error, "task failed");
    }

    fn task_progress(&self, task: &dyn Task, _progress: &ProgressInfo) {
        debug!(task = %task.base().label(), "task reported progress");
    }

    fn error(&self, error: &EngineError) {
        error!(error = %error, "workflow failed");
    }
}
