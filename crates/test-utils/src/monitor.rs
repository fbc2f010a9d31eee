use std::sync::Mutex;

use workflow_engine::errors::TaskError;
use workflow_engine::monitor::ProgressInfo;
use workflow_engine::{EngineError, Monitor, ProgressReport, Task, TaskState};

/// One event seen by a [`RecordingMonitor`].
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Statistics(ProgressReport),
    TaskChange { task: String, state: TaskState },
    TaskError { task: String, message: String },
    TaskProgress { task: String },
    Error(String),
}

/// Records every event it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingMonitor {
    events: Mutex<Vec<MonitorEvent>>,
}

impl RecordingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: MonitorEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().unwrap().clone()
    }

    /// States reported for `task`, in delivery order.
    pub fn states_of(&self, task: &str) -> Vec<TaskState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MonitorEvent::TaskChange { task: t, state } if t == task => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn task_errors(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MonitorEvent::TaskError { task, message } => Some((task, message)),
                _ => None,
            })
            .collect()
    }

    pub fn engine_errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MonitorEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn last_report(&self) -> Option<ProgressReport> {
        self.events().into_iter().rev().find_map(|e| match e {
            MonitorEvent::Statistics(report) => Some(report),
            _ => None,
        })
    }

    pub fn progress_events(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, MonitorEvent::TaskProgress { .. }))
            .count()
    }
}

impl Monitor for RecordingMonitor {
    fn update_statistics(&self, report: &ProgressReport) {
        self.push(MonitorEvent::Statistics(*report));
    }

    fn task_change(&self, task: &dyn Task) {
        let base = task.base();
        self.push(MonitorEvent::TaskChange {
            task: base.label(),
            state: base.state(),
        });
    }

    fn task_error(&self, task: &dyn Task, error: &TaskError) {
        self.push(MonitorEvent::TaskError {
            task: task.base().label(),
            message: error.to_string(),
        });
    }

    fn task_progress(&self, task: &dyn Task, _progress: &ProgressInfo) {
        self.push(MonitorEvent::TaskProgress {
            task: task.base().label(),
        });
    }

    fn error(&self, error: &EngineError) {
        self.push(MonitorEvent::Error(error.to_string()));
    }
}

/// A monitor that panics on every event.
#[derive(Debug, Default)]
pub struct PanickingMonitor;

impl Monitor for PanickingMonitor {
    fn update_statistics(&self, _report: &ProgressReport) {
        panic!("statistics subscriber exploded");
    }

    fn task_change(&self, _task: &dyn Task) {
        panic!("task-change subscriber exploded");
    }

    fn error(&self, _error: &EngineError) {
        panic!("error subscriber exploded");
    }
}
