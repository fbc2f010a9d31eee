// src/engine/shared.rs

//! Engine state reachable from completion callbacks.
//!
//! Tasks hold a `Weak<EngineShared>` and call in here from whatever thread
//! reports their completion. The task table is frozen when the engine
//! initializes; after that only the atomic counters, the ready-queue and the
//! last published report change.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, info};

use crate::engine::{ProgressReport, ReadyQueue, Resumer};
use crate::errors::TaskError;
use crate::monitor::{CombinedMonitor, Monitor, ProgressInfo};
use crate::task::{Task, TaskIndex, TaskState};

/// Running tallies updated by concurrent completions.
#[derive(Debug, Default)]
struct Counters {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    init_failed: AtomicUsize,
    running: AtomicUsize,
}

impl Counters {
    fn record(&self, old: TaskState, new: TaskState) {
        match new {
            TaskState::CompletedSuccessfully => {
                self.succeeded.fetch_add(1, Ordering::SeqCst);
            }
            TaskState::RunFailed => {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
            TaskState::InitFailed => {
                self.init_failed.fetch_add(1, Ordering::SeqCst);
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
            TaskState::Running => {
                self.running.fetch_add(1, Ordering::SeqCst);
            }
            TaskState::Ready | TaskState::Uninitialized => {}
        }
        // Only tasks that actually started leave the running tally.
        if old == TaskState::Running && new.is_terminal() {
            self.running.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn snapshot(&self, total: usize) -> ProgressReport {
        ProgressReport {
            total,
            running: self.running.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            init_failed: self.init_failed.load(Ordering::SeqCst),
        }
    }
}

pub(crate) struct EngineShared {
    id: String,
    tasks: OnceLock<Vec<Arc<dyn Task>>>,
    pub(crate) queue: ReadyQueue,
    pub(crate) monitor: CombinedMonitor,
    counters: Counters,
    initialized: AtomicBool,
    next_task_id: AtomicUsize,
    last_report: Mutex<Option<ProgressReport>>,
}

impl EngineShared {
    pub(crate) fn new(id: String) -> Self {
        Self {
            id,
            tasks: OnceLock::new(),
            queue: ReadyQueue::new(),
            monitor: CombinedMonitor::new(),
            counters: Counters::default(),
            initialized: AtomicBool::new(false),
            next_task_id: AtomicUsize::new(0),
            last_report: Mutex::new(None),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    /// Freeze the task table. Returns `false` if it was already frozen.
    pub(crate) fn freeze_tasks(&self, tasks: Vec<Arc<dyn Task>>) -> bool {
        self.tasks.set(tasks).is_ok()
    }

    pub(crate) fn tasks(&self) -> Option<&[Arc<dyn Task>]> {
        self.tasks.get().map(Vec::as_slice)
    }

    fn task(&self, index: TaskIndex) -> Option<&Arc<dyn Task>> {
        self.tasks.get()?.get(index.get())
    }

    fn total(&self) -> usize {
        self.tasks.get().map_or(0, Vec::len)
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    /// `name` with whitespace replaced, plus a per-engine sequence number.
    pub(crate) fn new_task_id(&self, name: &str) -> String {
        let n = self.next_task_id.fetch_add(1, Ordering::SeqCst) + 1;
        let sanitized: String = name
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        format!("{sanitized}:{n}")
    }

    pub(crate) fn progress(&self) -> ProgressReport {
        self.counters.snapshot(self.total())
    }

    /// Every registered task is terminal.
    pub(crate) fn all_terminal(&self) -> bool {
        self.tasks.get().is_some() && self.progress().is_finished()
    }

    /// Publish the current counts if they changed since the last report.
    ///
    /// Returns whether every task is terminal.
    pub(crate) fn update_progress(&self) -> bool {
        let report = self.progress();
        let changed = {
            let mut last = self
                .last_report
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if last.as_ref() == Some(&report) {
                false
            } else {
                *last = Some(report);
                true
            }
        };
        if changed {
            debug!(engine = %self.id, %report, "progress changed");
            self.monitor.update_statistics(&report);
        }
        report.is_finished()
    }

    pub(crate) fn register_resumer(&self, resumer: Box<dyn Resumer>) {
        if let Some(resumer) = self.queue.register(resumer, || self.all_terminal()) {
            resumer.resume();
        }
    }

    fn wake(&self) {
        if let Some(resumer) = self.queue.take_resumer() {
            resumer.resume();
        }
    }

    /// A task's name or description changed.
    pub(crate) fn task_changed(&self, index: TaskIndex) {
        if let Some(task) = self.task(index) {
            self.monitor.task_change(task.as_ref());
        }
    }

    pub(crate) fn task_error(&self, index: TaskIndex, error: &TaskError) {
        if let Some(task) = self.task(index) {
            self.monitor.task_error(task.as_ref(), error);
        }
    }

    pub(crate) fn task_progress(&self, index: TaskIndex, progress: &ProgressInfo) {
        if let Some(task) = self.task(index) {
            self.monitor.task_progress(task.as_ref(), progress);
        }
    }

    /// Called by a task after it changed state (never under its lock).
    ///
    /// Tallies the transition, notifies monitors, then either releases the
    /// task's dependents (terminal states) or queues it (`Ready`).
    pub(crate) fn after_task_state_change(&self, index: TaskIndex, old: TaskState, new: TaskState) {
        if old == new {
            return;
        }
        self.counters.record(old, new);

        let Some(task) = self.task(index) else {
            return;
        };
        self.monitor.task_change(task.as_ref());

        if new.is_terminal() {
            let succeeded = new == TaskState::CompletedSuccessfully;
            for dependent in task.base().outputs() {
                if let Some(dependent) = self.task(dependent) {
                    dependent.base().input_done(succeeded);
                }
            }

            if self.update_progress() {
                info!(engine = %self.id, "all tasks finished");
                self.wake();
            }
        } else if new == TaskState::Ready {
            // Tasks readied during initialization don't wake anyone; the
            // driver is about to drain them.
            if let Some(resumer) = self.queue.push(index, self.is_initialized()) {
                resumer.resume();
            }
        }
    }
}
