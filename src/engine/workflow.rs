// src/engine/workflow.rs

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::dag::ensure_acyclic;
use crate::engine::dot;
use crate::engine::shared::EngineShared;
use crate::engine::{ProgressReport, Resumer};
use crate::errors::{EngineError, Result};
use crate::monitor::{Monitor, panic_message};
use crate::task::{Task, TaskIndex, TaskState};

/// Drives a set of interdependent tasks to completion.
///
/// Usage:
/// 1. register tasks with [`add_task`](Self::add_task) and wire them with
///    [`add_dependency`](Self::add_dependency);
/// 2. call [`run`](Self::run) repeatedly from one thread. Each call
///    dispatches every task that is ready right now and returns whether the
///    whole run is finished;
/// 3. when a step leaves no work ([`is_work_available`](Self::is_work_available)
///    is false), park on [`resume_on_work`](Self::resume_on_work) instead of
///    polling.
///
/// Task bodies report completion from any thread; those callbacks queue
/// newly-ready dependents and wake the registered resumer.
pub struct WorkflowEngine {
    shared: Arc<EngineShared>,
    /// Registered tasks, until `initialize` freezes them into `shared`.
    pending: Vec<Arc<dyn Task>>,
    done: bool,
}

impl WorkflowEngine {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(EngineShared::new(id.into())),
            pending: Vec::new(),
            done: false,
        }
    }

    pub fn id(&self) -> &str {
        self.shared.id()
    }

    fn assert_registration_open(&self, what: &str) {
        assert!(
            !self.shared.is_initialized() && self.shared.tasks().is_none(),
            "engine '{}': {what} is only allowed before the first run()",
            self.id()
        );
    }

    /// Register a task. Only allowed before the first [`run`](Self::run).
    pub fn add_task(&mut self, task: Arc<dyn Task>) -> TaskIndex {
        self.assert_registration_open("add_task");
        let index = TaskIndex(self.pending.len());
        task.base().attach_slot(index);
        self.pending.push(task);
        index
    }

    pub fn add_all_tasks<I>(&mut self, tasks: I) -> Vec<TaskIndex>
    where
        I: IntoIterator<Item = Arc<dyn Task>>,
    {
        tasks.into_iter().map(|task| self.add_task(task)).collect()
    }

    /// Make `dependent` wait for `dependency`.
    ///
    /// Adding an existing edge again has no effect. Cycles are not checked
    /// here; the first `run()` rejects them.
    pub fn add_dependency(&mut self, dependent: TaskIndex, dependency: TaskIndex) {
        self.assert_registration_open("add_dependency");
        let dependent_base = self.pending[dependent.get()].base();
        let dependency_base = self.pending[dependency.get()].base();
        if !dependency_base.has_output(dependent) {
            dependent_base.push_input(dependency);
            dependency_base.push_output(dependent);
        }
    }

    pub fn add_monitor(&self, monitor: Arc<dyn Monitor>) {
        self.shared.monitor.add_monitor(monitor);
    }

    pub fn tasks(&self) -> &[Arc<dyn Task>] {
        self.shared.tasks().unwrap_or(&self.pending)
    }

    pub fn task(&self, index: TaskIndex) -> Option<&Arc<dyn Task>> {
        self.tasks().get(index.get())
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks().len()
    }

    pub fn progress(&self) -> ProgressReport {
        match self.shared.tasks() {
            Some(_) => self.shared.progress(),
            None => ProgressReport {
                total: self.pending.len(),
                ..ProgressReport::default()
            },
        }
    }

    /// True once a [`run`](Self::run) step has observed every task terminal.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// True if at least one task is waiting to be dispatched.
    pub fn is_work_available(&self) -> bool {
        !self.shared.queue.is_empty()
    }

    /// Invoke `resumer` once there is work to do.
    ///
    /// If work is queued already (or the run has finished) the resumer runs
    /// immediately on this thread. Otherwise it is stored and invoked exactly
    /// once, by the next task to become ready or by the final completion.
    /// Registering replaces any resumer stored earlier.
    pub fn resume_on_work<R: Resumer>(&self, resumer: R) {
        self.shared.register_resumer(Box::new(resumer));
    }

    /// Tell the monitors about a failure that happened outside the engine.
    pub fn report_error(&self, error: &EngineError) {
        // CombinedMonitor already isolates panicking subscribers.
        self.shared.monitor.error(error);
        debug!(engine = %self.id(), error = %error, "external error reported to monitors");
    }

    /// Graphviz rendering of the tasks, their states and dependencies.
    pub fn dump_dot(&self) -> String {
        dot::render(self.tasks())
    }

    /// Run one scheduling step.
    ///
    /// The first call validates the graph and readies every task without
    /// inputs. Each call then dispatches everything in the ready-queue and
    /// returns `Ok(true)` once every task is terminal. If the finished run
    /// contains failures, that step returns the aggregate error instead.
    /// Calls after the run finished do nothing and return `Ok(true)`.
    ///
    /// Errors returned from here are also reported to the monitors.
    pub fn run(&mut self) -> Result<bool> {
        if self.done {
            return Ok(true);
        }
        self.step().inspect_err(|err| self.shared.monitor.error(err))
    }

    fn step(&mut self) -> Result<bool> {
        if !self.shared.is_initialized() {
            self.initialize()?;
            self.shared.update_progress();
            self.shared.mark_initialized();
        }

        let batch = self.shared.queue.drain();
        if !batch.is_empty() {
            debug!(engine = %self.id(), tasks = batch.len(), "dispatching ready tasks");
        }
        for index in batch {
            self.dispatch(index);
        }

        self.done = self.shared.update_progress();
        if self.done {
            let report = self.shared.progress();
            info!(engine = %self.id(), %report, "workflow finished");
            self.aggregate_outcome()?;
        }
        Ok(self.done)
    }

    fn initialize(&mut self) -> Result<()> {
        ensure_acyclic(&self.pending)?;

        let tasks = std::mem::take(&mut self.pending);
        if !self.shared.freeze_tasks(tasks) {
            panic!("engine '{}' initialized twice", self.id());
        }
        let tasks = self.shared.tasks().unwrap_or_default();

        for task in tasks {
            task.base().attach_engine(&self.shared);
        }
        for task in tasks {
            if task.base().inputs().is_empty() {
                task.base().set_state(TaskState::Ready);
            }
        }

        info!(
            engine = %self.id(),
            tasks = tasks.len(),
            ready = self.shared.queue.len(),
            "workflow engine initialized"
        );
        Ok(())
    }

    fn dispatch(&self, index: TaskIndex) {
        let Some(task) = self.task(index) else {
            return;
        };
        let base = task.base();
        match base.state() {
            TaskState::Ready => base.set_state(TaskState::Running),
            // Queued again while in flight; the body decides whether a
            // second run() does anything.
            TaskState::Running => {
                debug!(task = %base.label(), "re-dispatching running task");
            }
            TaskState::Uninitialized => {
                panic!("task '{}' was queued before it became ready", base.label())
            }
            state @ (TaskState::CompletedSuccessfully | TaskState::RunFailed | TaskState::InitFailed) => {
                debug!(task = %base.label(), %state, "skipping queued task that already finished");
                return;
            }
        }

        let err = match panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(payload) => anyhow!("task panicked: {}", panic_message(payload.as_ref())),
        };
        if base.is_done() {
            debug!(task = %base.label(), error = %err, "task already finished; dropping run error");
            return;
        }
        warn!(task = %base.label(), error = %err, "task run failed");
        base.set_error(err);
    }

    /// Ok if every task succeeded, else the captured task errors.
    fn aggregate_outcome(&self) -> Result<()> {
        let mut failed = 0;
        let mut causes = Vec::new();
        for task in self.tasks() {
            let base = task.base();
            if !base.is_successful() {
                failed += 1;
                if let Some(err) = base.last_error() {
                    causes.push(err);
                }
            }
        }

        match (failed, causes.len()) {
            (0, _) => Ok(()),
            (_, 1) => Err(EngineError::TaskFailed(causes.remove(0))),
            _ => Err(EngineError::Composite { failed, causes }),
        }
    }
}

impl fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("id", &self.id())
            .field("tasks", &self.num_tasks())
            .field("progress", &self.progress())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
