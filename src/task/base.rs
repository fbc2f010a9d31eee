// src/task/base.rs

//! Thread-safe task bookkeeping.
//!
//! Completion callbacks arrive from arbitrary worker threads, so every
//! mutable field lives in one [`TaskData`] behind a single mutex. The
//! input-completion counters are atomics because several inputs may finish
//! at the same time. No lock is held while calling back into the engine.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::engine::shared::EngineShared;
use crate::errors::TaskError;
use crate::monitor::ProgressInfo;
use crate::task::{TaskIndex, TaskState};

/// Mutable task state; guarded by `Inner::data`.
#[derive(Debug)]
struct TaskData {
    state: TaskState,
    name: Option<String>,
    description: Option<String>,
    /// Engine-local id, generated from the name once the engine is known.
    local_id: Option<String>,
    created: DateTime<Utc>,
    became_ready: Option<DateTime<Utc>>,
    execution_started: Option<DateTime<Utc>>,
    execution_finished: Option<DateTime<Utc>>,
    executed_on_host: Option<String>,
    last_error: Option<TaskError>,
    inputs: Vec<TaskIndex>,
    outputs: Vec<TaskIndex>,
}

struct Inner {
    /// Set once, when the task is registered.
    slot: OnceLock<TaskIndex>,
    /// Set once, when the engine initializes.
    engine: OnceLock<Weak<EngineShared>>,
    data: Mutex<TaskData>,
    inputs_done: AtomicUsize,
    inputs_failed: AtomicUsize,
}

/// Bookkeeping shared by every task implementation.
///
/// Cloning is cheap and yields a handle to the *same* task, which is how a
/// task body passes itself to the thread that will report its completion.
#[derive(Clone)]
pub struct TaskBase {
    inner: Arc<Inner>,
}

impl TaskBase {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: OnceLock::new(),
                engine: OnceLock::new(),
                data: Mutex::new(TaskData {
                    state: TaskState::Uninitialized,
                    name: None,
                    description: None,
                    local_id: None,
                    created: Utc::now(),
                    became_ready: None,
                    execution_started: None,
                    execution_finished: None,
                    executed_on_host: None,
                    last_error: None,
                    inputs: Vec::new(),
                    outputs: Vec::new(),
                }),
                inputs_done: AtomicUsize::new(0),
                inputs_failed: AtomicUsize::new(0),
            }),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        let base = Self::new();
        base.lock().name = Some(name.into());
        base
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.lock().description = Some(description.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, TaskData> {
        self.inner
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The engine this task reports to, if it is still alive.
    ///
    /// Panics if the task was never attached: changing state outside an
    /// engine is a bug in the caller.
    fn engine(&self) -> Option<Arc<EngineShared>> {
        let weak = self.inner.engine.get().unwrap_or_else(|| {
            panic!(
                "cannot change state of task '{}': it is not associated with an engine",
                self.label()
            )
        });
        weak.upgrade()
    }

    /// Registration slot and engine, for notifications that are optional
    /// before initialization.
    fn attached(&self) -> Option<(TaskIndex, Arc<EngineShared>)> {
        let index = *self.inner.slot.get()?;
        let engine = self.inner.engine.get()?.upgrade()?;
        Some((index, engine))
    }

    pub(crate) fn attach_slot(&self, index: TaskIndex) {
        if self.inner.slot.set(index).is_err() {
            panic!("task '{}' is already registered with an engine", self.label());
        }
    }

    pub(crate) fn attach_engine(&self, engine: &Arc<EngineShared>) {
        if self.inner.engine.set(Arc::downgrade(engine)).is_err() {
            panic!("task '{}' is already attached to an engine", self.label());
        }
        let mut data = self.lock();
        if data.local_id.is_none() {
            if let Some(name) = data.name.as_deref() {
                data.local_id = Some(engine.new_task_id(name));
            }
        }
    }

    pub fn index(&self) -> Option<TaskIndex> {
        self.inner.slot.get().copied()
    }

    pub fn name(&self) -> Option<String> {
        self.lock().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        let attached = self.attached();
        {
            let mut data = self.lock();
            if data.local_id.is_none() {
                if let Some((_, engine)) = &attached {
                    data.local_id = Some(engine.new_task_id(&name));
                }
            }
            data.name = Some(name);
        }
        if let Some((index, engine)) = attached {
            engine.task_changed(index);
        }
    }

    pub fn description(&self) -> Option<String> {
        self.lock().description.clone()
    }

    pub fn set_description(&self, description: impl Into<String>) {
        self.lock().description = Some(description.into());
        if let Some((index, engine)) = self.attached() {
            engine.task_changed(index);
        }
    }

    /// Name if set, else the local id, else a placeholder. For logs.
    pub fn label(&self) -> String {
        let data = self.lock();
        data.name
            .clone()
            .or_else(|| data.local_id.clone())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// Engine-local id (`name_with_underscores:N`).
    pub fn id(&self) -> Option<String> {
        self.lock().local_id.clone()
    }

    /// Globally meaningful id: `engineId.localId`.
    pub fn full_id(&self) -> Option<String> {
        let local = self.id()?;
        let engine = self.inner.engine.get()?.upgrade()?;
        Some(format!("{}.{}", engine.id(), local))
    }

    pub fn state(&self) -> TaskState {
        self.lock().state
    }

    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn is_failed(&self) -> bool {
        self.state().is_failed()
    }

    pub fn is_successful(&self) -> bool {
        self.state() == TaskState::CompletedSuccessfully
    }

    /// Move the task to `new_state`.
    ///
    /// Setting the current state again is a no-op. Any transition outside
    /// the lifecycle graph panics, as does calling this before the task's
    /// engine has initialized.
    pub fn set_state(&self, new_state: TaskState) {
        self.transition(new_state, None);
    }

    /// Record `error` as the task's failure and move it to `RunFailed`.
    pub fn set_error(&self, error: impl Into<anyhow::Error>) {
        self.transition(TaskState::RunFailed, Some(TaskError::new(error.into())));
    }

    fn transition(&self, new_state: TaskState, error: Option<TaskError>) {
        let engine = self.engine();
        let old_state = {
            let mut data = self.lock();
            let old_state = data.state;
            if let Some(err) = &error {
                data.last_error = Some(err.clone());
            }
            if old_state == new_state {
                return;
            }
            assert!(
                old_state.can_transition_to(new_state),
                "task '{}': transition {} -> {} prohibited",
                data.name.as_deref().unwrap_or("<unnamed>"),
                old_state,
                new_state
            );
            data.state = new_state;

            let now = Utc::now();
            match new_state {
                TaskState::Ready => data.became_ready = Some(now),
                TaskState::Running => data.execution_started = Some(now),
                TaskState::CompletedSuccessfully | TaskState::RunFailed => {
                    data.execution_finished = Some(now)
                }
                TaskState::Uninitialized | TaskState::InitFailed => {}
            }
            old_state
        };

        trace!(task = %self.label(), from = %old_state, to = %new_state, "task state changed");

        let (Some(engine), Some(index)) = (engine, self.index()) else {
            debug!(task = %self.label(), "engine dropped; state change not propagated");
            return;
        };
        if let Some(err) = &error {
            engine.task_error(index, err);
        }
        engine.after_task_state_change(index, old_state, new_state);
    }

    pub fn last_error(&self) -> Option<TaskError> {
        self.lock().last_error.clone()
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.lock().created
    }

    pub fn became_ready(&self) -> Option<DateTime<Utc>> {
        self.lock().became_ready
    }

    pub fn execution_started(&self) -> Option<DateTime<Utc>> {
        self.lock().execution_started
    }

    pub fn execution_finished(&self) -> Option<DateTime<Utc>> {
        self.lock().execution_finished
    }

    pub fn executed_on_host(&self) -> Option<String> {
        self.lock().executed_on_host.clone()
    }

    pub fn set_executed_on_host(&self, host: impl Into<String>) {
        self.lock().executed_on_host = Some(host.into());
    }

    /// Tasks this one depends on.
    pub fn inputs(&self) -> Vec<TaskIndex> {
        self.lock().inputs.clone()
    }

    /// Tasks depending on this one.
    pub fn outputs(&self) -> Vec<TaskIndex> {
        self.lock().outputs.clone()
    }

    pub(crate) fn has_output(&self, dependent: TaskIndex) -> bool {
        self.lock().outputs.contains(&dependent)
    }

    pub(crate) fn push_input(&self, dependency: TaskIndex) {
        self.lock().inputs.push(dependency);
    }

    pub(crate) fn push_output(&self, dependent: TaskIndex) {
        self.lock().outputs.push(dependent);
    }

    /// Forward a task-specific progress payload to the engine's monitors.
    pub fn report_progress(&self, progress: &ProgressInfo) {
        if let Some((index, engine)) = self.attached() {
            engine.task_progress(index, progress);
        }
    }

    /// One of this task's inputs reached a terminal state.
    ///
    /// Once every input has reported, the task becomes `Ready` if all of them
    /// succeeded and `InitFailed` otherwise.
    pub(crate) fn input_done(&self, input_succeeded: bool) {
        let state = self.state();
        assert!(
            state == TaskState::Uninitialized,
            "task '{}': only uninitialized tasks track their inputs (state is {})",
            self.label(),
            state
        );
        if !input_succeeded {
            self.inner.inputs_failed.fetch_add(1, Ordering::SeqCst);
        }
        let expected = self.lock().inputs.len();
        let done = self.inner.inputs_done.fetch_add(1, Ordering::SeqCst) + 1;
        if done == expected {
            if self.inner.inputs_failed.load(Ordering::SeqCst) > 0 {
                self.set_state(TaskState::InitFailed);
            } else {
                self.set_state(TaskState::Ready);
            }
        }
    }
}

impl Default for TaskBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.lock();
        f.debug_struct("TaskBase")
            .field("index", &self.inner.slot.get())
            .field("name", &data.name)
            .field("id", &data.local_id)
            .field("state", &data.state)
            .field("inputs", &data.inputs)
            .field("outputs", &data.outputs)
            .finish_non_exhaustive()
    }
}
