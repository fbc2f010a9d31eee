// src/task/mod.rs

//! The task contract.
//!
//! - [`state`] holds the lifecycle state machine.
//! - [`base`] provides [`TaskBase`], the thread-safe bookkeeping every task
//!   embeds: state, timestamps, error slot and dependency edges.
//!
//! A task implementation owns a `TaskBase` and exposes it through
//! [`Task::base`]. The engine calls [`Task::run`] once the task is ready; the
//! body hands its work off and reports the outcome later, from any thread,
//! through `TaskBase::set_state` / `TaskBase::set_error`.

pub mod base;
pub mod state;

use std::fmt;

pub use base::TaskBase;
pub use state::TaskState;

/// Position of a task in its engine's task table.
///
/// Returned by `WorkflowEngine::add_task` and used for dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskIndex(pub(crate) usize);

impl TaskIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A schedulable unit of work.
pub trait Task: Send + Sync + 'static {
    /// Shared bookkeeping for this task.
    fn base(&self) -> &TaskBase;

    /// Start the task's work.
    ///
    /// Must not block on the actual work. Returning `Err` fails the task
    /// with that error; otherwise the task (or whatever it handed the work
    /// to) must eventually move it to a terminal state.
    fn run(&self) -> anyhow::Result<()>;
}

impl fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.base(), f)
    }
}
