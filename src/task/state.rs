// src/task/state.rs

//! The lifecycle state machine shared by every task.

use std::fmt;

/// Lifecycle state of a task.
///
/// ```text
/// Uninitialized -> Ready -> Running -> CompletedSuccessfully
///       |            |         '-----> RunFailed
///       |            '---------------> RunFailed
///       '----------------------------> InitFailed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskState {
    /// Constructed, waiting for its inputs to finish.
    #[default]
    Uninitialized,
    /// Every input succeeded; waiting in the ready-queue.
    Ready,
    /// Dispatched by the engine; the real work is in flight.
    Running,
    CompletedSuccessfully,
    RunFailed,
    /// At least one input did not succeed, so the task never ran.
    InitFailed,
}

impl TaskState {
    pub fn text(self) -> &'static str {
        match self {
            TaskState::Uninitialized => "Uninitialized",
            TaskState::Ready => "Ready",
            TaskState::Running => "Running",
            TaskState::CompletedSuccessfully => "Completed Successfully",
            TaskState::RunFailed => "Run Failed",
            TaskState::InitFailed => "Initialization Failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::CompletedSuccessfully | TaskState::RunFailed | TaskState::InitFailed
        )
    }

    pub fn is_failed(self) -> bool {
        matches!(self, TaskState::RunFailed | TaskState::InitFailed)
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    ///
    /// Staying in the same state is not a transition and returns `false`.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Uninitialized, Ready)
                | (Uninitialized, InitFailed)
                | (Ready, Running)
                | (Ready, RunFailed)
                | (Running, CompletedSuccessfully)
                | (Running, RunFailed)
        )
    }

    /// Graphviz fill color used by the dot dump.
    pub fn dot_color(self) -> &'static str {
        match self {
            TaskState::CompletedSuccessfully => "green",
            TaskState::InitFailed => "orange",
            TaskState::Ready => "beige",
            TaskState::Running => "yellowgreen",
            TaskState::RunFailed => "red",
            TaskState::Uninitialized => "grey",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::TaskState::{self, *};

    const ALL: [TaskState; 6] = [
        Uninitialized,
        Ready,
        Running,
        CompletedSuccessfully,
        RunFailed,
        InitFailed,
    ];

    #[test]
    fn new_tasks_start_uninitialized() {
        assert_eq!(TaskState::default(), Uninitialized);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in ALL.iter().copied().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn lifecycle_edges_are_accepted() {
        assert!(Uninitialized.can_transition_to(Ready));
        assert!(Uninitialized.can_transition_to(InitFailed));
        assert!(Ready.can_transition_to(Running));
        assert!(Ready.can_transition_to(RunFailed));
        assert!(Running.can_transition_to(CompletedSuccessfully));
        assert!(Running.can_transition_to(RunFailed));
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert!(!Uninitialized.can_transition_to(Running));
        assert!(!Uninitialized.can_transition_to(CompletedSuccessfully));
        assert!(!Ready.can_transition_to(CompletedSuccessfully));
        assert!(!Ready.can_transition_to(InitFailed));
        assert!(!Running.can_transition_to(Ready));
        assert!(!Running.can_transition_to(InitFailed));
    }

    #[test]
    fn failure_classification() {
        assert!(RunFailed.is_failed());
        assert!(InitFailed.is_failed());
        assert!(!CompletedSuccessfully.is_failed());
        assert!(CompletedSuccessfully.is_terminal());
        assert!(!Running.is_terminal());
    }
}
