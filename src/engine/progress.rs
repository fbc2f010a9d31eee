// src/engine/progress.rs

use std::fmt;

/// Aggregate counts published to monitors whenever they change.
///
/// A finished run has `succeeded + failed == total`. `init_failed` is the
/// part of `failed` that never ran because a dependency did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressReport {
    pub total: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub init_failed: usize,
}

impl ProgressReport {
    pub fn is_finished(&self) -> bool {
        self.succeeded + self.failed == self.total
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(
                f,
                "Progress: Out of {} subtasks: {} executing, {} succeeded, {} failed (out of which {} failed because their dependency failed)",
                self.total, self.running, self.succeeded, self.failed, self.init_failed
            )
        } else {
            write!(
                f,
                "Progress: Out of {} subtasks: {} executing, {} succeeded, none failed",
                self.total, self.running, self.succeeded
            )
        }
    }
}
