// src/engine/queue.rs

//! Ready-queue shared between completion callbacks and the driver.
//!
//! Producers are completion callbacks on arbitrary threads; the single
//! consumer is the driver draining the queue inside `run()`. The pending
//! resumer lives under the same mutex as the queue so that "is there work?"
//! and "remember this resumer" happen in one critical section.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::engine::Resumer;
use crate::task::TaskIndex;

#[derive(Default)]
struct QueueState {
    tasks: VecDeque<TaskIndex>,
    resumer: Option<Box<dyn Resumer>>,
}

#[derive(Default)]
pub struct ReadyQueue {
    state: Mutex<QueueState>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue a ready task. When `wake` is set, hand back the pending
    /// resumer (if any) for the caller to invoke outside the lock.
    pub fn push(&self, task: TaskIndex, wake: bool) -> Option<Box<dyn Resumer>> {
        let mut state = self.lock();
        state.tasks.push_back(task);
        if wake { state.resumer.take() } else { None }
    }

    /// Take everything queued so far, in arrival order.
    pub fn drain(&self) -> Vec<TaskIndex> {
        self.lock().tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    /// Register `resumer`, replacing any pending one.
    ///
    /// If work is already queued, or `finished()` reports that nothing more
    /// will ever be queued, the resumer is handed straight back so the
    /// caller can invoke it. `finished` is evaluated under the queue lock.
    pub fn register(
        &self,
        resumer: Box<dyn Resumer>,
        finished: impl FnOnce() -> bool,
    ) -> Option<Box<dyn Resumer>> {
        let mut state = self.lock();
        state.resumer = None;
        if !state.tasks.is_empty() || finished() {
            Some(resumer)
        } else {
            state.resumer = Some(resumer);
            None
        }
    }

    /// Take the pending resumer, if any.
    pub fn take_resumer(&self) -> Option<Box<dyn Resumer>> {
        self.lock().resumer.take()
    }

    pub fn has_resumer(&self) -> bool {
        self.lock().resumer.is_some()
    }
}
