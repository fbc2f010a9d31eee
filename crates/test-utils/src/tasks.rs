use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tracing::debug;
use workflow_engine::{Task, TaskBase, TaskState};

/// What a [`ScriptedTask`] does when the engine runs it.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Complete successfully before returning from `run()`.
    Succeed,
    /// Return `Err` from `run()`.
    Fail(String),
    /// Call `set_error` and return `Ok`.
    ReportError(String),
    /// Park the task; someone else completes it later through [`Parked`].
    Pause { succeed: bool },
}

/// A task parked by [`Behaviour::Pause`], waiting to be completed.
#[derive(Debug)]
pub struct Parked {
    pub base: TaskBase,
    pub succeed: bool,
}

impl Parked {
    pub fn complete(self) {
        debug!(task = %self.base.label(), succeed = self.succeed, "completing parked task");
        if self.succeed {
            self.base.set_state(TaskState::CompletedSuccessfully);
        } else {
            let label = self.base.label();
            self.base.set_error(anyhow!("paused task '{label}' failed"));
        }
    }
}

/// Shared list of parked tasks.
#[derive(Debug, Clone, Default)]
pub struct ParkedTasks(Arc<Mutex<Vec<Parked>>>);

impl ParkedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn park(&self, parked: Parked) {
        self.0.lock().unwrap().push(parked);
    }

    pub fn take_all(&self) -> Vec<Parked> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Complete everything parked so far; returns how many were completed.
    pub fn complete_all(&self) -> usize {
        let parked = self.take_all();
        let n = parked.len();
        for p in parked {
            p.complete();
        }
        n
    }
}

/// A task whose body follows a fixed [`Behaviour`] and counts its runs.
#[derive(Debug)]
pub struct ScriptedTask {
    base: TaskBase,
    behaviour: Behaviour,
    parked: ParkedTasks,
    runs: AtomicUsize,
}

impl ScriptedTask {
    pub fn new(name: &str, behaviour: Behaviour) -> Arc<Self> {
        Self::with_parking(name, behaviour, ParkedTasks::new())
    }

    pub fn with_parking(name: &str, behaviour: Behaviour, parked: ParkedTasks) -> Arc<Self> {
        Arc::new(Self {
            base: TaskBase::named(name),
            behaviour,
            parked,
            runs: AtomicUsize::new(0),
        })
    }

    pub fn succeeding(name: &str) -> Arc<Self> {
        Self::new(name, Behaviour::Succeed)
    }

    pub fn failing(name: &str, message: &str) -> Arc<Self> {
        Self::new(name, Behaviour::Fail(message.to_string()))
    }

    pub fn reporting_error(name: &str, message: &str) -> Arc<Self> {
        Self::new(name, Behaviour::ReportError(message.to_string()))
    }

    pub fn paused(name: &str, parked: &ParkedTasks, succeed: bool) -> Arc<Self> {
        Self::with_parking(name, Behaviour::Pause { succeed }, parked.clone())
    }

    /// How many times the engine called `run()`.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> TaskState {
        self.base.state()
    }
}

impl Task for ScriptedTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn run(&self) -> anyhow::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Succeed => {
                self.base.set_state(TaskState::CompletedSuccessfully);
                Ok(())
            }
            Behaviour::Fail(message) => Err(anyhow!("{message}")),
            Behaviour::ReportError(message) => {
                self.base.set_error(anyhow!("{message}"));
                Ok(())
            }
            Behaviour::Pause { succeed } => {
                self.parked.park(Parked {
                    base: self.base.clone(),
                    succeed: *succeed,
                });
                Ok(())
            }
        }
    }
}
