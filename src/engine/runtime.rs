// src/engine/runtime.rs

//! Drivers that call [`WorkflowEngine::run`] until the workflow finishes.
//!
//! Both park on a oneshot channel between steps, so a driver sleeps while
//! every task is executing elsewhere and wakes as soon as a completion makes
//! new work available.

use anyhow::anyhow;
use tokio::sync::oneshot;
use tracing::{debug, info, trace};

use crate::engine::{Resumer, WorkflowEngine};
use crate::errors::{EngineError, Result};

/// A resumer that completes the returned receiver when invoked.
pub fn oneshot_resumer() -> (impl Resumer, oneshot::Receiver<()>) {
    let (tx, rx) = oneshot::channel();
    let resumer = move || {
        let _ = tx.send(());
    };
    (resumer, rx)
}

fn resumer_dropped(engine: &WorkflowEngine) -> EngineError {
    EngineError::Other(anyhow!(
        "workflow engine '{}' dropped its resumer without waking the driver",
        engine.id()
    ))
}

/// Drive `engine` to completion, blocking the current thread between steps.
///
/// Must not be called from inside an async runtime; use [`drive`] there.
pub fn run_to_completion(engine: &mut WorkflowEngine) -> Result<()> {
    info!(engine = %engine.id(), tasks = engine.num_tasks(), "running workflow");
    loop {
        if engine.run()? {
            return Ok(());
        }
        if engine.is_work_available() {
            continue;
        }

        trace!(engine = %engine.id(), "no work available; parking driver");
        let (resumer, wake) = oneshot_resumer();
        engine.resume_on_work(resumer);
        wake.blocking_recv().map_err(|_| resumer_dropped(engine))?;
        debug!(engine = %engine.id(), "driver resumed");
    }
}

/// Drive `engine` to completion from an async context.
///
/// Tasks that hand their work to the tokio runtime keep making progress
/// while this future waits for the next batch.
pub async fn drive(engine: &mut WorkflowEngine) -> Result<()> {
    info!(engine = %engine.id(), tasks = engine.num_tasks(), "running workflow");
    loop {
        if engine.run()? {
            return Ok(());
        }
        if engine.is_work_available() {
            tokio::task::yield_now().await;
            continue;
        }

        trace!(engine = %engine.id(), "no work available; awaiting resumer");
        let (resumer, wake) = oneshot_resumer();
        engine.resume_on_work(resumer);
        wake.await.map_err(|_| resumer_dropped(engine))?;
        debug!(engine = %engine.id(), "driver resumed");
    }
}
