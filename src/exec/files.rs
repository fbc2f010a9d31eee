// src/exec/files.rs

//! Completing a task once the files it produces show up.
//!
//! Output files written on shared or network filesystems may become visible
//! some time after the producing process exited, so completion polls for
//! them instead of checking once.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::task::{TaskBase, TaskState};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Wait until every file in `files` exists, or fail once `timeout` elapsed.
pub async fn wait_for_files(files: &[PathBuf], timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    for file in files {
        loop {
            if tokio::fs::try_exists(file).await.unwrap_or(false) {
                debug!(file = %file.display(), "output file present");
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                bail!(
                    "The file {} did not appear even after {:?}",
                    file.display(),
                    timeout
                );
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }
    Ok(())
}

/// Mark `task` successful once `files` exist, or failed if they never do.
pub async fn complete_when_files_appear(task: &TaskBase, files: &[PathBuf], timeout: Duration) {
    match wait_for_files(files, timeout).await {
        Ok(()) => task.set_state(TaskState::CompletedSuccessfully),
        Err(err) => {
            warn!(task = %task.label(), error = %err, "declared outputs missing");
            task.set_error(err);
        }
    }
}
