// src/exec/command.rs

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_OUTPUT_WAIT;
use crate::exec::files::complete_when_files_appear;
use crate::task::{Task, TaskBase, TaskState};

/// A task that runs a shell command on a tokio runtime.
///
/// `run()` only submits the process and returns; the spawned job reports
/// the outcome through the task's [`TaskBase`]. Submitting happens at most
/// once, so dispatching the same task again does not start a second process.
pub struct CommandTask {
    base: TaskBase,
    cmd: String,
    outputs: Vec<PathBuf>,
    output_wait: Duration,
    handle: Handle,
    submitted: AtomicBool,
}

impl CommandTask {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>, handle: Handle) -> Self {
        Self {
            base: TaskBase::named(name),
            cmd: cmd.into(),
            outputs: Vec::new(),
            output_wait: DEFAULT_OUTPUT_WAIT,
            handle,
            submitted: AtomicBool::new(false),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.base.set_description(description);
        self
    }

    /// Only succeed once every file in `outputs` exists, waiting at most
    /// `wait` after the command exited.
    pub fn with_outputs(mut self, outputs: Vec<PathBuf>, wait: Duration) -> Self {
        self.outputs = outputs;
        self.output_wait = wait;
        self
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }
}

impl Task for CommandTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn run(&self) -> Result<()> {
        if self.submitted.swap(true, Ordering::SeqCst) {
            debug!(task = %self.base.label(), "command already submitted");
            return Ok(());
        }
        if self.cmd.trim().is_empty() {
            bail!("task '{}' has an empty command", self.base.label());
        }

        let job = CommandJob {
            base: self.base.clone(),
            cmd: self.cmd.clone(),
            outputs: self.outputs.clone(),
            output_wait: self.output_wait,
        };
        self.handle.spawn(job.run());
        Ok(())
    }
}

/// Everything the spawned job needs, detached from the task object.
struct CommandJob {
    base: TaskBase,
    cmd: String,
    outputs: Vec<PathBuf>,
    output_wait: Duration,
}

impl CommandJob {
    async fn run(self) {
        if let Err(err) = self.run_process().await {
            warn!(task = %self.base.label(), error = %err, "command failed");
            self.base.set_error(err);
            return;
        }

        if self.outputs.is_empty() {
            self.base.set_state(TaskState::CompletedSuccessfully);
        } else {
            complete_when_files_appear(&self.base, &self.outputs, self.output_wait).await;
        }
    }

    async fn run_process(&self) -> Result<()> {
        let name = self.base.label();
        info!(task = %name, cmd = %self.cmd, "starting task process");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", name))?;
        self.base.set_executed_on_host(local_host_name());

        if let Some(stdout) = child.stdout.take() {
            let task_name = name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(task = %task_name, "stdout: {}", line);
                }
            });
        }

        // Always consume stderr so buffers don't fill; log at debug.
        if let Some(stderr) = child.stderr.take() {
            let task_name = name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(task = %task_name, "stderr: {}", line);
                }
            });
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process of task '{}'", name))?;

        let code = status.code().unwrap_or(-1);
        info!(
            task = %name,
            exit_code = code,
            success = status.success(),
            "task process exited"
        );

        if !status.success() {
            bail!("command `{}` of task '{}' exited with code {}", self.cmd, name, code);
        }
        Ok(())
    }
}

fn local_host_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
