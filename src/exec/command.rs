// src/exec/command.rs

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::engine::{Completion, TaskHandler, TaskKey};

/// Task body that runs a shell command.
///
/// Each launch spawns a Tokio task, so several commands can run in parallel;
/// the completion is signalled with the command's exit status. Must be
/// started from within a Tokio runtime.
#[derive(Debug, Clone)]
pub struct ShellHandler {
    name: TaskKey,
    cmd: String,
}

impl ShellHandler {
    pub fn new(name: impl Into<TaskKey>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
        }
    }
}

impl TaskHandler for ShellHandler {
    fn start(&self, completion: Completion) {
        let name = self.name.clone();
        let cmd = self.cmd.clone();

        tokio::spawn(async move {
            let success = match run_command(&name, &cmd).await {
                Ok(success) => success,
                Err(err) => {
                    error!(task = %name, error = %err, "task execution error");
                    false
                }
            };
            completion.complete(success);
        });
    }
}

/// Run a single command to completion and return whether it succeeded.
async fn run_command(name: &str, cmd_line: &str) -> Result<bool> {
    info!(task = %name, cmd = %cmd_line, "starting task process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", name))?;

    // Always consume output so pipe buffers don't fill.
    if let Some(stdout) = child.stdout.take() {
        forward_lines(name.to_string(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(name.to_string(), "stderr", stderr);
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", name))?;

    info!(
        task = %name,
        exit_code = status.code().unwrap_or(-1),
        success = status.success(),
        "task process exited"
    );

    Ok(status.success())
}

fn forward_lines<R>(task: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(task = %task, stream, "{}", line);
        }
    });
}
