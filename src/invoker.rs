// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tool Invoker
 * Runs external scanner processes with capture files and hard time budgets
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// What happened once the process finished (or was cut short).
#[derive(Debug, Clone, Default)]
pub struct InvocationOutcome {
    pub exit_code: Option<i32>,
    pub stderr: String,
    pub timed_out: bool,
}

impl InvocationOutcome {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// One external tool run, recorded end to end.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub output_file: PathBuf,
    pub timeout: Duration,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: InvocationOutcome,
}

impl ToolInvocation {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Run a tool with stdout streamed straight into `output_file` and stderr
/// captured in memory. The time budget is enforced with a kill; a timed-out
/// run still returns Ok so the caller can salvage whatever landed in the
/// capture file. Err means the process never ran at all.
pub async fn invoke(
    program: &Path,
    args: &[String],
    output_file: &Path,
    timeout: Duration,
) -> PipelineResult<ToolInvocation> {
    let started_at = Utc::now();
    let capture = std::fs::File::create(output_file)?;

    debug!(
        program = %program.display(),
        args = ?args,
        output = %output_file.display(),
        "spawning tool"
    );

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(capture))
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            let tool = program
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| program.display().to_string());
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::ToolNotFound { tool }
            } else {
                PipelineError::ToolFailure {
                    tool,
                    reason: e.to_string(),
                }
            }
        })?;

    // Drain stderr concurrently so a chatty tool cannot block on a full pipe.
    let mut stderr_pipe = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf).await;
        }
        buf
    });

    let mut timed_out = false;
    let exit_code = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => status.code(),
        Ok(Err(e)) => {
            warn!(program = %program.display(), error = %e, "wait failed");
            None
        }
        Err(_) => {
            timed_out = true;
            warn!(
                program = %program.display(),
                budget_secs = timeout.as_secs(),
                "time budget exceeded, killing process"
            );
            let _ = child.start_kill();
            let _ = child.wait().await;
            None
        }
    };

    let stderr = stderr_task.await.unwrap_or_default();
    let finished_at = Utc::now();

    Ok(ToolInvocation {
        program: program.to_path_buf(),
        args: args.to_vec(),
        output_file: output_file.to_path_buf(),
        timeout,
        started_at,
        finished_at,
        outcome: InvocationOutcome {
            exit_code,
            stderr,
            timed_out,
        },
    })
}
