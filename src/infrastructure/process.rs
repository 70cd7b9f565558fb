//! Child process execution with bounded runtime.
//!
//! Output is captured while the process runs. When the deadline passes the
//! child is asked to terminate (SIGTERM on unix) and force-killed if it has
//! not exited after the grace period.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, warn};

/// Failures of [`run_captured`].
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Program not found: {0}")]
    NotFound(String),

    #[error("Failed to spawn {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("Process timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Process I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Exit status and captured streams of a finished process.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Stderr if it has content, stdout otherwise.
    pub fn error_text(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Run `command` to completion, feeding it `stdin` and capturing its output.
///
/// The child is spawned with `kill_on_drop`, so dropping the returned future
/// also kills the process.
pub async fn run_captured(
    mut command: Command,
    stdin: Option<&str>,
    limit: Duration,
    grace: Duration,
) -> Result<CapturedOutput, ProcessError> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();

    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ProcessError::NotFound(program.clone()),
        _ => ProcessError::Spawn {
            program: program.clone(),
            message: e.to_string(),
        },
    })?;
    debug!(program = %program, pid = ?child.id(), "Spawned child process");

    let input = child.stdin.take().zip(stdin);
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Stdin is fed inside the deadline so a child that never reads it still
    // times out.
    let finished = tokio::time::timeout(limit, async {
        tokio::try_join!(
            child.wait(),
            write_input(input),
            read_all(stdout),
            read_all(stderr)
        )
    })
    .await;

    match finished {
        Ok(result) => {
            let (status, (), stdout, stderr) = result?;
            Ok(CapturedOutput {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            warn!(program = %program, timeout = ?limit, "Child process timed out");
            terminate(&mut child, grace).await;
            Err(ProcessError::TimedOut(limit))
        }
    }
}

/// Write `input` and close the pipe. A child that exits without reading
/// closes its end first; that is reported through its exit status instead.
async fn write_input(input: Option<(ChildStdin, &str)>) -> io::Result<()> {
    let Some((mut pipe, text)) = input else {
        return Ok(());
    };
    match pipe.write_all(text.as_bytes()).await {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Child closed stdin before reading all input");
            Ok(())
        }
        other => other,
    }
}

async fn read_all<R: AsyncRead + Unpin>(stream: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Ask the child to exit, then force-kill it after `grace`.
pub async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    if let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => match tokio::time::timeout(grace, child.wait()).await {
                Ok(Ok(status)) => {
                    debug!(pid, ?status, "Child exited after SIGTERM");
                    return;
                }
                Ok(Err(e)) => warn!(pid, error = %e, "Error waiting for child after SIGTERM"),
                Err(_) => warn!(pid, grace = ?grace, "Child ignored SIGTERM, forcing kill"),
            },
            Err(e) => warn!(pid, error = %e, "Failed to send SIGTERM"),
        }
    }

    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill child process");
    }
}
