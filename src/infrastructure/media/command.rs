use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Captured output of a finished child process.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0} not found in PATH")]
    NotFound(String),
    #[error("{program} timed out after {timeout_secs}s")]
    TimedOut { program: String, timeout_secs: u64 },
    #[error("{program} exited with {code}: {stderr_tail}")]
    Failed {
        program: String,
        code: i32,
        stderr_tail: String,
    },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs a child process to completion, optionally bounded by a timeout.
///
/// The one shape every external-tool call goes through: the child is
/// spawned with `kill_on_drop`, so expiry of the timeout (or cancellation
/// of the surrounding task) terminates the process rather than leaking it.
pub async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Option<Duration>,
) -> Result<CommandOutput, CommandError> {
    tracing::debug!(program, ?args, "Spawning external tool");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandError::NotFound(program.to_string())
            } else {
                CommandError::Io(e)
            }
        })?;

    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(CommandError::TimedOut {
                    program: program.to_string(),
                    timeout_secs: limit.as_secs(),
                });
            }
        },
        None => child.wait_with_output().await?,
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        return Err(CommandError::Failed {
            program: program.to_string(),
            code,
            stderr_tail: stderr_tail(&stderr),
        });
    }

    Ok(CommandOutput { stdout, stderr })
}

/// Last few lines of diagnostics, enough to explain a failure without
/// persisting the tool's whole log.
pub fn stderr_tail(stderr: &str) -> String {
    const TAIL_LINES: usize = 8;
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(TAIL_LINES);
    lines[start..].join("\n")
}
