//! Subprocess execution shared by the CLI and process-list adapters

use std::{process::Stdio, time::Duration};

use tokio::process::Command;

/// Captured result of one finished subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code:   Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short one-line description of a failed run
    pub fn failure_summary(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, first_line(stderr))
        }
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or(s)
}

/// Runs `program` with `args`, waiting at most `timeout`
///
/// The child is killed if the timeout expires or the returned future is
/// dropped. Errors are returned as plain reason strings; callers attach the
/// backend identity.
pub async fn run_command(program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput, String> {
    tracing::debug!("Running {} {:?}", program, args);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => format!("{}: not found", program),
        _ => format!("{}: failed to start: {}", program, e),
    })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| format!("{}: timed out after {}ms", program, timeout.as_millis()))?
        .map_err(|e| format!("{}: failed to wait: {}", program, e))?;

    Ok(CommandOutput {
        code:   output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
