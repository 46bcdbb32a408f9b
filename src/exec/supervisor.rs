//! Supervision of the external verification process.
//!
//! `ProcessSupervisor::execute` launches the rendered command, drains
//! stdout and stderr concurrently, enforces the configured deadline and
//! guarantees that neither the child process nor the drain tasks outlive
//! the call.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command as OsCommand;

use super::command::Command;
use super::drain::StreamDrainer;

/// Grace period for drain tasks to observe end-of-stream during teardown.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Outcome of one supervised tool invocation.
///
/// Exactly one of normal exit, timeout or launch failure produced this
/// value. `stdout` and `stderr` are fully drained and frozen by the time
/// the result is returned.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether the tool exited normally with code zero.
    pub succeeded: bool,
    /// Exit code, if the process exited on its own.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error, or the launch failure description.
    pub stderr: String,
    /// Whether the deadline elapsed before the process exited.
    pub timed_out: bool,
}

impl ExecutionResult {
    fn completed(exit_code: Option<i32>, stdout: String, stderr: String) -> Self {
        Self {
            succeeded: exit_code == Some(0),
            exit_code,
            stdout,
            stderr,
            timed_out: false,
        }
    }

    fn timed_out(stdout: String, stderr: String) -> Self {
        Self {
            succeeded: false,
            exit_code: None,
            stdout,
            stderr,
            timed_out: true,
        }
    }

    fn launch_failed(description: String) -> Self {
        Self {
            succeeded: false,
            exit_code: None,
            stdout: String::new(),
            stderr: description,
            timed_out: false,
        }
    }

    /// Select the text used for report classification and rendering.
    ///
    /// Success reports stdout; failure treats stderr as authoritative.
    /// A timeout falls back to whichever stream captured anything, or a
    /// synthesized message naming the tool.
    #[must_use]
    pub fn report_text(&self, tool_name: &str) -> String {
        if self.timed_out {
            if !self.stdout.is_empty() {
                self.stdout.clone()
            } else if !self.stderr.is_empty() {
                self.stderr.clone()
            } else {
                format!("{tool_name} timed out")
            }
        } else if self.succeeded {
            self.stdout.clone()
        } else {
            self.stderr.clone()
        }
    }
}

/// Launches and supervises the external verification tool.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    timeout: Duration,
}

impl ProcessSupervisor {
    /// Create a supervisor enforcing the given per-invocation deadline.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The configured deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the command to completion or until the deadline elapses.
    ///
    /// Launch failures, abnormal exits and timeouts are all reported as
    /// data inside the returned `ExecutionResult`; they never surface as
    /// errors. After this returns, the child process is gone and both
    /// output buffers are frozen.
    pub async fn execute(&self, command: &Command) -> ExecutionResult {
        tracing::debug!(command = %command.display(), "Executing verification tool");

        let mut child = match OsCommand::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(error = %e, program = command.program(), "Failed to launch tool");
                return ExecutionResult::launch_failed(format!(
                    "Failed to launch {}: {e}",
                    command.program()
                ));
            }
        };

        // Both drainers must be attached before waiting on the child; a
        // full pipe with no reader stalls the tool indefinitely.
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill().await;
            return ExecutionResult::launch_failed("Child stdout was not captured".to_string());
        };
        let Some(stderr) = child.stderr.take() else {
            let _ = child.kill().await;
            return ExecutionResult::launch_failed("Child stderr was not captured".to_string());
        };
        let stdout_drain = StreamDrainer::start(stdout);
        let stderr_drain = StreamDrainer::start(stderr);

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let stdout = stdout_drain.finish(DRAIN_GRACE).await;
                let stderr = stderr_drain.finish(DRAIN_GRACE).await;
                let exit_code = status.code();
                if status.success() {
                    tracing::debug!(?exit_code, "Tool exited normally");
                } else {
                    tracing::error!(?exit_code, stderr = %stderr, "Tool exited abnormally");
                }
                ExecutionResult::completed(exit_code, stdout, stderr)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed waiting on tool process");
                if let Err(kill_err) = child.kill().await {
                    tracing::warn!(error = %kill_err, "Failed to kill tool process");
                }
                let _ = stdout_drain.finish(DRAIN_GRACE).await;
                let _ = stderr_drain.finish(DRAIN_GRACE).await;
                ExecutionResult::launch_failed(format!("Failed waiting on process: {e}"))
            }
            Err(_) => {
                // Deadline elapsed: no graceful phase, go straight to kill
                // so the caller gets its result within timeout + teardown.
                tracing::error!(
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "Tool timed out, killing process"
                );
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill timed-out process");
                }
                let stdout = stdout_drain.finish(DRAIN_GRACE).await;
                let stderr = stderr_drain.finish(DRAIN_GRACE).await;
                ExecutionResult::timed_out(stdout, stderr)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_text_success_uses_stdout() {
        let result = ExecutionResult::completed(Some(0), "ok\n".to_string(), "noise\n".to_string());
        assert!(result.succeeded);
        assert_eq!(result.report_text("tool"), "ok\n");
    }

    #[test]
    fn test_report_text_failure_uses_stderr() {
        let result =
            ExecutionResult::completed(Some(1), "partial\n".to_string(), "boom\n".to_string());
        assert!(!result.succeeded);
        assert_eq!(result.report_text("tool"), "boom\n");
    }

    #[test]
    fn test_report_text_timeout_prefers_stdout() {
        let result = ExecutionResult::timed_out("got this far\n".to_string(), String::new());
        assert_eq!(result.report_text("tool"), "got this far\n");
    }

    #[test]
    fn test_report_text_timeout_falls_back_to_stderr() {
        let result = ExecutionResult::timed_out(String::new(), "warming up\n".to_string());
        assert_eq!(result.report_text("tool"), "warming up\n");
    }

    #[test]
    fn test_report_text_timeout_synthesizes_message() {
        let result = ExecutionResult::timed_out(String::new(), String::new());
        assert_eq!(result.report_text("Signature Verifier"), "Signature Verifier timed out");
    }

    #[test]
    fn test_launch_failed_reports_description() {
        let result = ExecutionResult::launch_failed("Failed to launch nope: not found".to_string());
        assert!(!result.succeeded);
        assert!(!result.timed_out);
        assert_eq!(result.exit_code, None);
        assert!(result.report_text("tool").contains("not found"));
    }
}
