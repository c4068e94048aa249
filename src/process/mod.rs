//! Injectable command execution for `openclaw` CLI invocations.
//!
//! The bot driver never spawns processes directly; it goes through the
//! [`CommandRunner`] trait so tests can substitute a scripted runner and
//! assert on exactly which commands were (or were not) invoked. The
//! production implementation, [`SystemRunner`], wraps
//! [`tokio::process::Command`] with a per-call timeout and captured output.
//!
//! A runner invocation never returns `Err`: every outcome, including
//! spawn failures and timeouts, is encoded in the returned
//! [`CommandOutput`]. Callers decide which failures are fatal: the check
//! path degrades them to warnings, the mutate path reports them as
//! structured failures.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Captured result of one external command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// True when the process ran to completion with exit code zero.
    pub ok: bool,
    /// Exit code, when the process ran at all.
    pub code: Option<i32>,
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
    /// Human-readable failure summary (spawn error, timeout, non-zero exit).
    /// Empty on success.
    pub message: String,
}

impl CommandOutput {
    /// The most useful error text for display: stderr when the process
    /// produced any, the summary message otherwise.
    #[must_use]
    pub fn error_text(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.message
        } else {
            &self.stderr
        }
    }
}

/// Runs external commands on behalf of the bot driver.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `program` with `args`, waiting at most `timeout` for completion.
    async fn run(&self, program: &str, args: &[&str], timeout: Duration) -> CommandOutput;
}

/// Production [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str], limit: Duration) -> CommandOutput {
        let cmd_display = format!("{program} {}", args.join(" "));
        debug!(target: "process", "Executing command: {}", cmd_display);

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let output = match timeout(limit, cmd.output()).await {
            Err(_) => {
                warn!(
                    target: "process",
                    "Command timed out after {}s: {}",
                    limit.as_secs(),
                    cmd_display
                );
                return CommandOutput {
                    ok: false,
                    code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    message: format!(
                        "command timed out after {}s: {cmd_display}",
                        limit.as_secs()
                    ),
                };
            }
            Ok(Err(err)) => {
                warn!(target: "process", "Failed to spawn {}: {err}", cmd_display);
                return CommandOutput {
                    ok: false,
                    code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    message: format!("failed to run {program}: {err}"),
                };
            }
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code();
        let ok = output.status.success();

        if !ok {
            debug!(
                target: "process",
                "Command failed with exit code {:?}: {}",
                code,
                cmd_display
            );
        }

        CommandOutput {
            ok,
            code,
            stdout,
            stderr,
            message: if ok {
                String::new()
            } else {
                format!("{cmd_display} exited with code {}", code.map_or_else(|| "?".to_string(), |c| c.to_string()))
            },
        }
    }
}
