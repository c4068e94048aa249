use super::*;
use crate::process::{CommandOutput, CommandRunner};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted runner: maps a full command line to a canned output and
/// records every invocation for spying.
#[derive(Default)]
struct ScriptedRunner {
    responses: HashMap<String, CommandOutput>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn on(mut self, command: &str, output: CommandOutput) -> Self {
        self.responses.insert(command.to_string(), output);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str], _timeout: Duration) -> CommandOutput {
        let line = format!("{program} {}", args.join(" "));
        self.calls.lock().unwrap().push(line.clone());
        self.responses.get(&line).cloned().unwrap_or(CommandOutput {
            ok: false,
            code: Some(127),
            stdout: String::new(),
            stderr: format!("unscripted command: {line}"),
            message: format!("unscripted command: {line}"),
        })
    }
}

fn ok_with(stdout: &str) -> CommandOutput {
    CommandOutput {
        ok: true,
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
        message: String::new(),
    }
}

fn failed_with(stderr: &str) -> CommandOutput {
    CommandOutput {
        ok: false,
        code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
        message: "exited with code 1".to_string(),
    }
}

const STATUS_TABLE: &str = "\
│ Install │ pnpm                                     │
│ Update  │ available · pnpm · npm update 2026.2.19-2 │";

#[tokio::test]
async fn check_reports_available_update_from_status_table() {
    let runner = ScriptedRunner::default()
        .on("openclaw --version", ok_with("2026.1.30\n"))
        .on("openclaw update status", ok_with(STATUS_TABLE));
    let driver = BotUpdateDriver::new(runner, "openclaw/openclaw");

    let status = driver.check().await.unwrap();
    assert!(status.ok);
    assert_eq!(status.current_tag, "2026.1.30");
    assert_eq!(status.latest_tag, "2026.2.19-2");
    assert_eq!(status.install_method.as_deref(), Some("global"));
    assert_eq!(status.strategy.as_deref(), Some("package-manager"));
    assert!(status.update_available);
    assert!(status.warning.is_none());
}

#[tokio::test]
async fn check_degrades_failed_status_probe_to_warning() {
    let runner = ScriptedRunner::default()
        .on("openclaw --version", ok_with("2026.1.30"))
        .on("openclaw update status", failed_with("gateway socket unreachable"));
    let driver = BotUpdateDriver::new(runner, "openclaw/openclaw");

    let status = driver.check().await.unwrap();
    assert!(status.ok);
    assert_eq!(status.current_tag, "2026.1.30");
    assert!(!status.update_available);
    let warning = status.warning.expect("warning must be set");
    assert!(warning.contains("gateway socket unreachable"));
}

#[tokio::test]
async fn check_fails_when_the_cli_itself_is_missing() {
    let runner =
        ScriptedRunner::default().on("openclaw --version", failed_with("command not found"));
    let driver = BotUpdateDriver::new(runner, "openclaw/openclaw");

    let err = driver.check().await.unwrap_err();
    assert!(matches!(err, UpdateError::CommandFailed { .. }));
}

#[tokio::test]
async fn version_mismatch_triggers_update_even_without_available_keyword() {
    // CLI says "up to date" but reports a different latest version;
    // the raw mismatch wins.
    let table = "\
| Install | npm |
| Update  | up to date · latest: 2026.4.1 |";
    let runner = ScriptedRunner::default()
        .on("openclaw --version", ok_with("2026.1.30"))
        .on("openclaw update status", ok_with(table));
    let driver = BotUpdateDriver::new(runner, "openclaw/openclaw");

    let status = driver.check().await.unwrap();
    assert_eq!(status.latest_tag, "2026.4.1");
    assert!(status.update_available);
}

#[tokio::test]
async fn rollback_without_tag_invokes_nothing() {
    let runner = ScriptedRunner::default();
    let driver = BotUpdateDriver::new(runner, "openclaw/openclaw");

    let result = driver.mutate(BotAction::Rollback, "  ").await;
    assert!(!result.ok);
    assert!(!result.rolled_back);
    assert!(result.message.contains("requires a target tag"));
    assert!(driver.runner.calls().is_empty(), "no command may run");
}

#[tokio::test]
async fn upgrade_strips_the_tag_and_reads_back_the_version() {
    let runner = ScriptedRunner::default()
        .on("openclaw --version", ok_with("2026.1.30"))
        .on("openclaw update --yes --tag 2026.2.19-2", ok_with("updated"))
        .on("openclaw doctor", ok_with("all good"))
        .on("openclaw gateway restart", ok_with("restarted"))
        .on("openclaw health", ok_with("healthy"));
    let driver = BotUpdateDriver::new(runner, "openclaw/openclaw");

    let result = driver.mutate(BotAction::Upgrade, "v2026.2.19-2").await;
    assert!(result.ok);
    assert_eq!(result.old_version.as_deref(), Some("2026.1.30"));
    // --version is scripted to keep answering 2026.1.30, which is what the
    // driver reports; the point is it re-read rather than assumed.
    assert_eq!(result.target_version.as_deref(), Some("2026.1.30"));

    let calls = driver.runner.calls();
    assert!(calls.contains(&"openclaw update --yes --tag 2026.2.19-2".to_string()));
    assert_eq!(calls.last().unwrap(), "openclaw health");
}

#[tokio::test]
async fn post_check_failures_become_warnings_not_errors() {
    let runner = ScriptedRunner::default()
        .on("openclaw --version", ok_with("2026.2.19-2"))
        .on("openclaw update --yes", ok_with("updated"))
        .on("openclaw doctor", failed_with("doctor found drift"))
        .on("openclaw gateway restart", ok_with("restarted"))
        .on("openclaw health", failed_with("health endpoint 503"));
    let driver = BotUpdateDriver::new(runner, "openclaw/openclaw");

    let result = driver.mutate(BotAction::Upgrade, "").await;
    assert!(result.ok, "post-check failures must not flip ok");
    assert!(result.message.contains("doctor found drift"));
    assert!(result.message.contains("health endpoint 503"));
}

#[tokio::test]
async fn failed_update_returns_structured_failure_with_stderr() {
    let runner = ScriptedRunner::default()
        .on("openclaw --version", ok_with("2026.1.30"))
        .on("openclaw update --yes --tag 2026.0.1", failed_with("no such release"));
    let driver = BotUpdateDriver::new(runner, "openclaw/openclaw");

    let result = driver.mutate(BotAction::Rollback, "2026.0.1").await;
    assert!(!result.ok);
    assert!(result.message.contains("no such release"));
    assert_eq!(result.target_version.as_deref(), Some("2026.0.1"));

    // Post-checks never ran.
    let calls = driver.runner.calls();
    assert!(!calls.iter().any(|c| c.starts_with("openclaw doctor")));
}

#[tokio::test]
async fn rollback_success_sets_rolled_back() {
    let runner = ScriptedRunner::default()
        .on("openclaw --version", ok_with("2026.1.30"))
        .on("openclaw update --yes --tag 2026.1.10", ok_with("done"))
        .on("openclaw doctor", ok_with(""))
        .on("openclaw gateway restart", ok_with(""))
        .on("openclaw health", ok_with(""));
    let driver = BotUpdateDriver::new(runner, "openclaw/openclaw");

    let result = driver.mutate(BotAction::Rollback, "2026.1.10").await;
    assert!(result.ok);
    assert!(result.rolled_back);
}
