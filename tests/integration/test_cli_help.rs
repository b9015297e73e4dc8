//! CLI surface smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn taskpilot() -> Command {
    Command::cargo_bin("taskpilot").unwrap()
}

#[test]
fn help_lists_the_subcommands() {
    taskpilot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tools"))
        .stdout(predicate::str::contains("exec"))
        .stdout(predicate::str::contains("propose"));
}

#[test]
fn version_matches_the_crate() {
    taskpilot()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn tools_lists_builtins_in_an_empty_workspace() {
    let tmp = TempDir::new().unwrap();
    taskpilot()
        .arg("tools")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("claude-code"))
        .stdout(predicate::str::contains("codex"))
        .stdout(predicate::str::contains("opencode"))
        .stdout(predicate::str::contains("aider"));
}

#[test]
fn exec_with_unknown_tool_fails_with_guidance() {
    let tmp = TempDir::new().unwrap();
    taskpilot()
        .arg("exec")
        .arg("do something")
        .arg("--path")
        .arg(tmp.path())
        .arg("--tool")
        .arg("no-such-tool")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tool 'no-such-tool'"));
}

#[test]
fn exec_runs_a_custom_tool_end_to_end() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("taskpilot.toml"),
        r#"
[tools.echoer]
command = ["bash", "-c", "printf 'handled: '; printf '%s' \"$0\""]
capabilities = ["code"]
priority = 0
"#,
    )
    .unwrap();

    taskpilot()
        .arg("exec")
        .arg("wire up the adapter")
        .arg("--path")
        .arg(tmp.path())
        .arg("--tool")
        .arg("echoer")
        .assert()
        .success()
        .stdout(predicate::str::contains("handled: wire up the adapter"))
        .stdout(predicate::str::contains("completed in"));
}

#[test]
fn exec_honors_a_small_timeout() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("taskpilot.toml"),
        r#"
[tools.staller]
command = ["bash", "-c", "sleep 5"]
capabilities = ["code"]
"#,
    )
    .unwrap();

    taskpilot()
        .arg("exec")
        .arg("never finishes")
        .arg("--path")
        .arg(tmp.path())
        .arg("--tool")
        .arg("staller")
        .arg("--timeout-ms")
        .arg("100")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .stderr(predicate::str::contains("timed out"));
}

#[test]
fn propose_without_any_analysis_tool_reports_unavailable() {
    let tmp = TempDir::new().unwrap();
    // Disable builtins so no probe can accidentally succeed on a dev box.
    std::fs::write(
        tmp.path().join("taskpilot.toml"),
        r#"
[tools.claude-code]
enabled = false

[tools.codex]
enabled = false

[tools.opencode]
enabled = false

[tools.aider]
enabled = false
"#,
    )
    .unwrap();

    taskpilot()
        .arg("propose")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no available tool"));
}
