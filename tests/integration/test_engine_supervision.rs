//! End-to-end supervision tests driving real subprocesses.

use std::time::{Duration, Instant};
use taskpilot::core::engine::{
    CancelSignal, ExecutionEngine, ExecutionObserver, Invocation, OutcomeStatus,
};
use tempfile::TempDir;

struct Recorder {
    started: Vec<String>,
    chunks: Vec<String>,
    errors: Vec<String>,
}

impl Recorder {
    fn new() -> Self {
        Self {
            started: Vec::new(),
            chunks: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl ExecutionObserver for Recorder {
    fn on_start(&mut self, tool: &str) {
        self.started.push(tool.to_string());
    }
    fn on_output(&mut self, chunk: &str) {
        self.chunks.push(chunk.to_string());
    }
    fn on_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

fn bash(script: &str, workdir: &std::path::Path) -> Invocation {
    Invocation::new("bash", workdir).with_arg("-c").with_arg(script)
}

#[tokio::test]
async fn observer_chunks_concatenate_to_the_captured_output() {
    let tmp = TempDir::new().unwrap();
    let engine = ExecutionEngine::new();
    let invocation = bash(
        "printf 'alpha '; printf 'to-stderr ' >&2; sleep 0.05; printf 'omega'",
        tmp.path(),
    );

    let mut recorder = Recorder::new();
    let outcome = engine
        .run(
            "scripted",
            &invocation,
            Duration::from_secs(5),
            None,
            &mut recorder,
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Exited);
    assert!(outcome.succeeded());
    assert_eq!(recorder.started, vec!["scripted".to_string()]);
    // Streaming order property: delivered chunks are exactly the captured
    // output, stderr interleaved with stdout in arrival order.
    assert_eq!(recorder.chunks.concat(), outcome.output);
    assert!(outcome.output.contains("alpha"));
    assert!(outcome.output.contains("to-stderr"));
    assert!(outcome.output.contains("omega"));
    assert!(recorder.errors.is_empty());
}

#[tokio::test]
async fn timeout_kills_the_process_within_bounded_overhead() {
    let tmp = TempDir::new().unwrap();
    let marker = tmp.path().join("survived");
    let engine = ExecutionEngine::new();
    let script = format!("sleep 0.3; touch {}", marker.display());
    let invocation = bash(&script, tmp.path());

    let started = Instant::now();
    let outcome = engine
        .run(
            "sleeper",
            &invocation,
            Duration::from_millis(50),
            None,
            &mut Recorder::new(),
        )
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(outcome.status, OutcomeStatus::TimedOut);
    assert!(!outcome.succeeded());
    assert!(outcome.duration >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");

    // The child must not outlive the invocation: give it time to prove it
    // was killed rather than finishing its sleep.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!marker.exists(), "timed-out process kept running");
}

#[tokio::test]
async fn cancellation_is_equivalent_to_timeout_expiry() {
    let tmp = TempDir::new().unwrap();
    let engine = ExecutionEngine::new();
    let invocation = bash("sleep 5", tmp.path());

    let cancel = CancelSignal::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let outcome = engine
        .run(
            "sleeper",
            &invocation,
            Duration::from_secs(30),
            Some(cancel),
            &mut Recorder::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Cancelled);
    assert!(!outcome.succeeded());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn stdin_payload_reaches_the_child() {
    let tmp = TempDir::new().unwrap();
    let engine = ExecutionEngine::new();
    let invocation = bash("cat", tmp.path()).with_stdin("ticket #42: tighten validation");

    let outcome = engine
        .run(
            "stdin-tool",
            &invocation,
            Duration::from_secs(5),
            None,
            &mut Recorder::new(),
        )
        .await
        .unwrap();

    assert!(outcome.succeeded());
    assert_eq!(outcome.output, "ticket #42: tighten validation");
}

#[tokio::test]
async fn spawn_failure_surfaces_through_on_error_without_on_start() {
    let tmp = TempDir::new().unwrap();
    let engine = ExecutionEngine::new();
    let invocation = Invocation::new("taskpilot-no-such-binary", tmp.path());

    let mut recorder = Recorder::new();
    let err = engine
        .run(
            "ghost",
            &invocation,
            Duration::from_secs(1),
            None,
            &mut recorder,
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, "ENG-002");
    assert!(recorder.started.is_empty());
    assert_eq!(recorder.errors.len(), 1);
    assert!(recorder.errors[0].contains("taskpilot-no-such-binary"));
}
