//! Supervised execution of one external tool process.
//!
//! The engine owns the child process for exactly one invocation: it spawns
//! the fully-resolved command, pumps stdout and stderr into the caller's
//! observer in arrival order, races the drain against a deadline and an
//! external cancel signal, and force-kills the child when either fires.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info};
use uuid::Uuid;

/// Default invocation timeout exposed on the CLI surface.
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;

const OUTPUT_CAPTURE_LIMIT_BYTES: usize = 1_048_576;
const OUTPUT_CHANNEL_CAPACITY: usize = 64;

/// Fully-resolved command an adapter hands to the engine.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub working_dir: PathBuf,
    /// Payload written to the child's stdin, for tools that take the task
    /// text that way. Stdin is closed after the write; `None` means no
    /// stdin at all.
    pub stdin_payload: Option<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: working_dir.into(),
            stdin_payload: None,
        }
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin_payload = Some(payload.into());
        self
    }
}

/// Callback sink for one supervised execution.
///
/// `on_start` fires exactly once after a successful spawn and before any
/// output; `on_output` delivers stdout/stderr chunks interleaved in arrival
/// order; `on_error` reports engine-level problems (spawn failure, stream
/// read failure) as distinct from tool-reported errors.
pub trait ExecutionObserver: Send {
    fn on_start(&mut self, tool: &str);
    fn on_output(&mut self, chunk: &str);
    fn on_error(&mut self, message: &str);
}

/// Observer that discards every event.
pub struct NullObserver;

impl ExecutionObserver for NullObserver {
    fn on_start(&mut self, _tool: &str) {}
    fn on_output(&mut self, _chunk: &str) {}
    fn on_error(&mut self, _message: &str) {}
}

/// External cancellation handle. Triggering it is equivalent to timeout
/// expiry: the child is force-killed and the outcome is a terminal failure.
#[derive(Clone, Default)]
pub struct CancelSignal {
    inner: Arc<Notify>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.notify_one();
    }

    async fn cancelled(&self) {
        self.inner.notified().await;
    }
}

/// Terminal classification of one supervised process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Exited,
    TimedOut,
    Cancelled,
}

/// Normalized result of one supervised process run.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub status: OutcomeStatus,
    /// Exit code of the child; -1 when the child was killed or the platform
    /// reported no code.
    pub exit_code: i32,
    /// Accumulated output, identical to the concatenation of the chunks
    /// delivered through `on_output`.
    pub output: String,
    /// Wall-clock time from spawn to exit or forced termination.
    pub duration: Duration,
}

impl ProcessOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == OutcomeStatus::Exited && self.exit_code == 0
    }
}

enum StreamEvent {
    Chunk(String),
    ReadError(String),
}

pub struct ExecutionEngine;

impl ExecutionEngine {
    pub fn new() -> Self {
        ExecutionEngine
    }

    /// Supervise exactly one external process invocation.
    ///
    /// Returns `Err` only for pre-execution faults (empty command, spawn
    /// failure); once the child is running, timeouts, cancellation, and
    /// non-zero exits are all reported as data in the outcome. Spawn
    /// failures are also surfaced through `on_error` before returning.
    pub async fn run(
        &self,
        tool: &str,
        invocation: &Invocation,
        timeout: Duration,
        cancel: Option<CancelSignal>,
        observer: &mut dyn ExecutionObserver,
    ) -> Result<ProcessOutcome, AppError> {
        if invocation.program.trim().is_empty() {
            return Err(
                AppError::new(ErrorCategory::Configuration, "engine command is empty")
                    .with_code("ENG-001"),
            );
        }

        let execution_id = Uuid::new_v4();
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .env("TASKPILOT_EXECUTION_ID", execution_id.to_string())
            .stdin(if invocation.stdin_payload.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &invocation.env {
            command.env(key, value);
        }

        info!(
            tool,
            %execution_id,
            program = %invocation.program,
            timeout_ms = timeout.as_millis() as u64,
            "starting supervised process"
        );

        let start = Instant::now();
        let mut child = command.spawn().map_err(|err| {
            let message = format!("failed to start '{}': {err}", invocation.program);
            observer.on_error(&message);
            AppError::new(ErrorCategory::Spawn, message)
                .with_code("ENG-002")
                .with_context("tool", tool)
        })?;

        observer.on_start(tool);

        if let Some(payload) = &invocation.stdin_payload {
            if let Some(mut stdin) = child.stdin.take() {
                let payload = payload.clone();
                tokio::spawn(async move {
                    let _ = stdin.write_all(payload.as_bytes()).await;
                    let _ = stdin.shutdown().await;
                });
            }
        }

        let stdout = child.stdout.take().expect("stdout is piped");
        let stderr = child.stderr.take().expect("stderr is piped");
        let (tx, mut rx) = mpsc::channel::<StreamEvent>(OUTPUT_CHANNEL_CAPACITY);
        let out_task = tokio::spawn(pump_stream(stdout, tx.clone()));
        let err_task = tokio::spawn(pump_stream(stderr, tx));

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let cancel = cancel.unwrap_or_default();

        let mut output = String::new();
        let mut streams_done = false;
        let mut exit_status = None;
        let mut status = OutcomeStatus::Exited;

        loop {
            tokio::select! {
                event = rx.recv(), if !streams_done => match event {
                    Some(StreamEvent::Chunk(chunk)) => {
                        if output.len() + chunk.len() <= OUTPUT_CAPTURE_LIMIT_BYTES {
                            observer.on_output(&chunk);
                            output.push_str(&chunk);
                        }
                    }
                    Some(StreamEvent::ReadError(message)) => observer.on_error(&message),
                    None => streams_done = true,
                },
                wait = child.wait(), if streams_done => match wait {
                    Ok(st) => exit_status = Some(st),
                    Err(err) => {
                        let message = format!("failed to wait for '{}': {err}", invocation.program);
                        observer.on_error(&message);
                        return Err(AppError::new(ErrorCategory::Io, message));
                    }
                },
                () = &mut deadline => {
                    status = OutcomeStatus::TimedOut;
                    break;
                }
                () = cancel.cancelled() => {
                    status = OutcomeStatus::Cancelled;
                    break;
                }
            }
            if exit_status.is_some() {
                break;
            }
        }

        if status != OutcomeStatus::Exited {
            // Stop consuming output before reclaiming the child.
            out_task.abort();
            err_task.abort();
            if let Err(err) = child.kill().await {
                observer.on_error(&format!("failed to kill '{}': {err}", invocation.program));
            }
            debug!(tool, %execution_id, ?status, "terminated supervised process");
        }

        let duration = start.elapsed();
        let exit_code = exit_status.and_then(|st| st.code()).unwrap_or(-1);

        info!(
            tool,
            %execution_id,
            exit_code,
            duration_ms = duration.as_millis() as u64,
            ?status,
            "supervised process completed"
        );

        Ok(ProcessOutcome {
            status,
            exit_code,
            output,
            duration,
        })
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

async fn pump_stream<R>(mut stream: R, tx: mpsc::Sender<StreamEvent>)
where
    R: AsyncRead + Unpin + Send,
{
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                if tx.send(StreamEvent::Chunk(chunk)).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                let _ = tx
                    .send(StreamEvent::ReadError(format!("stream read failed: {err}")))
                    .await;
                break;
            }
        }
    }
}
