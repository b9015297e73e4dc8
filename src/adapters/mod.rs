//! Tool adapters for external AI coding assistants.
//!
//! Each adapter encapsulates one external tool's invocation convention:
//! how to probe that the tool is installed, how to translate the generic
//! [`ExecutionContext`] into the tool's command line, and how to map the
//! supervised process outcome back into an [`ExecutionResult`].
//!
//! | Adapter | Binary | Task text via |
//! |---------|--------|---------------|
//! | `claude-code` | `claude` | argv (`-p`) |
//! | `codex` | `codex` | stdin |
//! | `opencode` | `opencode` | argv (`run`) |
//! | `aider` | `aider` | argv (`--message`) |
//!
//! Custom tools defined in `taskpilot.toml` are wrapped by the
//! [`passthrough`] adapter. Adding a built-in tool means adding one module
//! here; the registry is untouched.

pub mod aider;
pub mod claude_code;
pub mod codex;
pub mod opencode;
pub mod passthrough;

use crate::core::config::TaskpilotConfig;
use crate::core::engine::{
    CancelSignal, ExecutionEngine, ExecutionObserver, Invocation, OutcomeStatus, ProcessOutcome,
    DEFAULT_TIMEOUT_MS,
};
use crate::core::entities::{ExecutionContext, ExecutionResult, ToolDescriptor};
use crate::core::error::AppError;
use crate::core::registry::ToolRegistry;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// Names of the built-in adapters, in default registration order.
pub const BUILTIN_ADAPTERS: [&str; 4] = ["claude-code", "codex", "opencode", "aider"];

/// Upper bound on one availability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Capability set {check availability, execute} every adapter implements.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    /// Cheap, side-effect-free probe of the underlying tool. Never errors;
    /// any probe failure reads as unavailable. Install state is re-checked
    /// on every call.
    async fn check_availability(&self) -> bool;

    /// Execute one unit of work. All failure modes (spawn failure,
    /// timeout, cancellation, non-zero exit) come back as data in the
    /// result, with the error message attributed to this tool.
    async fn execute(
        &self,
        context: &ExecutionContext,
        observer: &mut dyn ExecutionObserver,
    ) -> ExecutionResult;
}

/// Runtime configuration shared by the built-in adapters.
#[derive(Clone)]
pub struct AdapterConfig {
    pub binary: String,
    pub extra_args: Vec<String>,
    pub model: Option<String>,
    pub timeout: Duration,
    /// External cancellation handle shared by the caller; `None` means the
    /// invocation can only end by completion or timeout.
    pub cancel: Option<CancelSignal>,
}

impl AdapterConfig {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
            model: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Effective timeout for one invocation: the context's `timeout_ms`
    /// metadata overrides the configured default.
    pub(crate) fn effective_timeout(&self, context: &ExecutionContext) -> Duration {
        context
            .metadata
            .get("timeout_ms")
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(self.timeout)
    }
}

/// Probe a binary with a version-style argument: available iff the process
/// starts and exits zero within [`PROBE_TIMEOUT`].
pub(crate) async fn probe_binary(binary: &str, arg: &str) -> bool {
    let mut command = Command::new(binary);
    command
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT, command.status()).await,
        Ok(Ok(status)) if status.success()
    )
}

/// Render the generic context into one prompt string: skill hint first,
/// then the task, then file hints and read-only grounding memory.
pub(crate) fn compose_prompt(context: &ExecutionContext) -> String {
    let mut prompt = String::new();
    if let Some(skill) = context.metadata.get("skill") {
        prompt.push_str(&format!("Apply the '{skill}' skill.\n\n"));
    }
    prompt.push_str(&context.task);
    if !context.files.is_empty() {
        prompt.push_str("\n\nFocus on these files:\n");
        for file in &context.files {
            prompt.push_str(&format!("- {}\n", file.display()));
        }
    }
    if !context.memory.is_empty() {
        prompt.push_str("\nProject memory for grounding (read-only):\n");
        for snippet in &context.memory {
            prompt.push_str(&format!("\n### {}\n{}\n", snippet.label, snippet.content));
        }
    }
    prompt
}

/// Map a supervised process outcome into the normalized result contract,
/// attributing every failure to the tool by name.
pub(crate) fn normalize_outcome(
    tool: &str,
    outcome: ProcessOutcome,
    timeout: Duration,
) -> ExecutionResult {
    let duration_ms = outcome.duration.as_millis() as u64;
    match outcome.status {
        OutcomeStatus::TimedOut => ExecutionResult::failure(
            tool,
            format!("timed out after {}", humantime::format_duration(timeout)),
            outcome.output,
            duration_ms,
        ),
        OutcomeStatus::Cancelled => ExecutionResult::failure(
            tool,
            "cancelled before completion",
            outcome.output,
            duration_ms,
        ),
        OutcomeStatus::Exited if outcome.exit_code != 0 => {
            let message = match trailing_line(&outcome.output) {
                Some(line) => format!("exited with status {}: {line}", outcome.exit_code),
                None => format!("exited with status {}", outcome.exit_code),
            };
            ExecutionResult::failure(tool, message, outcome.output, duration_ms)
        }
        OutcomeStatus::Exited => ExecutionResult::success(outcome.output, duration_ms),
    }
}

/// Map an engine-level fault (spawn failure and friends) into the result
/// contract. The observer has already seen the error.
pub(crate) fn fault_result(tool: &str, error: AppError, duration_ms: u64) -> ExecutionResult {
    ExecutionResult::failure(tool, error.message, String::new(), duration_ms)
}

fn trailing_line(output: &str) -> Option<&str> {
    output.lines().rev().map(str::trim).find(|line| !line.is_empty())
}

/// Best-effort `tokens used: N` extraction for tools that report usage as
/// plain text.
pub(crate) fn parse_tokens_used(output: &str) -> Option<u64> {
    let re = regex::Regex::new(r"(?i)tokens?\s*used\s*[:=]?\s*([0-9][0-9,]*)").ok()?;
    let caps = re.captures(output)?;
    caps[1].replace(',', "").parse().ok()
}

/// Build the default registry: the four built-in adapters honoring any
/// `taskpilot.toml` overrides, followed by config-defined custom tools in
/// name order.
pub fn default_registry(
    config: &TaskpilotConfig,
    cancel: Option<CancelSignal>,
) -> Result<ToolRegistry, AppError> {
    let mut registry = ToolRegistry::new();

    for name in BUILTIN_ADAPTERS {
        let overrides = config.tool(name);
        if overrides.is_some_and(|o| !o.enabled) {
            continue;
        }
        let adapter: Arc<dyn ToolAdapter> = match name {
            "claude-code" => Arc::new(claude_code::ClaudeCodeAdapter::new(
                adapter_config(name, "claude", config, cancel.clone()),
                priority_for(config, name, claude_code::DEFAULT_PRIORITY),
            )),
            "codex" => Arc::new(codex::CodexAdapter::new(
                adapter_config(name, "codex", config, cancel.clone()),
                priority_for(config, name, codex::DEFAULT_PRIORITY),
            )),
            "opencode" => Arc::new(opencode::OpenCodeAdapter::new(
                adapter_config(name, "opencode", config, cancel.clone()),
                priority_for(config, name, opencode::DEFAULT_PRIORITY),
            )),
            "aider" => Arc::new(aider::AiderAdapter::new(
                adapter_config(name, "aider", config, cancel.clone()),
                priority_for(config, name, aider::DEFAULT_PRIORITY),
            )),
            _ => unreachable!("unknown built-in adapter"),
        };
        registry.register(adapter)?;
    }

    for (name, tool) in &config.tools {
        if BUILTIN_ADAPTERS.contains(&name.as_str()) || !tool.enabled {
            continue;
        }
        let Some(command) = &tool.command else {
            continue;
        };
        let timeout = tool
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(config.defaults.timeout_ms));
        registry.register(Arc::new(passthrough::PassthroughAdapter::new(
            name.clone(),
            command.clone(),
            tool.capabilities.clone(),
            tool.priority.unwrap_or(passthrough::DEFAULT_PRIORITY),
            timeout,
            cancel.clone(),
        )))?;
    }

    Ok(registry)
}

fn adapter_config(
    name: &str,
    default_binary: &str,
    config: &TaskpilotConfig,
    cancel: Option<CancelSignal>,
) -> AdapterConfig {
    let overrides = config.tool(name);
    let binary = overrides
        .and_then(|o| o.binary.clone())
        .unwrap_or_else(|| default_binary.to_string());
    let timeout_ms = overrides
        .and_then(|o| o.timeout_ms)
        .unwrap_or(config.defaults.timeout_ms);
    let mut adapter_config =
        AdapterConfig::new(binary).with_timeout(Duration::from_millis(timeout_ms));
    if let Some(o) = overrides {
        adapter_config.extra_args = o.args.clone();
        adapter_config.model = o.model.clone();
    }
    adapter_config.cancel = cancel;
    adapter_config
}

fn priority_for(config: &TaskpilotConfig, name: &str, default: u8) -> u8 {
    config.tool(name).and_then(|o| o.priority).unwrap_or(default)
}

/// Shared execute path for the built-in adapters: run the invocation under
/// supervision and normalize the outcome; engine faults become attributed
/// failure results rather than raised errors.
pub(crate) async fn run_supervised(
    engine: &ExecutionEngine,
    descriptor: &ToolDescriptor,
    config: &AdapterConfig,
    context: &ExecutionContext,
    invocation: Invocation,
    observer: &mut dyn ExecutionObserver,
) -> ExecutionResult {
    let timeout = config.effective_timeout(context);
    let started = std::time::Instant::now();
    match engine
        .run(
            &descriptor.name,
            &invocation,
            timeout,
            config.cancel.clone(),
            observer,
        )
        .await
    {
        Ok(outcome) => normalize_outcome(&descriptor.name, outcome, timeout),
        Err(error) => fault_result(
            &descriptor.name,
            error,
            started.elapsed().as_millis() as u64,
        ),
    }
}
