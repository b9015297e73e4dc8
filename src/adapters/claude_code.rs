//! Claude Code adapter - wrapper for the Claude Code CLI.

use super::{
    compose_prompt, probe_binary, run_supervised, AdapterConfig, ToolAdapter,
};
use crate::core::engine::{ExecutionEngine, ExecutionObserver, Invocation};
use crate::core::entities::{ExecutionContext, ExecutionResult, TaskType, ToolDescriptor};
use async_trait::async_trait;

pub const DEFAULT_PRIORITY: u8 = 0;

/// Claude Code takes the prompt via `-p` and emits newline-delimited JSON
/// when asked for `stream-json`; the final result line carries token usage.
pub struct ClaudeCodeAdapter {
    descriptor: ToolDescriptor,
    config: AdapterConfig,
    engine: ExecutionEngine,
}

impl ClaudeCodeAdapter {
    pub fn new(config: AdapterConfig, priority: u8) -> Self {
        Self {
            descriptor: ToolDescriptor::new("claude-code", TaskType::all(), priority),
            config,
            engine: ExecutionEngine::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(AdapterConfig::new("claude"), DEFAULT_PRIORITY)
    }

    fn build_invocation(&self, context: &ExecutionContext) -> Invocation {
        let mut invocation = Invocation::new(&self.config.binary, &context.project_root)
            .with_arg("-p")
            .with_arg(compose_prompt(context))
            .with_arg("--output-format")
            .with_arg("stream-json")
            .with_arg("--verbose")
            .with_arg("--dangerously-skip-permissions")
            .with_env(
                "TASKPILOT_PROJECT_ROOT",
                context.project_root.display().to_string(),
            );
        if let Some(model) = &self.config.model {
            invocation = invocation
                .with_arg("--model")
                .with_arg(model.clone())
                .with_env("ANTHROPIC_MODEL", model.clone());
        }
        invocation.with_args(self.config.extra_args.iter().cloned())
    }
}

#[async_trait]
impl ToolAdapter for ClaudeCodeAdapter {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn check_availability(&self) -> bool {
        probe_binary(&self.config.binary, "--version").await
    }

    async fn execute(
        &self,
        context: &ExecutionContext,
        observer: &mut dyn ExecutionObserver,
    ) -> ExecutionResult {
        let invocation = self.build_invocation(context);
        let result = run_supervised(
            &self.engine,
            &self.descriptor,
            &self.config,
            context,
            invocation,
            observer,
        )
        .await;
        if result.success {
            let tokens = parse_stream_json_usage(&result.output);
            result.with_tokens(tokens)
        } else {
            result
        }
    }
}

/// Scan stream-json output backwards for a `usage` object and sum its
/// input/output token counts. Best effort: anything unparseable is skipped.
fn parse_stream_json_usage(output: &str) -> Option<u64> {
    for line in output.lines().rev() {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line.trim()) else {
            continue;
        };
        if let Some(usage) = value.get("usage") {
            let input = usage
                .get("input_tokens")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            let output_tokens = usage
                .get("output_tokens")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            if input + output_tokens > 0 {
                return Some(input + output_tokens);
            }
        }
    }
    None
}
