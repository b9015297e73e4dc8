//! Codex CLI adapter.

use super::{
    compose_prompt, parse_tokens_used, probe_binary, run_supervised, AdapterConfig, ToolAdapter,
};
use crate::core::engine::{ExecutionEngine, ExecutionObserver, Invocation};
use crate::core::entities::{ExecutionContext, ExecutionResult, TaskType, ToolDescriptor};
use async_trait::async_trait;

pub const DEFAULT_PRIORITY: u8 = 1;

/// Codex runs non-interactively via `codex exec` and reads the task text
/// from stdin (`-`), which keeps long prompts off the command line.
pub struct CodexAdapter {
    descriptor: ToolDescriptor,
    config: AdapterConfig,
    engine: ExecutionEngine,
}

impl CodexAdapter {
    pub fn new(config: AdapterConfig, priority: u8) -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                "codex",
                [
                    TaskType::Code,
                    TaskType::Refactor,
                    TaskType::Debug,
                    TaskType::Test,
                ],
                priority,
            ),
            config,
            engine: ExecutionEngine::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(AdapterConfig::new("codex"), DEFAULT_PRIORITY)
    }

    fn build_invocation(&self, context: &ExecutionContext) -> Invocation {
        let mut invocation = Invocation::new(&self.config.binary, &context.project_root)
            .with_arg("exec")
            .with_arg("-")
            .with_stdin(compose_prompt(context));
        if let Some(model) = &self.config.model {
            invocation = invocation.with_arg("--model").with_arg(model.clone());
        }
        invocation.with_args(self.config.extra_args.iter().cloned())
    }
}

#[async_trait]
impl ToolAdapter for CodexAdapter {
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
            let tokens = parse_tokens_used(&result.output);
            result.with_tokens(tokens)
        } else {
            result
        }
    }
}
