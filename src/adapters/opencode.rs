//! OpenCode adapter.

use super::{
    compose_prompt, parse_tokens_used, probe_binary, run_supervised, AdapterConfig, ToolAdapter,
};
use crate::core::engine::{ExecutionEngine, ExecutionObserver, Invocation};
use crate::core::entities::{ExecutionContext, ExecutionResult, TaskType, ToolDescriptor};
use async_trait::async_trait;

pub const DEFAULT_PRIORITY: u8 = 2;

/// OpenCode executes one-shot tasks through its `run` subcommand with the
/// prompt as the trailing argument.
pub struct OpenCodeAdapter {
    descriptor: ToolDescriptor,
    config: AdapterConfig,
    engine: ExecutionEngine,
}

impl OpenCodeAdapter {
    pub fn new(config: AdapterConfig, priority: u8) -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                "opencode",
                [
                    TaskType::Code,
                    TaskType::Analyze,
                    TaskType::Explain,
                    TaskType::Document,
                ],
                priority,
            ),
            config,
            engine: ExecutionEngine::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(AdapterConfig::new("opencode"), DEFAULT_PRIORITY)
    }

    fn build_invocation(&self, context: &ExecutionContext) -> Invocation {
        let mut invocation = Invocation::new(&self.config.binary, &context.project_root)
            .with_arg("run");
        if let Some(model) = &self.config.model {
            invocation = invocation.with_arg("--model").with_arg(model.clone());
        }
        invocation
            .with_args(self.config.extra_args.iter().cloned())
            .with_arg(compose_prompt(context))
    }
}

#[async_trait]
impl ToolAdapter for OpenCodeAdapter {
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
