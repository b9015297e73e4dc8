//! Aider adapter - wrapper for the aider patch-applying CLI.

use super::{compose_prompt, probe_binary, run_supervised, AdapterConfig, ToolAdapter};
use crate::core::engine::{ExecutionEngine, ExecutionObserver, Invocation};
use crate::core::entities::{
    ExecutionArtifacts, ExecutionContext, ExecutionResult, TaskType, ToolDescriptor,
};
use async_trait::async_trait;
use std::path::PathBuf;

pub const DEFAULT_PRIORITY: u8 = 1;

/// Aider applies edits directly to the working tree; the file hints from
/// the context become its file arguments, and the files it reports touching
/// are folded into the result artifacts.
pub struct AiderAdapter {
    descriptor: ToolDescriptor,
    config: AdapterConfig,
    engine: ExecutionEngine,
}

impl AiderAdapter {
    pub fn new(config: AdapterConfig, priority: u8) -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                "aider",
                [TaskType::Code, TaskType::Refactor],
                priority,
            ),
            config,
            engine: ExecutionEngine::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(AdapterConfig::new("aider"), DEFAULT_PRIORITY)
    }

    fn build_invocation(&self, context: &ExecutionContext) -> Invocation {
        let mut invocation = Invocation::new(&self.config.binary, &context.project_root)
            .with_arg("--message")
            .with_arg(compose_prompt(context))
            .with_arg("--yes-always")
            .with_arg("--no-auto-commits");
        if let Some(model) = &self.config.model {
            invocation = invocation.with_arg("--model").with_arg(model.clone());
        }
        invocation = invocation.with_args(self.config.extra_args.iter().cloned());
        for file in &context.files {
            invocation = invocation.with_arg(file.display().to_string());
        }
        invocation
    }
}

#[async_trait]
impl ToolAdapter for AiderAdapter {
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
            let artifacts = parse_applied_edits(&result.output);
            result.with_artifacts(artifacts)
        } else {
            result
        }
    }
}

/// Collect `Applied edit to <file>` lines into artifacts, preserving
/// report order.
fn parse_applied_edits(output: &str) -> Option<ExecutionArtifacts> {
    let re = regex::Regex::new(r"(?m)^Applied edit to (.+)$").ok()?;
    let files: Vec<PathBuf> = re
        .captures_iter(output)
        .map(|caps| PathBuf::from(caps[1].trim()))
        .collect();
    if files.is_empty() {
        None
    } else {
        Some(ExecutionArtifacts { files })
    }
}
