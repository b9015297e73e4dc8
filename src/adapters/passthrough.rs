//! Passthrough adapter for config-defined custom tools.
//!
//! A custom tool is an arbitrary argv from `taskpilot.toml`; the composed
//! prompt is appended as the final argument and the declared capabilities
//! come from the config block. This is also the adapter integration tests
//! register to script tool behavior with plain shell commands.

use super::{compose_prompt, run_supervised, AdapterConfig, ToolAdapter};
use crate::core::engine::{CancelSignal, ExecutionEngine, ExecutionObserver, Invocation};
use crate::core::entities::{ExecutionContext, ExecutionResult, TaskType, ToolDescriptor};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PRIORITY: u8 = 5;

pub struct PassthroughAdapter {
    descriptor: ToolDescriptor,
    command: Vec<String>,
    config: AdapterConfig,
    engine: ExecutionEngine,
}

impl PassthroughAdapter {
    pub fn new(
        name: impl Into<String>,
        command: Vec<String>,
        capabilities: Vec<TaskType>,
        priority: u8,
        timeout: Duration,
        cancel: Option<CancelSignal>,
    ) -> Self {
        let program = command.first().cloned().unwrap_or_default();
        let mut config = AdapterConfig::new(program).with_timeout(timeout);
        config.cancel = cancel;
        Self {
            descriptor: ToolDescriptor::new(name, capabilities, priority),
            command,
            config,
            engine: ExecutionEngine::new(),
        }
    }

    fn build_invocation(&self, context: &ExecutionContext) -> Invocation {
        Invocation::new(&self.config.binary, &context.project_root)
            .with_args(self.command.iter().skip(1).cloned())
            .with_arg(compose_prompt(context))
    }
}

#[async_trait]
impl ToolAdapter for PassthroughAdapter {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Custom commands rarely support a version probe, so availability is
    /// the program resolving: an explicit path that exists, or a bare name
    /// found on `PATH`.
    async fn check_availability(&self) -> bool {
        program_resolves(&self.config.binary)
    }

    async fn execute(
        &self,
        context: &ExecutionContext,
        observer: &mut dyn ExecutionObserver,
    ) -> ExecutionResult {
        let invocation = self.build_invocation(context);
        run_supervised(
            &self.engine,
            &self.descriptor,
            &self.config,
            context,
            invocation,
            observer,
        )
        .await
    }
}

fn program_resolves(program: &str) -> bool {
    if program.is_empty() {
        return false;
    }
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file();
    }
    let Ok(search_path) = std::env::var("PATH") else {
        return false;
    };
    std::env::split_paths(&search_path).any(|dir| dir.join(program).is_file())
}
