use crate::adapters::{self, ToolAdapter};
use crate::cli::{ExecArgs, ProposeArgs, ToolsArgs};
use crate::core::config::TaskpilotConfig;
use crate::core::engine::{CancelSignal, ExecutionObserver};
use crate::core::entities::{ExecutionContext, ExecutionResult};
use crate::core::error::AppError;
use crate::core::memory;
use crate::core::pipeline::{ProposalIntent, ProposalPipeline};
use crate::core::registry::ToolRegistry;
use crate::core::types::ErrorCategory;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Observer that renders live progress on the console: chunks go straight
/// to stdout, engine-level problems to stderr.
struct ConsoleObserver;

impl ExecutionObserver for ConsoleObserver {
    fn on_start(&mut self, tool: &str) {
        eprintln!("[{tool}] started");
    }

    fn on_output(&mut self, chunk: &str) {
        print!("{chunk}");
        let _ = std::io::stdout().flush();
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("[engine] {message}");
    }
}

fn resolve_root(path: Option<PathBuf>) -> crate::Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

/// Wire ctrl-c to the cancel signal so an interrupted invocation tears the
/// external process down like a timeout would.
fn install_ctrl_c(cancel: &CancelSignal) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });
}

pub async fn tools(args: ToolsArgs) -> crate::Result<()> {
    let root = resolve_root(args.path)?;
    let config = TaskpilotConfig::load(&root)?;
    let registry = adapters::default_registry(&config, None)?;

    let available = registry.available().await;
    let up: Vec<&str> = available.iter().map(|d| d.name.as_str()).collect();

    println!("Registered tools ({}):", registry.len());
    for descriptor in registry.descriptors() {
        let capabilities: Vec<&str> = descriptor
            .capabilities
            .iter()
            .map(|t| t.as_str())
            .collect();
        let state = if up.contains(&descriptor.name.as_str()) {
            "available"
        } else {
            "unavailable"
        };
        println!(
            "  {:<12} priority {}  [{}]  {}",
            descriptor.name,
            descriptor.priority,
            capabilities.join(", "),
            state
        );
    }
    Ok(())
}

pub async fn exec(args: ExecArgs) -> crate::Result<()> {
    let root = resolve_root(args.path.clone())?;
    let config = TaskpilotConfig::load(&root)?;

    let cancel = CancelSignal::new();
    install_ctrl_c(&cancel);
    let registry = adapters::default_registry(&config, Some(cancel))?;

    let adapter = select_adapter(&registry, &args).await?;

    let mut context = ExecutionContext::new(args.task, args.task_type, &root)
        .with_files(args.files)
        .with_metadata("timeout_ms", args.timeout_ms.to_string());
    if let Some(skill) = args.skill {
        context = context.with_metadata("skill", skill);
    }
    if !args.no_memory {
        let snippets = memory::load_memory(&context.state_dir, config.defaults.memory_limit);
        context = context.with_memory(snippets);
    }

    let mut observer = ConsoleObserver;
    let result = adapter.execute(&context, &mut observer).await;
    render_result(&result);

    if result.success {
        Ok(())
    } else {
        let message = result
            .error
            .unwrap_or_else(|| "tool failed without detail".to_string());
        Err(AppError::new(ErrorCategory::ToolExecution, message).into())
    }
}

async fn select_adapter(
    registry: &ToolRegistry,
    args: &ExecArgs,
) -> crate::Result<Arc<dyn ToolAdapter>> {
    match &args.tool {
        Some(name) => {
            let adapter = registry.get(name).ok_or_else(|| {
                AppError::new(
                    ErrorCategory::Configuration,
                    format!("unknown tool '{name}'; run `taskpilot tools` to list them"),
                )
            })?;
            if !adapter.check_availability().await {
                return Err(AppError::new(
                    ErrorCategory::Unavailable,
                    format!("tool '{name}' is not available on this system"),
                )
                .into());
            }
            Ok(adapter)
        }
        None => registry.find_best_tool(args.task_type).await.ok_or_else(|| {
            AppError::new(
                ErrorCategory::Unavailable,
                format!("no available tool supports {} tasks", args.task_type),
            )
            .into()
        }),
    }
}

fn render_result(result: &ExecutionResult) {
    println!();
    let duration = humantime::format_duration(Duration::from_millis(result.duration_ms));
    if result.success {
        println!("completed in {duration}");
    } else {
        eprintln!("failed after {duration}");
    }
    if let Some(tokens) = result.tokens_used {
        println!("tokens used: {tokens}");
    }
    if let Some(artifacts) = &result.artifacts {
        println!("files touched:");
        for file in &artifacts.files {
            println!("  {}", file.display());
        }
    }
}

pub async fn propose(args: ProposeArgs) -> crate::Result<()> {
    let root = resolve_root(args.path)?;
    let config = TaskpilotConfig::load(&root)?;

    let cancel = CancelSignal::new();
    install_ctrl_c(&cancel);
    let registry = adapters::default_registry(&config, Some(cancel))?;

    let snippets = if args.no_memory {
        Vec::new()
    } else {
        memory::load_memory(
            &root.join(crate::core::entities::STATE_DIR),
            config.defaults.memory_limit,
        )
    };

    let intent = ProposalIntent {
        count: args.count,
        vision: args.vision.or_else(|| config.project.vision.clone()),
        recent: args.recent,
        memory: snippets,
    };

    let pipeline = ProposalPipeline::new(&registry);
    let mut observer = ConsoleObserver;
    let proposals = pipeline.generate(&intent, &root, &mut observer).await?;

    if proposals.is_empty() {
        warn!("tool ran but produced no parseable proposals");
        println!("No proposals produced.");
        return Ok(());
    }

    println!();
    println!("Proposals ({}):", proposals.len());
    for (index, proposal) in proposals.iter().enumerate() {
        let points = proposal
            .points
            .map(|p| format!(", {p} pts"))
            .unwrap_or_default();
        println!(
            "{}. [{}] {} (priority {}{points})",
            index + 1,
            proposal.task_type,
            proposal.title,
            proposal.priority,
        );
        println!("   {}", proposal.description);
    }
    Ok(())
}
