use crate::core::engine::DEFAULT_TIMEOUT_MS;
use crate::core::types::TaskType;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ToolsArgs {
    /// Project root containing taskpilot.toml (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExecArgs {
    /// Free-text task instruction handed to the selected tool
    #[arg(value_name = "TASK")]
    pub task: String,

    /// Project root the tool runs against (default: current directory)
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Category of work, used to pick a capable tool
    #[arg(long = "task-type", value_enum, default_value_t = TaskType::Code)]
    pub task_type: TaskType,

    /// Dispatch to a named tool, bypassing selection (availability is still
    /// verified)
    #[arg(long, value_name = "NAME", help_heading = "Tool Selection")]
    pub tool: Option<String>,

    /// File hint passed to the tool; repeatable, order preserved
    #[arg(long = "file", value_name = "PATH", help_heading = "Tool Selection")]
    pub files: Vec<PathBuf>,

    /// Named skill hint forwarded through the context metadata
    #[arg(long, value_name = "NAME", help_heading = "Tool Selection")]
    pub skill: Option<String>,

    /// Abort the invocation after this many milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS, value_name = "MS", help_heading = "Timeouts")]
    pub timeout_ms: u64,

    /// Skip loading grounding memory from the state directory
    #[arg(long, help_heading = "Grounding")]
    pub no_memory: bool,
}

#[derive(Args)]
pub struct ProposeArgs {
    /// Project root the proposals are grounded in (default: current
    /// directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Maximum number of proposals to produce
    #[arg(long, default_value = "5", value_name = "N")]
    pub count: usize,

    /// Vision statement overriding the one from taskpilot.toml
    #[arg(long, value_name = "TEXT", help_heading = "Grounding")]
    pub vision: Option<String>,

    /// Recent task title fed to the tool for dedup context; repeatable
    #[arg(long = "recent", value_name = "TITLE", help_heading = "Grounding")]
    pub recent: Vec<String>,

    /// Skip loading grounding memory from the state directory
    #[arg(long, help_heading = "Grounding")]
    pub no_memory: bool,
}
