pub mod args;
pub mod commands;

pub use args::{ExecArgs, ProposeArgs, ToolsArgs};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "taskpilot")]
#[command(version = crate::VERSION)]
#[command(about = "Task tracker that dispatches work to AI coding assistants")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: check which tools are installed, dispatch a task, then ask for backlog proposals."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "List registered tools with live availability",
        long_about = "Tools probes every registered adapter concurrently and reports which external assistants are installed and usable right now.",
        after_help = "Example:\n    taskpilot tools ./workspace"
    )]
    Tools(ToolsArgs),
    #[command(
        about = "Dispatch one task to the best capable tool",
        long_about = "Exec selects the best available tool for the task type (or a named tool), runs it as a supervised process with streaming output, and prints the normalized result.",
        after_help = "Example:\n    taskpilot exec \"add input validation\" --task-type code --file src/form.rs"
    )]
    Exec(ExecArgs),
    #[command(
        about = "Generate task proposals from project analysis",
        long_about = "Propose asks the best analysis-capable tool for task suggestions grounded in the project vision and recent history, and parses them into structured records.",
        after_help = "Example:\n    taskpilot propose --count 5 --vision \"local-first tooling\""
    )]
    Propose(ProposeArgs),
}

impl Args {
    /// Workspace root implied by the invoked command, for logging setup.
    pub fn workspace_root(&self) -> Option<PathBuf> {
        let path = match &self.command {
            Command::Tools(args) => args.path.clone(),
            Command::Exec(args) => args.path.clone(),
            Command::Propose(args) => args.path.clone(),
        };
        path.or_else(|| std::env::current_dir().ok())
    }
}

pub async fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::Tools(tools_args) => commands::tools(tools_args).await,
        Command::Exec(exec_args) => commands::exec(exec_args).await,
        Command::Propose(propose_args) => commands::propose(propose_args).await,
    }
}
