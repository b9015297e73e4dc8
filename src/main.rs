use clap::Parser;
use taskpilot::cli;
use taskpilot::logging;

#[tokio::main]
async fn main() -> taskpilot::Result<()> {
    let args = cli::Args::parse();
    let _logging = logging::init(args.workspace_root().as_deref())?;
    cli::run(args).await
}
