mod commands;
mod config;
mod progress;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "diskdump",
    version,
    about = "PostgreSQL backups to Yandex Disk with retention"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Config file (default: <config dir>/diskdump/diskdump.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        commands::Command::Init(args) => commands::init::run(args, config).await,
        commands::Command::Run(args) => commands::run::run(args, config).await,
        commands::Command::List(args) => commands::list::run(args, config).await,
        commands::Command::Prune(args) => commands::prune::run(args, config).await,
        commands::Command::Config(args) => commands::describe::run(args, config).await,
    }
}
