use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use planforge::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("planforge=debug")
    } else {
        EnvFilter::new("planforge=warn")
    };

    // Logs go to stderr so `--json` output stays parseable
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Import(args) => cli::import::execute(args).await,
        Commands::Plan(args) => cli::plan::execute(args).await,
        Commands::Update(args) => cli::update::execute(args).await,
        Commands::Track(args) => cli::track::execute(args).await,
        Commands::Simulate(args) => cli::simulate::execute(args).await,
        Commands::Schema => cli::schema::execute(),
    }
}
