use anyhow::Result;
use clap::Parser;

use dirswap::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging goes to stderr only — stdout belongs to the wrapped program.
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => {
            let code = dirswap::cli::run::run(args, cli.workspace.as_deref())?;
            std::process::exit(code);
        }
        Commands::Profiles(args) => dirswap::cli::profiles::run(args, cli.workspace.as_deref()),
        Commands::Shim(args) => dirswap::cli::shim::run(args),
        Commands::Config(args) => dirswap::cli::config::run(args),
    }
}
