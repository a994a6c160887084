pub mod config;
pub mod profiles;
pub mod run;
pub mod shim;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dirswap")]
#[command(author, version, about = "Run a CLI program against a named configuration profile")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace root (default: current directory)
    #[arg(short, long, global = true, env = "DIRSWAP_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch a program, optionally redirected into a profile
    Run(run::RunArgs),

    /// List and inspect profiles
    Profiles(profiles::ProfilesArgs),

    /// Shim library management
    Shim(shim::ShimArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}
