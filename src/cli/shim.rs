use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::launch::rebuild_shim;
use crate::paths::{self, SHIM_LIB_NAME};

#[derive(Args)]
pub struct ShimArgs {
    #[command(subcommand)]
    pub command: ShimCommands,
}

#[derive(Subcommand)]
pub enum ShimCommands {
    /// Show where the shim library is searched for and what was found
    Status,

    /// Build the shim from this checkout (development tree only)
    Build,

    /// Copy a built shim into the data directory
    Install {
        /// Artifact to install (default: next to this binary)
        #[arg(long)]
        from: Option<PathBuf>,
    },
}

pub fn run(args: ShimArgs) -> Result<()> {
    let config = Config::load()?;

    match args.command {
        ShimCommands::Status => run_status(&config),
        ShimCommands::Build => run_build(),
        ShimCommands::Install { from } => run_install(&config, from),
    }
}

fn run_status(config: &Config) -> Result<()> {
    let candidates = paths::shim_search_paths(&config.paths, config.shim.path.as_deref());
    let found = paths::locate_shim(&config.paths, config.shim.path.as_deref());

    println!("Shim search order:");
    for candidate in &candidates {
        let marker = if candidate.is_file() { "ok" } else { "--" };
        println!("  [{marker}] {}", candidate.display());
    }
    println!();
    match found {
        Some(path) => println!("Using: {}", path.display()),
        None => println!("No shim library found. Run `dirswap shim build` or `dirswap shim install`."),
    }

    Ok(())
}

fn run_build() -> Result<()> {
    match rebuild_shim() {
        Some(artifact) => {
            println!("Built {}", artifact.display());
            Ok(())
        }
        None => bail!("not inside a dirswap checkout, or the build failed"),
    }
}

fn run_install(config: &Config, from: Option<PathBuf>) -> Result<()> {
    let source = match from {
        Some(path) => path,
        None => paths::exe_dir()
            .map(|dir| dir.join(SHIM_LIB_NAME))
            .filter(|p| p.is_file())
            .with_context(|| format!("no {SHIM_LIB_NAME} next to this binary; pass --from"))?,
    };
    if !source.is_file() {
        bail!("artifact not found: {}", source.display());
    }

    let dest = config.paths.installed_shim();
    std::fs::create_dir_all(&config.paths.data_dir)
        .with_context(|| format!("Failed to create {}", config.paths.data_dir.display()))?;
    std::fs::copy(&source, &dest)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))?;

    println!("Installed {}", dest.display());
    Ok(())
}
