use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::config::Config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a commented starter config (keeps an existing one)
    Init,

    /// Print the effective configuration
    Show,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init => run_init(),
        ConfigCommands::Show => run_show(),
    }
}

fn run_init() -> Result<()> {
    let config = Config::load()?;
    let path = config.paths.config_file();

    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&config.paths.config_dir)
        .with_context(|| format!("Failed to create {}", config.paths.config_dir.display()))?;
    std::fs::write(&path, Config::template())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn run_show() -> Result<()> {
    let config = Config::load()?;
    println!("# {}", config.paths.config_file().display());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
