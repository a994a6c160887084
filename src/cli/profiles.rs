use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use std::path::Path;

use crate::config::Config;
use crate::profiles::{list_profiles, profile_info, profiles_root};

#[derive(Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    pub command: ProfilesCommands,
}

#[derive(Subcommand)]
pub enum ProfilesCommands {
    /// List the profiles in this workspace
    List,

    /// Show one profile in detail
    Show { name: String },
}

pub fn run(args: ProfilesArgs, workspace: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let workspace = match workspace {
        Some(ws) => ws.to_path_buf(),
        None => std::env::current_dir()?,
    };

    match args.command {
        ProfilesCommands::List => run_list(&workspace, &config),
        ProfilesCommands::Show { name } => run_show(&workspace, &config, &name),
    }
}

fn run_list(workspace: &Path, config: &Config) -> Result<()> {
    let profiles = list_profiles(workspace, config)?;

    if profiles.is_empty() {
        println!("No profiles found.");
        println!("Profiles directory: {}", profiles_root(workspace, config).display());
        println!();
        println!(
            "Create one as a directory under {}/{}/",
            config.redirect.source_dir, config.redirect.profiles_dir
        );
        return Ok(());
    }

    println!("Available profiles ({}):", profiles.len());
    println!();
    for profile in profiles {
        println!("  • {}", profile.name);
        if let Some(desc) = profile.description {
            let desc = if desc.chars().count() > 70 {
                let head: String = desc.chars().take(67).collect();
                format!("{head}...")
            } else {
                desc
            };
            println!("    {desc}");
        }
    }

    Ok(())
}

fn run_show(workspace: &Path, config: &Config, name: &str) -> Result<()> {
    let Some(info) = profile_info(workspace, config, name)? else {
        bail!(
            "profile '{}' not found under {}",
            name,
            profiles_root(workspace, config).display()
        );
    };

    println!("Profile: {}", info.name);
    println!("  Path:   {}", info.path.display());
    println!("  Files:  {}", info.file_count);
    if let Some(desc) = info.description {
        println!("  About:  {desc}");
    }

    Ok(())
}
