use anyhow::{Result, bail};
use clap::Args;
use std::ffi::OsString;
use std::path::Path;

use crate::config::Config;
use crate::launch::{self, PreparedRedirect, RedirectionContext};

#[derive(Args)]
pub struct RunArgs {
    /// Profile to redirect the program's config reads into
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Emit a diagnostic line for every evaluated redirect
    #[arg(long)]
    pub debug: bool,

    /// Program and its arguments (after `--`); falls back to
    /// [launch].program from the config
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<OsString>,
}

/// Returns the exit status to surface — the child's own, faithfully.
pub fn run(args: RunArgs, workspace: Option<&Path>) -> Result<i32> {
    let config = Config::load()?;
    let workspace = match workspace {
        Some(ws) => ws.to_path_buf(),
        None => std::env::current_dir()?,
    };

    let mut command = args.command;
    if command.is_empty()
        && let Some(program) = &config.launch.program
    {
        command.push(OsString::from(program));
    }
    let Some((program, forwarded)) = command.split_first() else {
        bail!("no program to run: pass one after `--` or set [launch].program in the config");
    };

    let exe = launch::find_executable(program)?;

    let redirect = match &args.profile {
        Some(name) => {
            let ctx = RedirectionContext::resolve(
                &workspace,
                &config.redirect.source_dir,
                &config.redirect.profiles_dir,
                name,
                args.debug || config.launch.debug,
            )?;
            let shim = launch::ensure_shim(&config.paths, config.shim.path.as_deref())?;
            Some(PreparedRedirect { ctx, shim })
        }
        None => None,
    };

    let outcome = launch::launch(&exe, forwarded, redirect.as_ref())?;
    Ok(outcome.status_code())
}
