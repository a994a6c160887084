//! TOML configuration: `$XDG_CONFIG_HOME/dirswap/config.toml`.
//!
//! Every field has a default; a missing file means defaults. The config
//! names the wrapped program's conventions (which directory to intercept,
//! where profiles live under it) — the core itself is agnostic to both.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::paths::Paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolved directories (not serialized)
    #[serde(skip)]
    pub paths: Paths,

    #[serde(default)]
    pub redirect: RedirectConfig,

    #[serde(default)]
    pub launch: LaunchConfig,

    #[serde(default)]
    pub shim: ShimConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// Name of the config directory to intercept, relative to the
    /// workspace root (e.g. ".cursor").
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Profile tree under `source_dir` (e.g. "agents" means profiles
    /// live at `<source_dir>/agents/<name>`).
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Program to launch when the command line names none.
    #[serde(default)]
    pub program: Option<String>,

    /// Default for the per-launch diagnostics flag.
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShimConfig {
    /// Explicit shim artifact path, overriding the installed copy.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            profiles_dir: default_profiles_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Paths::resolve()?;
        let path = paths.config_file();

        if !path.exists() {
            return Ok(Config {
                paths,
                ..Config::default()
            });
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.paths = paths;
        Ok(config)
    }

    /// Commented starter config written by `dirswap config init`.
    pub fn template() -> &'static str {
        r#"# dirswap configuration

[redirect]
# Config directory to intercept, relative to the workspace root.
source_dir = ".cursor"
# Profiles live at <source_dir>/<profiles_dir>/<name>.
profiles_dir = "agents"

[launch]
# Program to launch when none is given on the command line.
# program = "cursor-agent"
# Emit a diagnostic line for every evaluated redirect.
debug = false

[shim]
# Explicit shim library path; normally auto-located.
# path = "~/.local/share/dirswap/libdirswap_shim.so"
"#
    }
}

fn default_source_dir() -> String {
    ".cursor".to_string()
}

fn default_profiles_dir() -> String {
    "agents".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_has_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.redirect.source_dir, ".cursor");
        assert_eq!(config.redirect.profiles_dir, "agents");
        assert_eq!(config.launch.program, None);
        assert!(!config.launch.debug);
        assert_eq!(config.shim.path, None);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [redirect]
            source_dir = ".myapp"

            [launch]
            program = "myapp"
            "#,
        )
        .unwrap();
        assert_eq!(config.redirect.source_dir, ".myapp");
        assert_eq!(config.redirect.profiles_dir, "agents");
        assert_eq!(config.launch.program.as_deref(), Some("myapp"));
    }

    #[test]
    fn template_parses_to_defaults() {
        let config: Config = toml::from_str(Config::template()).unwrap();
        assert_eq!(config.redirect.source_dir, ".cursor");
        assert!(!config.launch.debug);
    }
}
