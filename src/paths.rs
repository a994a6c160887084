//! XDG Base Directory compliant path resolution and shim artifact lookup.
//!
//! Directories resolve through a two-level fallback:
//! 1. dirswap-specific env var (DIRSWAP_CONFIG_DIR, DIRSWAP_DATA_DIR)
//! 2. XDG default via `etcetera`
//!
//! Relative paths from env vars are ignored per the XDG spec.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Platform file name of the built shim library.
#[cfg(target_os = "macos")]
pub const SHIM_LIB_NAME: &str = "libdirswap_shim.dylib";
#[cfg(not(target_os = "macos"))]
pub const SHIM_LIB_NAME: &str = "libdirswap_shim.so";

/// Env var overriding the shim artifact location outright.
pub const SHIM_ENV: &str = "DIRSWAP_SHIM";

/// Resolved directory paths. Created once at startup, all absolute.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Config directory: config.toml lives here
    pub config_dir: PathBuf,

    /// Data directory: installed shim artifact lives here
    pub data_dir: PathBuf,
}

impl Paths {
    /// Resolve using real environment variables.
    pub fn resolve() -> Result<Self> {
        Self::resolve_with_env(|key| std::env::var(key))
    }

    /// Resolve with a custom env var lookup (for testing).
    pub fn resolve_with_env<F>(env_fn: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        use etcetera::BaseStrategy;

        let strategy = etcetera::choose_base_strategy()
            .map_err(|e| anyhow::anyhow!("Failed to determine base directories: {}", e))?;

        let config_dir = env_or(&env_fn, "DIRSWAP_CONFIG_DIR", || {
            strategy.config_dir().join("dirswap")
        });

        let data_dir = env_or(&env_fn, "DIRSWAP_DATA_DIR", || {
            strategy.data_dir().join("dirswap")
        });

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Config file: config_dir/config.toml
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Installed shim artifact: data_dir/libdirswap_shim.{so,dylib}
    pub fn installed_shim(&self) -> PathBuf {
        self.data_dir.join(SHIM_LIB_NAME)
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::resolve().unwrap_or_else(|_| {
            // Emergency fallback — should never happen in practice
            let home = etcetera::home_dir().unwrap_or_else(|_| PathBuf::from("."));
            Self {
                config_dir: home.join(".config").join("dirswap"),
                data_dir: home.join(".local").join("share").join("dirswap"),
            }
        })
    }
}

/// Candidate locations for the shim artifact, in priority order:
/// env override, config override, installed copy, next to the running
/// binary (development build tree).
pub fn shim_search_paths(paths: &Paths, config_override: Option<&str>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(env_path) = std::env::var(SHIM_ENV)
        && !env_path.is_empty()
    {
        candidates.push(PathBuf::from(shellexpand::tilde(&env_path).to_string()));
    }

    if let Some(configured) = config_override
        && !configured.is_empty()
    {
        candidates.push(PathBuf::from(shellexpand::tilde(configured).to_string()));
    }

    candidates.push(paths.installed_shim());

    if let Some(dir) = exe_dir() {
        candidates.push(dir.join(SHIM_LIB_NAME));
    }

    candidates
}

/// First existing candidate, or `None`.
pub fn locate_shim(paths: &Paths, config_override: Option<&str>) -> Option<PathBuf> {
    shim_search_paths(paths, config_override)
        .into_iter()
        .find(|p| p.is_file())
}

pub(crate) fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Resolve an env var with fallback. Ignores empty and relative paths.
fn env_or<F>(env_fn: &F, var: &str, default: impl FnOnce() -> PathBuf) -> PathBuf
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    env_fn(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .unwrap_or_else(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_env(
        map: HashMap<&str, &str>,
    ) -> impl Fn(&str) -> std::result::Result<String, std::env::VarError> {
        move |key: &str| {
            map.get(key)
                .map(|v| v.to_string())
                .ok_or(std::env::VarError::NotPresent)
        }
    }

    #[test]
    fn default_paths_are_xdg_compliant() {
        let env: HashMap<&str, &str> = HashMap::new();
        let paths = Paths::resolve_with_env(make_env(env)).unwrap();

        assert!(
            paths.config_dir.ends_with("dirswap"),
            "config_dir: {:?}",
            paths.config_dir
        );
        assert!(
            paths.data_dir.ends_with("dirswap"),
            "data_dir: {:?}",
            paths.data_dir
        );
        assert!(paths.config_file().ends_with("config.toml"));
        assert!(paths.installed_shim().ends_with(SHIM_LIB_NAME));
    }

    #[test]
    fn dirswap_env_vars_override_xdg() {
        let mut env: HashMap<&str, &str> = HashMap::new();
        env.insert("DIRSWAP_CONFIG_DIR", "/custom/config");
        env.insert("DIRSWAP_DATA_DIR", "/custom/data");

        let paths = Paths::resolve_with_env(make_env(env)).unwrap();
        assert_eq!(paths.config_dir, PathBuf::from("/custom/config"));
        assert_eq!(paths.data_dir, PathBuf::from("/custom/data"));
    }

    #[test]
    fn relative_and_empty_env_paths_are_ignored() {
        let mut env: HashMap<&str, &str> = HashMap::new();
        env.insert("DIRSWAP_CONFIG_DIR", "relative/path");
        env.insert("DIRSWAP_DATA_DIR", "");

        let paths = Paths::resolve_with_env(make_env(env)).unwrap();
        assert!(paths.config_dir.is_absolute());
        assert_ne!(paths.config_dir, PathBuf::from("relative/path"));
        assert!(paths.data_dir.ends_with("dirswap"));
    }

    #[test]
    fn search_order_prefers_overrides_over_install() {
        let env: HashMap<&str, &str> = HashMap::new();
        let paths = Paths::resolve_with_env(make_env(env)).unwrap();

        let candidates = shim_search_paths(&paths, Some("/override/libdirswap_shim.so"));
        let installed_at = candidates
            .iter()
            .position(|p| *p == paths.installed_shim())
            .unwrap();
        let override_at = candidates
            .iter()
            .position(|p| *p == PathBuf::from("/override/libdirswap_shim.so"))
            .unwrap();
        assert!(override_at < installed_at);
    }
}
