//! The redirection rule published by the launcher through the child's
//! environment.
//!
//! The rule is parsed once, on the first intercepted call, and is
//! immutable for the lifetime of the process. Anything wrong with the
//! publication — variables absent, empty, or violating the
//! target-under-source invariant — yields `None`, and every hook becomes
//! a pure pass-through. A plain invocation without a profile is the
//! common case, not an error.

use once_cell::sync::Lazy;
use std::ffi::OsString;

/// Environment keys shared between the launcher and the shim.
pub mod env {
    /// Absolute path of the configuration directory to intercept.
    pub const REDIRECT_SOURCE: &str = "DIRSWAP_REDIRECT_SOURCE";
    /// Absolute path of the profile directory to redirect into.
    pub const REDIRECT_TARGET: &str = "DIRSWAP_REDIRECT_TARGET";
    /// `"1"` enables per-call diagnostics on stderr.
    pub const DEBUG: &str = "DIRSWAP_DEBUG";

    /// The dynamic loader's injection variable for this platform.
    #[cfg(target_os = "macos")]
    pub const PRELOAD: &str = "DYLD_INSERT_LIBRARIES";
    #[cfg(not(target_os = "macos"))]
    pub const PRELOAD: &str = "LD_PRELOAD";
}

/// One launch's redirection mapping, as seen from inside the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRule {
    pub source: Vec<u8>,
    pub target: Vec<u8>,
    pub debug: bool,
}

impl RedirectRule {
    /// Parse a rule from the process environment.
    pub fn from_env() -> Option<Self> {
        Self::from_env_with(|key| std::env::var_os(key))
    }

    /// Parse a rule with a custom variable lookup (for testing).
    pub fn from_env_with<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let source = os_bytes(lookup(env::REDIRECT_SOURCE)?)?;
        let target = os_bytes(lookup(env::REDIRECT_TARGET)?)?;

        // The target must live under the source with at least one extra
        // segment, or a rewritten path would itself match the rule again.
        if target.len() <= source.len() + 1
            || !target.starts_with(&source)
            || target[source.len()] != b'/'
        {
            return None;
        }

        let debug = lookup(env::DEBUG).is_some_and(|v| v == "1");

        Some(Self {
            source,
            target,
            debug,
        })
    }
}

/// Process-wide rule, populated before the wrapped program's first
/// intercepted call and never mutated afterward. All reads go through
/// [`active_rule`].
static RULE: Lazy<Option<RedirectRule>> = Lazy::new(RedirectRule::from_env);

/// The published rule, or `None` when this process runs unredirected.
pub fn active_rule() -> Option<&'static RedirectRule> {
    RULE.as_ref()
}

fn os_bytes(value: OsString) -> Option<Vec<u8>> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStringExt;
        let bytes = value.into_vec();
        if bytes.is_empty() { None } else { Some(bytes) }
    }
    #[cfg(not(unix))]
    {
        let s = value.into_string().ok()?;
        if s.is_empty() { None } else { Some(s.into_bytes()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<OsString> + 'a {
        move |key| map.get(key).map(OsString::from)
    }

    #[test]
    fn absent_publication_yields_none() {
        let vars = HashMap::new();
        assert_eq!(RedirectRule::from_env_with(lookup(&vars)), None);
    }

    #[test]
    fn source_without_target_yields_none() {
        let mut vars = HashMap::new();
        vars.insert(env::REDIRECT_SOURCE, "/ws/.cursor");
        assert_eq!(RedirectRule::from_env_with(lookup(&vars)), None);
    }

    #[test]
    fn empty_values_yield_none() {
        let mut vars = HashMap::new();
        vars.insert(env::REDIRECT_SOURCE, "");
        vars.insert(env::REDIRECT_TARGET, "/ws/.cursor/agents/x");
        assert_eq!(RedirectRule::from_env_with(lookup(&vars)), None);
    }

    #[test]
    fn target_not_under_source_yields_none() {
        let mut vars = HashMap::new();
        vars.insert(env::REDIRECT_SOURCE, "/ws/.cursor");
        vars.insert(env::REDIRECT_TARGET, "/elsewhere/designer");
        assert_eq!(RedirectRule::from_env_with(lookup(&vars)), None);

        // Equal prefixes would self-trigger.
        vars.insert(env::REDIRECT_TARGET, "/ws/.cursor");
        assert_eq!(RedirectRule::from_env_with(lookup(&vars)), None);

        // Sibling directory sharing the string prefix but not the
        // component boundary.
        vars.insert(env::REDIRECT_TARGET, "/ws/.cursorier/designer");
        assert_eq!(RedirectRule::from_env_with(lookup(&vars)), None);
    }

    #[test]
    fn valid_publication_parses() {
        let mut vars = HashMap::new();
        vars.insert(env::REDIRECT_SOURCE, "/ws/.cursor");
        vars.insert(env::REDIRECT_TARGET, "/ws/.cursor/agents/designer");
        let rule = RedirectRule::from_env_with(lookup(&vars)).unwrap();
        assert_eq!(rule.source, b"/ws/.cursor");
        assert_eq!(rule.target, b"/ws/.cursor/agents/designer");
        assert!(!rule.debug);
    }

    #[test]
    fn debug_flag_is_read() {
        let mut vars = HashMap::new();
        vars.insert(env::REDIRECT_SOURCE, "/ws/.cursor");
        vars.insert(env::REDIRECT_TARGET, "/ws/.cursor/agents/designer");
        vars.insert(env::DEBUG, "1");
        assert!(RedirectRule::from_env_with(lookup(&vars)).unwrap().debug);

        vars.insert(env::DEBUG, "0");
        assert!(!RedirectRule::from_env_with(lookup(&vars)).unwrap().debug);
    }
}
