//! Launch orchestration — resolve the redirection mapping, publish it to
//! a freshly spawned child, and relay the child's lifecycle back to the
//! caller.
//!
//! Per launch: `Resolving` (executable, profile, shim artifact) →
//! `Configuring` (child-only environment) → `Spawned` → `Completed`.
//! Every failure in the first two phases is terminal before any child
//! exists; everything after the spawn — including signal death — is a
//! normal outcome reported through [`ExitOutcome`], never an orchestrator
//! error.

mod build;

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use dirswap_shim::env;
use thiserror::Error;
use tracing::debug;

use crate::paths::{self, Paths};

pub use build::rebuild_shim;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("executable not found or not executable: {0}")]
    ExecutableNotFound(String),

    #[error("profile '{name}' not found under {}", .dir.display())]
    ProfileNotFound { name: String, dir: PathBuf },

    #[error("redirect shim library not found (searched: {})", format_searched(.searched))]
    InterceptionUnavailable { searched: Vec<PathBuf> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// How one launched child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitOutcome {
    /// The exit status to surface to whoever invoked us: the child's own
    /// code, or the conventional 128+N for death by signal N.
    pub fn status_code(&self) -> i32 {
        if let Some(code) = self.code {
            code
        } else if let Some(sig) = self.signal {
            128 + sig
        } else {
            1
        }
    }
}

impl From<std::process::ExitStatus> for ExitOutcome {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

/// The redirection mapping for one launch. Immutable once built; scoped
/// to a single child's environment and dropped when that child exits.
#[derive(Debug, Clone)]
pub struct RedirectionContext {
    /// Absolute path of the config directory to intercept.
    pub source_prefix: PathBuf,
    /// Absolute path of the profile directory to redirect into. Always
    /// extends `source_prefix` by at least one segment.
    pub target_prefix: PathBuf,
    /// Emit per-call diagnostics inside the child.
    pub debug: bool,
    /// Workspace root, used as the child's working directory.
    pub workspace: PathBuf,
}

impl RedirectionContext {
    /// Resolve a profile name into a redirection mapping.
    ///
    /// The workspace is canonicalized so the published prefixes agree
    /// with the child's view of its working directory even when the
    /// workspace path goes through symlinks. A missing profile directory
    /// is a hard error — a launch never silently runs unredirected.
    pub fn resolve(
        workspace: &Path,
        source_dir: &str,
        profiles_dir: &str,
        profile: &str,
        debug: bool,
    ) -> Result<Self, LaunchError> {
        let workspace = workspace.canonicalize()?;
        let source_prefix = workspace.join(source_dir);
        let profile_root = source_prefix.join(profiles_dir);

        if profile.is_empty() || profile.contains(std::path::MAIN_SEPARATOR) {
            return Err(LaunchError::ProfileNotFound {
                name: profile.to_string(),
                dir: profile_root,
            });
        }

        let target_prefix = profile_root.join(profile);
        if !target_prefix.is_dir() {
            return Err(LaunchError::ProfileNotFound {
                name: profile.to_string(),
                dir: profile_root,
            });
        }

        Ok(Self {
            source_prefix,
            target_prefix,
            debug,
            workspace,
        })
    }
}

/// A context paired with the located shim artifact, ready to publish.
#[derive(Debug, Clone)]
pub struct PreparedRedirect {
    pub ctx: RedirectionContext,
    pub shim: PathBuf,
}

/// Locate the target executable. Bare names go through a PATH search,
/// anything with a separator is checked directly.
pub fn find_executable(program: &OsStr) -> Result<PathBuf, LaunchError> {
    let missing = || LaunchError::ExecutableNotFound(program.to_string_lossy().into_owned());

    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        if as_path.is_file() && is_executable(as_path) {
            return Ok(as_path.to_path_buf());
        }
        return Err(missing());
    }

    which::which(program).map_err(|_| missing())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

/// Locate the shim artifact, rebuilding from a development checkout when
/// nothing is installed. All pre-spawn: a launch with a profile either
/// gets a shim or fails here.
pub fn ensure_shim(paths: &Paths, config_override: Option<&str>) -> Result<PathBuf, LaunchError> {
    if let Some(found) = paths::locate_shim(paths, config_override) {
        return Ok(found);
    }
    debug!("shim artifact not found, attempting rebuild from checkout");
    if let Some(built) = build::rebuild_shim() {
        return Ok(built);
    }
    Err(LaunchError::InterceptionUnavailable {
        searched: paths::shim_search_paths(paths, config_override),
    })
}

/// Spawn `program` with `args` and block until it exits.
///
/// With a redirect, the mapping and the shim are published through the
/// child's environment only — the parent environment is never touched —
/// and the child runs from the workspace root. Stdio is inherited
/// unmodified, so interactive behavior is indistinguishable from a
/// direct invocation. Termination signals received while waiting are
/// forwarded to the child.
pub fn launch(
    program: &Path,
    args: &[OsString],
    redirect: Option<&PreparedRedirect>,
) -> Result<ExitOutcome, LaunchError> {
    let mut cmd = Command::new(program);
    cmd.args(args);

    if let Some(redirect) = redirect {
        let ctx = &redirect.ctx;
        debug!(
            source = %ctx.source_prefix.display(),
            target = %ctx.target_prefix.display(),
            shim = %redirect.shim.display(),
            "publishing redirection"
        );
        cmd.current_dir(&ctx.workspace);
        cmd.env(env::REDIRECT_SOURCE, &ctx.source_prefix);
        cmd.env(env::REDIRECT_TARGET, &ctx.target_prefix);
        if ctx.debug {
            cmd.env(env::DEBUG, "1");
        }
        cmd.env(
            env::PRELOAD,
            preload_value(&redirect.shim, std::env::var_os(env::PRELOAD)),
        );
    }

    let mut child = cmd.spawn()?;

    // Any parent-side failure past this point must not orphan the child.
    #[cfg(unix)]
    if let Err(e) = signal::forward_to(child.id() as i32) {
        let _ = child.kill();
        let _ = child.wait();
        return Err(e.into());
    }

    let status = child.wait();

    #[cfg(unix)]
    signal::clear();

    Ok(ExitOutcome::from(status?))
}

/// Compose the loader's preload list: our shim first, any preexisting
/// entries preserved after it.
fn preload_value(shim: &Path, existing: Option<OsString>) -> OsString {
    match existing {
        Some(prior) if !prior.is_empty() => {
            let mut value = shim.as_os_str().to_os_string();
            value.push(":");
            value.push(prior);
            value
        }
        _ => shim.as_os_str().to_os_string(),
    }
}

#[cfg(unix)]
mod signal {
    //! Forward termination signals to the child while we block in wait().
    //!
    //! The handler reads one atomic; nothing else may run in signal
    //! context. The pid is cleared after the child is reaped so a late
    //! signal cannot hit a reused pid.

    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
    use std::sync::atomic::{AtomicI32, Ordering};

    static CHILD: AtomicI32 = AtomicI32::new(0);

    extern "C" fn forward(sig: libc::c_int) {
        let pid = CHILD.load(Ordering::Relaxed);
        if pid > 0 {
            unsafe {
                libc::kill(pid, sig);
            }
        }
    }

    pub fn forward_to(pid: i32) -> std::io::Result<()> {
        CHILD.store(pid, Ordering::Relaxed);
        let action = SigAction::new(
            SigHandler::Handler(forward),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        for sig in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP, Signal::SIGQUIT] {
            unsafe {
                sigaction(sig, &action)
                    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
            }
        }
        Ok(())
    }

    pub fn clear() {
        CHILD.store(0, Ordering::Relaxed);
    }
}
