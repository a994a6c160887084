//! Dev-tree rebuild of the shim artifact.
//!
//! When nothing is installed anywhere but the running binary sits inside
//! a cargo `target/` tree of the dirswap checkout, one `cargo build` of
//! the shim crate produces the artifact right next to the binary. The
//! build itself is cargo's job; we only trigger it and re-probe.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::paths::{self, SHIM_LIB_NAME};

/// Try to build the shim from the checkout this binary was built in.
/// Returns the artifact path on success, `None` when there is no
/// checkout to build from or the build fails.
pub fn rebuild_shim() -> Option<PathBuf> {
    let exe_dir = paths::exe_dir()?;
    let workspace_root = find_checkout_root(&exe_dir)?;

    let release = exe_dir.file_name().is_some_and(|n| n == "release");
    let mut cmd = Command::new("cargo");
    cmd.arg("build").arg("-p").arg("dirswap-shim");
    if release {
        cmd.arg("--release");
    }
    cmd.current_dir(&workspace_root);

    debug!(root = %workspace_root.display(), "rebuilding shim artifact");
    match cmd.status() {
        Ok(status) if status.success() => {}
        Ok(status) => {
            warn!("shim rebuild failed with {status}");
            return None;
        }
        Err(e) => {
            warn!("could not run cargo: {e}");
            return None;
        }
    }

    let artifact = exe_dir.join(SHIM_LIB_NAME);
    artifact.is_file().then_some(artifact)
}

/// Walk up from the target directory looking for the workspace manifest
/// with the shim member next to it.
fn find_checkout_root(exe_dir: &Path) -> Option<PathBuf> {
    exe_dir
        .ancestors()
        .find(|dir| dir.join("Cargo.toml").is_file() && dir.join("shim/Cargo.toml").is_file())
        .map(Path::to_path_buf)
}
