use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn bin() -> Command {
    let path = assert_cmd::cargo::cargo_bin("dirswap");
    Command::new(path)
}

/// Every invocation gets its own config/data dirs so nothing on the host
/// leaks in — and the installed-shim candidate points into the tempdir.
fn isolated<'a>(cmd: &'a mut Command, dirs: &Path) -> &'a mut Command {
    cmd.env("DIRSWAP_CONFIG_DIR", dirs.join("config"))
        .env("DIRSWAP_DATA_DIR", dirs.join("data"))
        .env_remove("DIRSWAP_SHIM")
        .env_remove("DIRSWAP_DEBUG")
        .env_remove("DIRSWAP_WORKSPACE")
}

/// Workspace with a `designer` profile providing `rules.txt` and a
/// source-level `mcp.json` with no profile override.
fn make_workspace(root: &Path) -> PathBuf {
    let ws = root.join("ws");
    let profile = ws.join(".cursor/agents/designer");
    fs::create_dir_all(&profile).unwrap();
    fs::write(profile.join("rules.txt"), "REDIRECTED RULES").unwrap();
    fs::write(ws.join(".cursor/mcp.json"), "ORIGINAL MCP").unwrap();
    ws
}

/// The shim artifact lands next to the test binaries when the workspace
/// is built; redirection end-to-end tests need it.
fn built_shim() -> Option<PathBuf> {
    let exe = assert_cmd::cargo::cargo_bin("dirswap");
    let candidate = exe.parent()?.join(if cfg!(target_os = "macos") {
        "libdirswap_shim.dylib"
    } else {
        "libdirswap_shim.so"
    });
    candidate.is_file().then_some(candidate)
}

#[test]
fn run_forwards_exit_code() {
    let dir = tempdir().unwrap();
    isolated(&mut bin(), dir.path())
        .args(["run", "--", "sh", "-c", "exit 7"])
        .assert()
        .code(7);
}

#[test]
fn run_forwards_stdout() {
    let dir = tempdir().unwrap();
    isolated(&mut bin(), dir.path())
        .args(["run", "--", "echo", "hello"])
        .assert()
        .success()
        .stdout(contains("hello"));
}

#[cfg(unix)]
#[test]
fn run_reports_signal_death_as_128_plus_n() {
    let dir = tempdir().unwrap();
    isolated(&mut bin(), dir.path())
        .args(["run", "--", "sh", "-c", "kill -TERM $$"])
        .assert()
        .code(143);
}

#[test]
fn run_without_program_fails() {
    let dir = tempdir().unwrap();
    isolated(&mut bin(), dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(contains("no program"));
}

#[test]
fn run_with_missing_executable_fails() {
    let dir = tempdir().unwrap();
    isolated(&mut bin(), dir.path())
        .args(["run", "--", "definitely-not-a-real-binary-4271"])
        .assert()
        .failure()
        .stderr(contains("executable"));
}

#[test]
fn run_with_unknown_profile_fails_before_spawn() {
    let dir = tempdir().unwrap();
    let ws = make_workspace(dir.path());

    isolated(&mut bin(), dir.path())
        .arg("--workspace")
        .arg(&ws)
        .args(["run", "-p", "nope", "--", "echo", "should-not-run"])
        .assert()
        .failure()
        .stderr(contains("profile 'nope'"))
        .stdout(contains("should-not-run").not());
}

#[test]
fn profiles_list_empty_workspace() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("empty");
    fs::create_dir_all(&ws).unwrap();

    isolated(&mut bin(), dir.path())
        .arg("--workspace")
        .arg(&ws)
        .args(["profiles", "list"])
        .assert()
        .success()
        .stdout(contains("No profiles found"));
}

#[test]
fn profiles_list_shows_profiles_with_descriptions() {
    let dir = tempdir().unwrap();
    let ws = make_workspace(dir.path());
    fs::write(
        ws.join(".cursor/agents/designer/description.txt"),
        "UI/UX specialist\n",
    )
    .unwrap();

    isolated(&mut bin(), dir.path())
        .arg("--workspace")
        .arg(&ws)
        .args(["profiles", "list"])
        .assert()
        .success()
        .stdout(contains("designer"))
        .stdout(contains("UI/UX specialist"));
}

#[test]
fn profiles_show_unknown_fails() {
    let dir = tempdir().unwrap();
    let ws = make_workspace(dir.path());

    isolated(&mut bin(), dir.path())
        .arg("--workspace")
        .arg(&ws)
        .args(["profiles", "show", "nope"])
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn config_init_creates_and_preserves_existing() {
    let dir = tempdir().unwrap();

    isolated(&mut bin(), dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(contains("Wrote"));

    let config_path = dir.path().join("config/config.toml");
    assert!(config_path.exists());
    fs::write(&config_path, "[redirect]\nsource_dir = \".sentinel\"\n").unwrap();

    isolated(&mut bin(), dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(contains("already exists"));

    let kept = fs::read_to_string(&config_path).unwrap();
    assert!(kept.contains(".sentinel"));
}

#[test]
fn config_show_prints_effective_settings() {
    let dir = tempdir().unwrap();
    isolated(&mut bin(), dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("source_dir"))
        .stdout(contains(".cursor"));
}

#[test]
fn shim_status_lists_search_order() {
    let dir = tempdir().unwrap();
    isolated(&mut bin(), dir.path())
        .args(["shim", "status"])
        .assert()
        .success()
        .stdout(contains("Shim search order"));
}

// ── end-to-end through a real child, when the shim artifact is built ──

#[cfg(unix)]
#[test]
fn redirected_read_resolves_to_profile_file() {
    let Some(_shim) = built_shim() else {
        eprintln!("skipping: shim artifact not built");
        return;
    };
    let dir = tempdir().unwrap();
    let ws = make_workspace(dir.path());

    // `.cursor/rules.txt` does not exist at the source location; the
    // profile provides it. The child must read the profile's copy.
    isolated(&mut bin(), dir.path())
        .arg("--workspace")
        .arg(&ws)
        .args(["run", "-p", "designer", "--", "cat", ".cursor/rules.txt"])
        .assert()
        .success()
        .stdout(contains("REDIRECTED RULES"));
}

#[cfg(unix)]
#[test]
fn unoverridden_read_falls_back_to_original() {
    let Some(_shim) = built_shim() else {
        eprintln!("skipping: shim artifact not built");
        return;
    };
    let dir = tempdir().unwrap();
    let ws = make_workspace(dir.path());

    // `.cursor/mcp.json` has no profile override: the original file must
    // come back unchanged.
    isolated(&mut bin(), dir.path())
        .arg("--workspace")
        .arg(&ws)
        .args(["run", "-p", "designer", "--", "cat", ".cursor/mcp.json"])
        .assert()
        .success()
        .stdout(contains("ORIGINAL MCP"));
}

#[cfg(unix)]
#[test]
fn absolute_paths_are_redirected_too() {
    let Some(_shim) = built_shim() else {
        eprintln!("skipping: shim artifact not built");
        return;
    };
    let dir = tempdir().unwrap();
    let ws = make_workspace(dir.path());
    let absolute = ws.canonicalize().unwrap().join(".cursor/rules.txt");

    let mut cmd = bin();
    isolated(&mut cmd, dir.path())
        .arg("--workspace")
        .arg(&ws)
        .args(["run", "-p", "designer", "--", "cat"])
        .arg(&absolute)
        .assert()
        .success()
        .stdout(contains("REDIRECTED RULES"));
}

#[cfg(unix)]
#[test]
fn debug_flag_emits_diagnostics() {
    let Some(_shim) = built_shim() else {
        eprintln!("skipping: shim artifact not built");
        return;
    };
    let dir = tempdir().unwrap();
    let ws = make_workspace(dir.path());

    isolated(&mut bin(), dir.path())
        .arg("--workspace")
        .arg(&ws)
        .args(["run", "--debug", "-p", "designer", "--", "cat", ".cursor/rules.txt"])
        .assert()
        .success()
        .stderr(contains("dirswap["))
        .stderr(contains("redirected"));
}

#[cfg(unix)]
#[test]
fn no_profile_means_no_redirection() {
    let dir = tempdir().unwrap();
    let ws = make_workspace(dir.path());

    // Without a profile the child sees the source tree as-is, shim or no
    // shim: rules.txt only exists in the profile, so the read fails.
    let mut cmd = bin();
    isolated(&mut cmd, dir.path())
        .arg("--workspace")
        .arg(&ws)
        .args(["run", "--", "cat"])
        .arg(ws.join(".cursor/rules.txt"))
        .assert()
        .failure();
}
