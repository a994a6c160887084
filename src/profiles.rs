//! Profile discovery.
//!
//! A profile is any directory under `<workspace>/<source_dir>/<profiles_dir>/`.
//! Discovery is content-agnostic — the redirection core never interprets
//! what a profile ships — with one cosmetic exception: an optional
//! `description.txt` shown by `profiles list`.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct ProfileInfo {
    pub name: String,
    pub path: PathBuf,
    pub description: Option<String>,
    /// Number of files the profile provides.
    pub file_count: usize,
}

/// Directory the profiles live in for this workspace.
pub fn profiles_root(workspace: &Path, config: &Config) -> PathBuf {
    workspace
        .join(&config.redirect.source_dir)
        .join(&config.redirect.profiles_dir)
}

/// All profiles in the workspace, sorted by name. A missing profile tree
/// is an empty list, not an error.
pub fn list_profiles(workspace: &Path, config: &Config) -> Result<Vec<ProfileInfo>> {
    let root = profiles_root(workspace, config);
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut profiles = Vec::new();
    for entry in fs::read_dir(&root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        profiles.push(load_info(name, entry.path()));
    }
    profiles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(profiles)
}

/// A single profile by name, or `None` if it does not exist.
pub fn profile_info(workspace: &Path, config: &Config, name: &str) -> Result<Option<ProfileInfo>> {
    let path = profiles_root(workspace, config).join(name);
    if !path.is_dir() {
        return Ok(None);
    }
    Ok(Some(load_info(name.to_string(), path)))
}

fn load_info(name: String, path: PathBuf) -> ProfileInfo {
    let description = fs::read_to_string(path.join("description.txt"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let file_count = count_files(&path);
    ProfileInfo {
        name,
        path,
        description,
        file_count,
    }
}

fn count_files(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(t) if t.is_dir() => count_files(&entry.path()),
            Ok(t) if t.is_file() => 1,
            _ => 0,
        })
        .sum()
}
