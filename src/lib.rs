//! dirswap — run an unmodified CLI program against a named configuration
//! profile.
//!
//! This crate provides:
//! - Launch orchestration: resolve a profile into a redirection mapping,
//!   publish it through the child's environment, attach the preload shim,
//!   and relay the child's exit status and signals
//! - Profile discovery under the workspace's config directory
//! - Shim artifact location, install, and dev-tree rebuild
//!
//! The interception itself lives in the `dirswap-shim` member crate.

pub mod cli;
pub mod config;
pub mod launch;
pub mod paths;
pub mod profiles;

pub use config::Config;
