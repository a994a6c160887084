//! dirswap-shim — loader-injected path redirection for an unmodified child process.
//!
//! Built as a cdylib and attached to a freshly spawned process via
//! `LD_PRELOAD` (Linux) or `DYLD_INSERT_LIBRARIES` + `__interpose` (macOS).
//! The hooks shadow the libc filesystem-entry operations a program uses to
//! open, stat, check access to, resolve symlinks for, and canonicalize
//! paths. Each hook consults the pure rewriter in [`rewrite`] with the
//! redirection rule published through the environment (see [`context`]),
//! then delegates to the real libc entry point.
//!
//! With no rule published, every hook is a pure pass-through. The library
//! never fails the wrapped program on its own account.

pub mod context;
pub mod rewrite;

#[cfg(unix)]
mod real;

#[cfg(unix)]
mod hooks;

pub use context::{RedirectRule, env};
pub use rewrite::{PathDecision, rewrite_with};
