//! Pure rewrite decision for one intercepted path.
//!
//! The decision is a function of the path, the redirection rule, and an
//! injected existence oracle — the hooks pass the real (non-intercepted)
//! `access(2)`, tests pass a closure over an in-memory set. Keeping the
//! filesystem probe behind the oracle keeps the branching logic testable
//! without touching disk.

use crate::context::RedirectRule;

/// Outcome of rewriting one path. Produced per intercepted call and
/// consumed immediately for delegation and diagnostics; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDecision {
    pub original: Vec<u8>,
    /// The substituted path, present only when the rule matched.
    pub candidate: Option<Vec<u8>>,
    pub chosen: Vec<u8>,
    pub redirected: bool,
}

impl PathDecision {
    fn pass_through(path: &[u8]) -> Self {
        Self {
            original: path.to_vec(),
            candidate: None,
            chosen: path.to_vec(),
            redirected: false,
        }
    }
}

/// Decide where an intercepted path should resolve.
///
/// Matching is restricted to path-component boundaries: the source prefix
/// only counts when it starts at the beginning of the path or right after
/// a `/`, and ends at the end of the path or right before a `/`. A path
/// like `/tmp/.cursor-backup/rules` therefore never matches a `.cursor`
/// source prefix.
///
/// The candidate is only chosen when the oracle confirms it exists, so a
/// profile may override a subset of files and everything else falls
/// through to the original location. No result is cached; removing a
/// profile file restores the original on the next call.
pub fn rewrite_with<F>(path: &[u8], rule: &RedirectRule, exists: F) -> PathDecision
where
    F: FnOnce(&[u8]) -> bool,
{
    if path.is_empty() {
        return PathDecision::pass_through(path);
    }

    // A path already under the target prefix must not be rewritten again,
    // or relative re-traversal of a redirected result would recurse.
    if find_component_aligned(path, &rule.target).is_some() {
        return PathDecision::pass_through(path);
    }

    let Some(at) = find_component_aligned(path, &rule.source) else {
        return PathDecision::pass_through(path);
    };

    let mut candidate = Vec::with_capacity(path.len() - rule.source.len() + rule.target.len());
    candidate.extend_from_slice(&path[..at]);
    candidate.extend_from_slice(&rule.target);
    candidate.extend_from_slice(&path[at + rule.source.len()..]);

    if exists(&candidate) {
        PathDecision {
            original: path.to_vec(),
            chosen: candidate.clone(),
            candidate: Some(candidate),
            redirected: true,
        }
    } else {
        PathDecision {
            original: path.to_vec(),
            candidate: Some(candidate),
            chosen: path.to_vec(),
            redirected: false,
        }
    }
}

/// First occurrence of `needle` in `haystack` aligned to `/` boundaries
/// on both sides.
fn find_component_aligned(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    for at in 0..=haystack.len() - needle.len() {
        if &haystack[at..at + needle.len()] != needle {
            continue;
        }
        let starts_component = at == 0 || haystack[at - 1] == b'/';
        let end = at + needle.len();
        let ends_component = end == haystack.len() || haystack[end] == b'/';
        if starts_component && ends_component {
            return Some(at);
        }
    }
    None
}
