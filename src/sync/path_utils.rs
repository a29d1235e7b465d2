// src/sync/path_utils.rs

//! Turning local paths into remote keys.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Only a lexical `strip_prefix` is attempted: both sides come from the same
/// canonicalized root, and a deleted path can no longer be canonicalized.
///
/// Returns `None` if the path is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Remote URL for `rel`: the endpoint followed verbatim by the relative key.
pub fn remote_url(endpoint: &str, rel: &str) -> String {
    format!("{endpoint}{rel}")
}
