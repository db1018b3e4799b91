use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, warn};

/// Expands file names and glob patterns into a list of existing files.
///
/// Patterns that fail to parse or match nothing are logged and skipped.
/// Files matched by several patterns are listed once, in first-seen order.
#[must_use]
pub fn expand_patterns<S: AsRef<str>>(patterns: &[S]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(err) => {
                warn!("Failed to find file(s) at '{pattern}': {err}.");
                continue;
            }
        };

        let before = files.len();
        for path in paths {
            match path {
                Ok(path) if path.is_file() => {
                    if seen.insert(path.clone()) {
                        files.push(path);
                    }
                }
                Ok(_) => {}
                Err(err) => warn!("Skipping unreadable path: {err}."),
            }
        }

        if files.len() == before {
            warn!("Failed to find file(s) at '{pattern}'.");
        } else {
            debug!("Found {} file(s) at '{pattern}'.", files.len() - before);
        }
    }

    files
}
