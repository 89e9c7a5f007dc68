//! Resolves requests against the virtual host table.
//!
//! Routing only inspects the filesystem (`canonicalize` and `metadata`); it
//! never opens the target file.

use std::path::{Path, PathBuf};

use crate::config::VirtualHosts;
use crate::http::request::Request;

/// File served for targets that name a directory with a trailing slash.
pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A regular file inside the host's document root.
    File(PathBuf),
    NotFound,
    /// Unknown host, or a target that escapes the document root.
    BadRequest,
}

/// Strips the query and fragment and appends `index.html` to targets
/// ending in `/`.
pub fn normalize_target(target: &str) -> String {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    let path = &target[..end];

    if path.ends_with('/') {
        format!("{}{}", path, INDEX_FILE)
    } else {
        path.to_string()
    }
}

/// Joins `target` onto `root` one component at a time.
///
/// Returns `None` if a `..` would climb above `root` or a component holds
/// a backslash or NUL byte.
pub fn join_within(root: &Path, target: &str) -> Option<PathBuf> {
    let mut joined = root.to_path_buf();
    let mut depth = 0usize;

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if depth == 0 {
                    return None;
                }
                joined.pop();
                depth -= 1;
            }
            s if s.contains(['\\', '\0']) => return None,
            s => {
                joined.push(s);
                depth += 1;
            }
        }
    }

    Some(joined)
}

/// Decides the outcome for a well-formed request.
pub async fn route(hosts: &VirtualHosts, req: &Request) -> Route {
    let Some(root) = hosts.doc_root(&req.host) else {
        tracing::debug!(host = %req.host, "Unknown virtual host");
        return Route::BadRequest;
    };

    let target = normalize_target(&req.path);

    let Some(candidate) = join_within(root, &target) else {
        tracing::warn!(host = %req.host, path = %req.path, "Path escapes document root");
        return Route::BadRequest;
    };

    let resolved = match tokio::fs::canonicalize(&candidate).await {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(path = %candidate.display(), error = %e, "Target not found");
            return Route::NotFound;
        }
    };

    // Symlinks may still point outside the root
    if !resolved.starts_with(root) {
        tracing::warn!(
            host = %req.host,
            path = %req.path,
            resolved = %resolved.display(),
            "Resolved path escapes document root"
        );
        return Route::BadRequest;
    }

    match tokio::fs::metadata(&resolved).await {
        Ok(meta) if meta.is_file() => Route::File(resolved),
        _ => Route::NotFound,
    }
}
