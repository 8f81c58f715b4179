//! Logical-name and path normalization.
//!
//! Logical names are rooted slash-separated paths (`/foo/bar.css`). Every
//! user-supplied name is canonicalized through [`clean_logical`] before it is
//! used as a cache key or joined under the asset root, which is what keeps
//! `..` traversal out of lookups.

use std::path::{Path, PathBuf};

/// Canonicalize a logical name: root it, collapse `.` and `..`, drop empty
/// segments. `..` never escapes the root.
pub fn clean_logical(input: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in input.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut out = String::with_capacity(input.len() + 1);
    out.push('/');
    out.push_str(&segments.join("/"));
    out
}

/// Extension of the final element of a slash path, including the dot
/// (`".js"`), or `""` when there is none.
pub fn ext_of(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.rfind('.') {
        Some(i) if i > 0 => &base[i..],
        _ => "",
    }
}

/// Extension of a filesystem path, including the dot, or `""`.
pub fn path_ext(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Relative path rendered with forward slashes regardless of platform.
pub fn slashed(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`), falling back
/// to joining with the current directory for paths that do not exist yet.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}
