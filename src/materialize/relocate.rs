//! Forcing every file path under the project directory.

/// Normalizes a model-supplied relative path: trims whitespace, converts
/// back-slashes to forward slashes, strips leading slashes, and drops `.`
/// segments.
#[must_use]
pub fn normalize_rel(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    path.trim_start_matches('/')
        .split('/')
        .filter(|segment| *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns `path` nested under `target_dir`, preserving its subdirectories.
///
/// A path already under `target_dir` is returned unchanged, so relocation is
/// idempotent. An empty or `.` target means the repository root.
///
/// ```
/// use codegen_agent::materialize::relocate::relocate_into_dir;
///
/// assert_eq!(relocate_into_dir("README.md", "updated/calculator"), "updated/calculator/README.md");
/// assert_eq!(relocate_into_dir("src/utils.py", "updated/calculator"), "updated/calculator/src/utils.py");
/// ```
#[must_use]
pub fn relocate_into_dir(path: &str, target_dir: &str) -> String {
    let rel = normalize_rel(path);
    let target = normalize_rel(target_dir);
    let target = target.trim_end_matches('/');
    if target.is_empty() || target == "." {
        return rel;
    }

    let prefix = format!("{target}/");
    if rel.starts_with(&prefix) {
        rel
    } else {
        prefix + &rel
    }
}

/// Parent directory of a normalized relative path, or `""` at the root.
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}
