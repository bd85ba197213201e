//! Synthesizing `__init__.py` markers along a file's package chain.

use tracing::debug;

use super::workspace::{Workspace, WorkspaceError};
use super::{PACKAGE_MARKER, SOURCE_EXTENSION};
use crate::materialize::relocate::normalize_rel;

/// The package root for an entry module: its first path segment, or `None`
/// for a root-level script.
#[must_use]
pub fn package_root(entry_path: &str) -> Option<String> {
    let entry = normalize_rel(entry_path);
    let mut segments = entry.split('/').filter(|s| !s.is_empty() && *s != ".");
    let first = segments.next()?;
    segments.next().map(|_| first.to_string())
}

/// Ensures a marker exists in every directory from `package_root` down to the
/// parent of `rel_py_path`. Existing markers are never overwritten.
///
/// Files outside `package_root` and non-Python files are ignored. Returns the
/// markers that were created.
///
/// # Errors
///
/// Returns an error if a marker path escapes the root or cannot be written.
pub fn ensure_package_chain(
    workspace: &Workspace<'_>,
    rel_py_path: &str,
    package_root: Option<&str>,
) -> Result<Vec<String>, WorkspaceError> {
    let path = normalize_rel(rel_py_path);
    let Some(root) = package_root.filter(|r| !r.is_empty() && *r != ".") else {
        return Ok(Vec::new());
    };
    if !path.ends_with(&format!(".{SOURCE_EXTENSION}")) {
        return Ok(Vec::new());
    }

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if parts.first() != Some(&root) {
        return Ok(Vec::new());
    }

    let mut created = Vec::new();
    for depth in 1..parts.len() {
        let marker = format!("{}/{PACKAGE_MARKER}", parts[..depth].join("/"));
        if !workspace.exists(&marker)? {
            workspace.write(&marker, "")?;
            debug!(marker = %marker, "created package marker");
            created.push(marker);
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::LiveFileSystem;

    #[test]
    fn package_root_is_first_segment_of_nested_entry() {
        assert_eq!(package_root("updated/calculator/app.py").as_deref(), Some("updated"));
        assert_eq!(package_root("proj/app.py").as_deref(), Some("proj"));
        assert_eq!(package_root("./proj/app.py").as_deref(), Some("proj"));
        assert_eq!(package_root("app.py"), None);
        assert_eq!(package_root(""), None);
    }

    #[test]
    fn creates_markers_from_root_to_parent_only() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(&LiveFileSystem, dir.path());
        ws.write("proj/sub/mod.py", "x = 1\n").unwrap();

        let created = ensure_package_chain(&ws, "proj/sub/mod.py", Some("proj")).unwrap();

        assert_eq!(created, vec!["proj/__init__.py", "proj/sub/__init__.py"]);
        assert!(!dir.path().join("proj/sub/deeper").exists());
        assert!(!dir.path().join("__init__.py").exists());
    }

    #[test]
    fn never_overwrites_existing_markers_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(&LiveFileSystem, dir.path());
        ws.write("proj/__init__.py", "VERSION = 1\n").unwrap();

        let first = ensure_package_chain(&ws, "proj/sub/mod.py", Some("proj")).unwrap();
        let second = ensure_package_chain(&ws, "proj/sub/mod.py", Some("proj")).unwrap();

        assert_eq!(first, vec!["proj/sub/__init__.py"]);
        assert!(second.is_empty());
        assert_eq!(ws.read("proj/__init__.py").unwrap(), "VERSION = 1\n");
    }

    #[test]
    fn ignores_files_outside_root_and_non_sources() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(&LiveFileSystem, dir.path());

        assert!(ensure_package_chain(&ws, "other/mod.py", Some("proj")).unwrap().is_empty());
        assert!(ensure_package_chain(&ws, "proj/README.md", Some("proj")).unwrap().is_empty());
        assert!(ensure_package_chain(&ws, "proj/mod.py", None).unwrap().is_empty());
        assert!(!dir.path().join("proj").exists());
        assert!(!dir.path().join("other").exists());
    }
}
