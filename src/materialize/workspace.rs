//! Sandboxed access to the repository tree.
//!
//! Every path handed to a [`Workspace`] is joined onto the repository root,
//! normalized lexically, and rejected if the result leaves the root. The
//! deepest existing ancestor is then resolved with symlinks followed and must
//! also land under the resolved root. Model output never reaches the
//! filesystem port without passing through here.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use super::SOURCE_EXTENSION;
use crate::ports::filesystem::{FileSystem, FsError};

/// Errors raised by sandboxed filesystem access.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The path leaves the repository root, lexically or through a symlink.
    #[error("unsafe path traversal blocked: {0:?} escapes the repository root")]
    PathEscape(String),

    /// The filesystem port failed.
    #[error("failed to {action} {path}: {source}")]
    Io {
        /// What was being attempted (`read`, `write`, `list`, `resolve`).
        action: &'static str,
        /// Repository-relative path involved.
        path: String,
        /// Underlying port error.
        #[source]
        source: FsError,
    },
}

/// A repository root plus the filesystem port used to reach it.
pub struct Workspace<'a> {
    fs: &'a dyn FileSystem,
    root: PathBuf,
}

impl<'a> Workspace<'a> {
    /// Creates a workspace rooted at `root`, which should already be absolute.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, root: &Path) -> Self {
        Self { fs, root: normalize(root).unwrap_or_else(|| root.to_path_buf()) }
    }

    /// Resolves a repository-relative path to an absolute path inside the root.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::PathEscape`] if the path would leave the root.
    pub fn resolve(&self, rel_path: &str) -> Result<PathBuf, WorkspaceError> {
        let escape = || WorkspaceError::PathEscape(rel_path.to_string());
        let resolved = normalize(&self.root.join(rel_path)).ok_or_else(escape)?;
        if !resolved.starts_with(&self.root) {
            return Err(escape());
        }
        self.check_real(&resolved)?;
        Ok(resolved)
    }

    /// Renders an absolute path inside the root as a forward-slash relative path.
    #[must_use]
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
        parts.join("/")
    }

    /// Returns `true` if the relative path exists.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::PathEscape`] if the path would leave the root.
    pub fn exists(&self, rel_path: &str) -> Result<bool, WorkspaceError> {
        Ok(self.fs.exists(&self.resolve(rel_path)?))
    }

    /// Reads a relative path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path escapes the root or cannot be read.
    pub fn read(&self, rel_path: &str) -> Result<String, WorkspaceError> {
        self.read_path(&self.resolve(rel_path)?)
    }

    /// Reads an absolute path previously obtained from this workspace,
    /// replacing invalid UTF-8 sequences with `U+FFFD`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path lies outside the root or cannot be read.
    pub fn read_path_lossy(&self, path: &Path) -> Result<String, WorkspaceError> {
        self.check_inside(path)?;
        let bytes = self.fs.read_bytes(path).map_err(|source| WorkspaceError::Io {
            action: "read",
            path: self.relative(path),
            source,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Writes a relative path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the path escapes the root or cannot be written.
    pub fn write(&self, rel_path: &str, contents: &str) -> Result<(), WorkspaceError> {
        self.write_path(&self.resolve(rel_path)?, contents)
    }

    /// Reads an absolute path previously obtained from this workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the path lies outside the root or cannot be read.
    pub fn read_path(&self, path: &Path) -> Result<String, WorkspaceError> {
        self.check_inside(path)?;
        self.fs.read_to_string(path).map_err(|source| WorkspaceError::Io {
            action: "read",
            path: self.relative(path),
            source,
        })
    }

    /// Writes an absolute path previously obtained from this workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the path lies outside the root or cannot be written.
    pub fn write_path(&self, path: &Path, contents: &str) -> Result<(), WorkspaceError> {
        self.check_inside(path)?;
        self.fs.write(path, contents).map_err(|source| WorkspaceError::Io {
            action: "write",
            path: self.relative(path),
            source,
        })
    }

    /// Lists the Python source files a scan target covers.
    ///
    /// A target naming a `.py` file yields that file; a directory yields every
    /// `.py` file beneath it; a missing target yields nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the target escapes the root or cannot be traversed.
    pub fn source_files(&self, rel_path: &str) -> Result<Vec<PathBuf>, WorkspaceError> {
        let target = self.resolve(rel_path)?;
        if !self.fs.exists(&target) {
            return Ok(Vec::new());
        }
        if self.fs.is_file(&target) {
            return Ok(if is_source(&target) { vec![target] } else { Vec::new() });
        }
        let files = self.fs.list_files(&target).map_err(|source| WorkspaceError::Io {
            action: "list",
            path: self.relative(&target),
            source,
        })?;
        Ok(files.into_iter().filter(|p| is_source(p)).collect())
    }

    fn check_inside(&self, path: &Path) -> Result<(), WorkspaceError> {
        match normalize(path) {
            Some(p) if p.starts_with(&self.root) => self.check_real(&p),
            _ => Err(WorkspaceError::PathEscape(path.display().to_string())),
        }
    }

    /// Follows symlinks on the deepest existing ancestor of a lexically
    /// contained `path` and requires the result to stay under the real root.
    fn check_real(&self, path: &Path) -> Result<(), WorkspaceError> {
        let mut existing = path;
        while !self.fs.exists(existing) {
            if existing == self.root {
                return Ok(());
            }
            match existing.parent() {
                Some(parent) => existing = parent,
                None => return Ok(()),
            }
        }

        let resolve_error = |source| WorkspaceError::Io {
            action: "resolve",
            path: self.relative(existing),
            source,
        };
        let real_root = self.fs.canonicalize(&self.root).map_err(resolve_error)?;
        let real = self.fs.canonicalize(existing).map_err(resolve_error)?;
        if real.starts_with(&real_root) {
            Ok(())
        } else {
            Err(WorkspaceError::PathEscape(self.relative(path)))
        }
    }
}

/// Returns `true` if the path has the Python source extension.
pub(crate) fn is_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Lexically collapses `.` and `..` components. Returns `None` when `..`
/// would climb above the filesystem root.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}
