//! Turning a model's draft into a runnable project tree on disk.
//!
//! Stages run in order, each over the tree the previous one left behind:
//!
//! 1. [`fileset`] parses the draft into a validated path → content map.
//! 2. [`relocate`] nests every path under the entry module's directory.
//! 3. [`packages`] adds `__init__.py` markers along each package chain.
//! 4. [`imports`] rewrites project-qualified imports to same-directory form.
//! 5. [`requirements`] infers the external dependency manifest.
//!
//! All disk access goes through the sandboxed [`workspace::Workspace`].

pub mod fileset;
pub mod imports;
pub mod packages;
pub mod relocate;
pub mod requirements;
pub mod stdlib;
pub mod workspace;

use thiserror::Error;

use self::relocate::{normalize_rel, parent_dir};
use self::workspace::WorkspaceError;

/// Extension of materialized source files.
pub const SOURCE_EXTENSION: &str = "py";
/// File whose presence makes a directory an importable package.
pub const PACKAGE_MARKER: &str = "__init__.py";
/// File name of the dependency manifest.
pub const MANIFEST_FILE: &str = "requirements.txt";
/// Minimum number of source files for a draft to count as a multi-file project.
pub const MIN_SOURCE_FILES: usize = 2;

/// Fatal reasons a materialization run stops.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The planning completion was blank.
    #[error("Model returned empty plan.")]
    EmptyPlan,

    /// The code generation completion was blank.
    #[error("Model returned empty module draft.")]
    EmptyDraft,

    /// The files map held fewer source files than a project needs.
    #[error(
        "Expected a multi-file project with >={min} Python files. Got {count}: {files:?}",
        min = MIN_SOURCE_FILES
    )]
    TooFewSourceFiles {
        /// How many source files the draft held.
        count: usize,
        /// Their draft paths.
        files: Vec<String>,
    },

    /// No draft entry relocated onto the entry module path.
    #[error("Model did not include entrypoint file: {0}")]
    MissingEntrypoint(String),

    /// A draft key would leave the project directory.
    #[error("unsafe file path in model output: {0:?}")]
    UnsafePath(String),

    /// Sandboxed filesystem access failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// An import rewrite pattern did not compile.
    #[error("invalid import rewrite pattern: {0}")]
    ImportPattern(#[from] regex::Error),

    /// The model call failed.
    #[error("LLM request failed: {0}")]
    Llm(String),

    /// A prompt template could not be selected or rendered.
    #[error(transparent)]
    Prompt(#[from] crate::prompts::PromptError),
}

/// A file a best-effort stage could not process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Repository-relative path.
    pub path: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of the import rewrite stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Files whose imports were rewritten.
    pub rewritten: Vec<String>,
    /// Files that could not be read or written.
    pub skipped: Vec<SkippedFile>,
}

/// Paths derived once from the caller's entry module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Normalized entry module path, e.g. `updated/calculator/app.py`.
    pub entry: String,
    /// Directory every file is relocated under; empty for the repository root.
    pub project_root: String,
    /// First segment of the entry path; `None` for a root-level script.
    pub package_root: Option<String>,
    /// Where the dependency manifest lives.
    pub manifest_path: String,
}

impl ProjectLayout {
    /// Derives the layout for an entry module path.
    #[must_use]
    pub fn for_entry(entry_path: &str) -> Self {
        let entry = normalize_rel(entry_path);
        let project_root = parent_dir(&entry).to_string();
        let manifest_path = if project_root.is_empty() {
            MANIFEST_FILE.to_string()
        } else {
            format!("{project_root}/{MANIFEST_FILE}")
        };
        let package_root = packages::package_root(&entry);
        Self { entry, project_root, package_root, manifest_path }
    }

    /// Directories the dependency scan covers.
    #[must_use]
    pub fn scan_target(&self) -> &str {
        if self.project_root.is_empty() {
            "."
        } else {
            &self.project_root
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_entry_layout() {
        let layout = ProjectLayout::for_entry("updated/calculator/app.py");
        assert_eq!(layout.entry, "updated/calculator/app.py");
        assert_eq!(layout.project_root, "updated/calculator");
        assert_eq!(layout.package_root.as_deref(), Some("updated"));
        assert_eq!(layout.manifest_path, "updated/calculator/requirements.txt");
        assert_eq!(layout.scan_target(), "updated/calculator");
    }

    #[test]
    fn root_level_entry_layout() {
        let layout = ProjectLayout::for_entry("/app.py");
        assert_eq!(layout.entry, "app.py");
        assert_eq!(layout.project_root, "");
        assert_eq!(layout.package_root, None);
        assert_eq!(layout.manifest_path, "requirements.txt");
        assert_eq!(layout.scan_target(), ".");
    }

    #[test]
    fn leading_current_dir_is_dropped() {
        let layout = ProjectLayout::for_entry("./proj/app.py");
        assert_eq!(layout.entry, "proj/app.py");
        assert_eq!(layout.project_root, "proj");
    }

    #[test]
    fn too_few_files_message_cites_count_and_list() {
        let err = MaterializeError::TooFewSourceFiles { count: 1, files: vec!["app.py".into()] };
        assert_eq!(
            err.to_string(),
            "Expected a multi-file project with >=2 Python files. Got 1: [\"app.py\"]"
        );
    }
}
