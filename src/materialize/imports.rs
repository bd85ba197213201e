//! Rewriting project-qualified imports into same-directory imports.
//!
//! Generated code often imports its siblings through the full package path
//! (`from updated.calculator.ui import render`), which only resolves when the
//! repository root is on `sys.path`. Running the entry script from its own
//! directory needs the unqualified form. With `P` the dotted project
//! directory, exactly four line-anchored shapes are rewritten:
//!
//! | before                        | after                 |
//! |-------------------------------|-----------------------|
//! | `from P.mod import names`     | `from mod import names` |
//! | `import P.mod as alias`       | `import mod as alias` |
//! | `import P.mod`                | `import mod`          |
//! | `from P import mod`           | `import mod`          |
//!
//! Everything else is left alone: deeper nesting (`P.pkg.mod`), wildcard or
//! multi-name `from P import`, indented imports, and imports inside strings.

use regex::Regex;
use tracing::{debug, warn};

use super::relocate::normalize_rel;
use super::workspace::{Workspace, WorkspaceError};
use super::{RewriteReport, SkippedFile};

/// The four substitutions for one project prefix, applied in order.
pub struct ImportRewriter {
    prefix: String,
    rules: Vec<(Regex, &'static str)>,
}

impl ImportRewriter {
    /// Builds the rewriter for a dotted prefix such as `updated.calculator`.
    ///
    /// # Errors
    ///
    /// Returns a regex error if a pattern fails to compile.
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let p = regex::escape(prefix);
        let ident = r"([A-Za-z_]\w*)";
        let rules = vec![
            (
                Regex::new(&format!(r"(?mR)^from[ \t]+{p}\.{ident}[ \t]+import[ \t]+"))?,
                "from ${1} import ",
            ),
            (
                Regex::new(&format!(r"(?mR)^import[ \t]+{p}\.{ident}[ \t]+as[ \t]+"))?,
                "import ${1} as ",
            ),
            (Regex::new(&format!(r"(?mR)^import[ \t]+{p}\.{ident}[ \t]*$"))?, "import ${1}"),
            (
                Regex::new(&format!(r"(?mR)^from[ \t]+{p}[ \t]+import[ \t]+{ident}[ \t]*$"))?,
                "import ${1}",
            ),
        ];
        Ok(Self { prefix: prefix.to_string(), rules })
    }

    /// Builds the rewriter for a project directory, or `None` when the
    /// directory is the repository root and there is no prefix to strip.
    ///
    /// # Errors
    ///
    /// Returns a regex error if a pattern fails to compile.
    pub fn for_project_dir(module_dir: &str) -> Result<Option<Self>, regex::Error> {
        let dir = normalize_rel(module_dir);
        let dir = dir.trim_matches('/');
        if dir.is_empty() || dir == "." {
            return Ok(None);
        }
        Self::new(&dir.replace('/', ".")).map(Some)
    }

    /// The dotted qualification prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Applies every rule to `source` and returns the rewritten text.
    #[must_use]
    pub fn rewrite(&self, source: &str) -> String {
        self.rules
            .iter()
            .fold(source.to_string(), |text, (re, rep)| re.replace_all(&text, *rep).into_owned())
    }
}

/// Rewrites qualified imports in every source file under `module_dir`.
///
/// Files that cannot be read or written are recorded in the report and
/// skipped; the remaining files are still processed. Files whose text does
/// not change are not rewritten.
///
/// # Errors
///
/// Returns an error if `module_dir` escapes the repository root or a rewrite
/// pattern fails to compile.
pub fn enforce_same_folder_imports(
    workspace: &Workspace<'_>,
    module_dir: &str,
) -> Result<RewriteReport, super::MaterializeError> {
    let Some(rewriter) = ImportRewriter::for_project_dir(module_dir)? else {
        return Ok(RewriteReport::default());
    };
    let dir = normalize_rel(module_dir);
    let dir = dir.trim_matches('/');

    let mut report = RewriteReport::default();
    let files = match workspace.source_files(dir) {
        Ok(files) => files,
        Err(WorkspaceError::Io { path, source, .. }) => {
            warn!(path = %path, error = %source, "cannot list project directory; skipping import rewrite");
            report.skipped.push(SkippedFile { path, reason: source.to_string() });
            return Ok(report);
        }
        Err(e) => return Err(e.into()),
    };

    for file in files {
        let rel = workspace.relative(&file);
        let text = match workspace.read_path(&file) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %rel, error = %e, "skipping unreadable source file");
                report.skipped.push(SkippedFile { path: rel, reason: e.to_string() });
                continue;
            }
        };

        let rewritten = rewriter.rewrite(&text);
        if rewritten == text {
            continue;
        }

        match workspace.write_path(&file, &rewritten) {
            Ok(()) => {
                debug!(path = %rel, prefix = rewriter.prefix(), "rewrote qualified imports");
                report.rewritten.push(rel);
            }
            Err(e) => {
                warn!(path = %rel, error = %e, "could not write rewritten imports");
                report.skipped.push(SkippedFile { path: rel, reason: e.to_string() });
            }
        }
    }
    Ok(report)
}
