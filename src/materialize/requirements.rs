//! Inferring `requirements.txt` from the imports of a source tree.
//!
//! Every Python file under the scan targets is parsed into a syntax tree and
//! the top-level package of each absolute import is collected. Standard
//! library modules, modules that exist locally, and a few meta names are
//! removed; well-known import names are mapped to their distribution names.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rustpython_parser::{ast, Parse};
use tracing::{debug, warn};

use super::stdlib::is_stdlib;
use super::workspace::{Workspace, WorkspaceError};
use super::{SkippedFile, PACKAGE_MARKER};

/// Import names whose installable distribution is named differently.
pub const DISTRIBUTION_RENAMES: &[(&str, &str)] = &[
    ("PIL", "Pillow"),
    ("bs4", "beautifulsoup4"),
    ("cv2", "opencv-python"),
    ("sklearn", "scikit-learn"),
    ("yaml", "PyYAML"),
];

/// Names that are never dependencies even though they look like imports.
pub const META_MODULES: &[&str] = &["__future__", "__init__", "typing"];

/// Outcome of one dependency inference run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
    /// Relative path the manifest was written to.
    pub manifest_path: String,
    /// Manifest content: sorted distribution names, one per line.
    pub content: String,
    /// Files that could not be read or parsed.
    pub skipped: Vec<SkippedFile>,
}

impl DependencyReport {
    /// The distribution names in the manifest.
    #[must_use]
    pub fn requirements(&self) -> Vec<&str> {
        self.content.lines().collect()
    }
}

/// Collects the first dotted segment of every absolute import in `source`.
///
/// # Errors
///
/// Returns the parser's message if `source` is not valid Python.
pub fn collect_imports(source: &str, source_path: &str) -> Result<BTreeSet<String>, String> {
    let suite = ast::Suite::parse(source, source_path).map_err(|e| e.to_string())?;
    let mut names = BTreeSet::new();
    visit_block(&suite, &mut names);
    Ok(names)
}

fn visit_block(stmts: &[ast::Stmt], names: &mut BTreeSet<String>) {
    for stmt in stmts {
        visit_stmt(stmt, names);
    }
}

fn visit_stmt(stmt: &ast::Stmt, names: &mut BTreeSet<String>) {
    match stmt {
        ast::Stmt::Import(import) => {
            for alias in &import.names {
                push_top_level(alias.name.as_str(), names);
            }
        }
        ast::Stmt::ImportFrom(import) => {
            // Relative imports (`from .utils import x`) are always local.
            if import.level.as_ref().is_some_and(|level| level.to_u32() > 0) {
                return;
            }
            if let Some(module) = &import.module {
                push_top_level(module.as_str(), names);
            }
        }
        ast::Stmt::FunctionDef(def) => visit_block(&def.body, names),
        ast::Stmt::AsyncFunctionDef(def) => visit_block(&def.body, names),
        ast::Stmt::ClassDef(def) => visit_block(&def.body, names),
        ast::Stmt::For(s) => {
            visit_block(&s.body, names);
            visit_block(&s.orelse, names);
        }
        ast::Stmt::AsyncFor(s) => {
            visit_block(&s.body, names);
            visit_block(&s.orelse, names);
        }
        ast::Stmt::While(s) => {
            visit_block(&s.body, names);
            visit_block(&s.orelse, names);
        }
        ast::Stmt::If(s) => {
            visit_block(&s.body, names);
            visit_block(&s.orelse, names);
        }
        ast::Stmt::With(s) => visit_block(&s.body, names),
        ast::Stmt::AsyncWith(s) => visit_block(&s.body, names),
        ast::Stmt::Match(s) => {
            for case in &s.cases {
                visit_block(&case.body, names);
            }
        }
        ast::Stmt::Try(s) => {
            visit_block(&s.body, names);
            visit_handlers(&s.handlers, names);
            visit_block(&s.orelse, names);
            visit_block(&s.finalbody, names);
        }
        ast::Stmt::TryStar(s) => {
            visit_block(&s.body, names);
            visit_handlers(&s.handlers, names);
            visit_block(&s.orelse, names);
            visit_block(&s.finalbody, names);
        }
        _ => {}
    }
}

fn visit_handlers(handlers: &[ast::ExceptHandler], names: &mut BTreeSet<String>) {
    for handler in handlers {
        let ast::ExceptHandler::ExceptHandler(handler) = handler;
        visit_block(&handler.body, names);
    }
}

fn push_top_level(dotted: &str, names: &mut BTreeSet<String>) {
    let top = dotted.split('.').next().unwrap_or_default().trim();
    if !top.is_empty() {
        names.insert(top.to_string());
    }
}

/// Module and package names importable from inside the scan targets:
/// the stem of every `.py` file, and the name of every directory holding a
/// package marker.
///
/// # Errors
///
/// Returns an error if a scan target escapes the repository root or cannot
/// be listed.
pub fn collect_local_modules(
    workspace: &Workspace<'_>,
    scan_targets: &[&str],
) -> Result<BTreeSet<String>, WorkspaceError> {
    Ok(local_module_names(&list_scan_targets(workspace, scan_targets)?))
}

fn list_scan_targets(
    workspace: &Workspace<'_>,
    scan_targets: &[&str],
) -> Result<Vec<PathBuf>, WorkspaceError> {
    let mut files = Vec::new();
    for target in scan_targets {
        files.extend(workspace.source_files(target)?);
    }
    Ok(files)
}

fn local_module_names(files: &[PathBuf]) -> BTreeSet<String> {
    let mut local = BTreeSet::new();
    for file in files {
        if let Some(stem) = file.file_stem() {
            local.insert(stem.to_string_lossy().into_owned());
        }
        if file.file_name().is_some_and(|n| n == PACKAGE_MARKER) {
            if let Some(dir) = file.parent().and_then(Path::file_name) {
                local.insert(dir.to_string_lossy().into_owned());
            }
        }
    }
    local
}

/// Removes excluded names, applies distribution renames, and renders the
/// sorted manifest. An empty set renders as the empty string.
#[must_use]
pub fn render_manifest(imports: &BTreeSet<String>, local: &BTreeSet<String>) -> String {
    let requirements: BTreeSet<&str> = imports
        .iter()
        .map(String::as_str)
        .filter(|m| !is_stdlib(m) && !local.contains(*m) && !META_MODULES.contains(m))
        .map(distribution_name)
        .collect();

    if requirements.is_empty() {
        return String::new();
    }
    let mut content = requirements.into_iter().collect::<Vec<_>>().join("\n");
    content.push('\n');
    content
}

/// Maps an import name to the name it is installed under.
#[must_use]
pub fn distribution_name(import: &str) -> &str {
    DISTRIBUTION_RENAMES
        .iter()
        .find(|(name, _)| *name == import)
        .map_or(import, |(_, dist)| *dist)
}

/// Scans `scan_targets`, writes the inferred manifest to `out_rel_path`, and
/// returns it. Files are read lossily, so invalid UTF-8 does not hide their
/// imports; unreadable or unparsable files are skipped and reported.
///
/// # Errors
///
/// Returns an error if any path escapes the repository root, a scan target
/// cannot be listed, or the manifest cannot be written. Nothing is written
/// when a scan target cannot be listed.
pub fn generate_requirements(
    workspace: &Workspace<'_>,
    out_rel_path: &str,
    scan_targets: &[&str],
) -> Result<DependencyReport, WorkspaceError> {
    let files = list_scan_targets(workspace, scan_targets)?;
    let mut skipped = Vec::new();
    let mut imports = BTreeSet::new();

    for file in &files {
        let rel = workspace.relative(file);
        let parsed = workspace
            .read_path_lossy(file)
            .map_err(|e| e.to_string())
            .and_then(|text| collect_imports(&text, &rel));
        match parsed {
            Ok(found) => imports.extend(found),
            Err(reason) => {
                warn!(path = %rel, error = %reason, "skipping file during dependency scan");
                skipped.push(SkippedFile { path: rel, reason });
            }
        }
    }

    let local = local_module_names(&files);
    let content = render_manifest(&imports, &local);
    workspace.write(out_rel_path, &content)?;
    debug!(manifest = out_rel_path, imports = imports.len(), "wrote dependency manifest");

    Ok(DependencyReport { manifest_path: out_rel_path.to_string(), content, skipped })
}
