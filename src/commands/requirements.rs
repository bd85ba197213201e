//! `codegen-agent requirements` command.

use std::path::Path;

use tracing::info;

use crate::adapters::live::LiveFileSystem;
use crate::materialize::requirements::{generate_requirements, DependencyReport};
use crate::materialize::workspace::Workspace;

/// Execute the `requirements` command: write the manifest and print its
/// content.
///
/// # Errors
///
/// Returns an error string if the repository root is missing, a path escapes
/// it, or the manifest cannot be written.
pub fn run(repo: &Path, out: &str, scan: &[String]) -> Result<(), String> {
    let report = generate(repo, out, scan)?;
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.path, skipped.reason);
    }
    info!(manifest = %report.manifest_path, count = report.requirements().len(), "wrote requirements");
    print!("{}", report.content);
    Ok(())
}

fn generate(repo: &Path, out: &str, scan: &[String]) -> Result<DependencyReport, String> {
    if !repo.is_dir() {
        return Err(format!("Invalid repo path (not a directory): {}", repo.display()));
    }
    let repo = repo
        .canonicalize()
        .map_err(|e| format!("Failed to resolve repo path {}: {e}", repo.display()))?;
    let fs = LiveFileSystem;
    let workspace = Workspace::new(&fs, &repo);
    let targets: Vec<&str> = scan.iter().map(String::as_str).collect();
    generate_requirements(&workspace, out, &targets).map_err(|e| e.to_string())
}
