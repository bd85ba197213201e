//! `codegen-agent prompts` command.

use std::path::Path;

use crate::adapters::live::LiveFileSystem;
use crate::prompts::PromptStore;

/// Execute the `prompts` command: one `task: variant, ...` line per task.
///
/// # Errors
///
/// Returns an error string if an override file cannot be loaded.
pub fn run(prompts_dir: Option<&Path>) -> Result<(), String> {
    for line in listing(prompts_dir)? {
        println!("{line}");
    }
    Ok(())
}

fn listing(prompts_dir: Option<&Path>) -> Result<Vec<String>, String> {
    let mut store = PromptStore::builtin();
    if let Some(dir) = prompts_dir {
        store = store.with_overrides(&LiveFileSystem, dir).map_err(|e| e.to_string())?;
    }
    Ok(store
        .list_available_tasks()
        .into_iter()
        .map(|task| format!("{task}: {}", store.list_variants(task).join(", ")))
        .collect())
}
