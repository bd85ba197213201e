//! Command dispatch and handlers.

pub mod create;
pub mod prompts;
pub mod requirements;

use crate::cli::Command;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Create(args) => create::run(args),
        Command::Requirements { out, scan, repo } => requirements::run(repo, out, scan),
        Command::Prompts { prompts_dir } => prompts::run(prompts_dir.as_deref()),
    }
}
