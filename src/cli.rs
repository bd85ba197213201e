//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `codegen-agent`.
#[derive(Debug, Parser)]
#[command(
    name = "codegen-agent",
    version,
    about = "Generate multi-file Python projects with a local model"
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan, generate, and write a project whose entry module is MODULE_PATH.
    Create(CreateArgs),
    /// Infer a requirements file from the imports under the scan paths.
    Requirements {
        /// Where to write the manifest, relative to the repository root.
        out: String,
        /// Files or directories to scan, relative to the repository root.
        #[arg(default_value = ".")]
        scan: Vec<String>,
        /// Repository root.
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// List prompt tasks and their variants.
    Prompts {
        /// Directory holding prompt override files.
        #[arg(long)]
        prompts_dir: Option<PathBuf>,
    },
}

/// Arguments for `create`.
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// What the program should do.
    pub desc: String,
    /// Entry module path, relative to the repository root (e.g. `calc/app.py`).
    pub module_path: String,
    /// Repository root all files are written under.
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,
    /// Model identifier.
    #[arg(long)]
    pub model: Option<String>,
    /// Ollama base URL.
    #[arg(long)]
    pub host: Option<String>,
    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f32>,
    /// Prompt variant for the planning call.
    #[arg(long)]
    pub planning_variant: Option<String>,
    /// Prompt variant for the code-generation call.
    #[arg(long)]
    pub code_gen_variant: Option<String>,
    /// Directory holding prompt override files.
    #[arg(long)]
    pub prompts_dir: Option<PathBuf>,
    /// Config file to use instead of `<repo>/.codegen-agent.yaml`.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Record model completions to this cassette file.
    #[arg(long, conflicts_with = "replay")]
    pub record: Option<PathBuf>,
    /// Serve model completions from this cassette file.
    #[arg(long)]
    pub replay: Option<PathBuf>,
    /// Log prompts and raw model output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Command {
    /// Whether debug logging was requested.
    #[must_use]
    pub fn verbose(&self) -> bool {
        matches!(self, Self::Create(args) if args.verbose)
    }
}
