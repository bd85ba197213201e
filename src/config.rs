//! Agent configuration.
//!
//! Values resolve in layers, later layers winning: built-in defaults, an
//! optional YAML file, environment variables (after loading `.env`), and
//! finally command-line flags.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::prompts::DEFAULT_VARIANT;

/// File looked up in the repository when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = ".codegen-agent.yaml";

const DEFAULT_MODEL: &str = "llama3.1";
const DEFAULT_HOST: &str = "http://localhost:11434";
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Fully resolved settings for one agent run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Repository root every file is written under.
    pub repo: PathBuf,
    /// Model identifier sent with each completion.
    pub model: String,
    /// Base URL of the Ollama server.
    pub host: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Log prompts and raw model output.
    pub verbose: bool,
    /// Prompt variant for the planning call.
    pub planning_variant: String,
    /// Prompt variant for the code-generation call.
    pub code_gen_variant: String,
    /// Directory holding prompt override files.
    pub prompts_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Defaults for a repository root.
    #[must_use]
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            model: DEFAULT_MODEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            verbose: false,
            planning_variant: DEFAULT_VARIANT.to_string(),
            code_gen_variant: DEFAULT_VARIANT.to_string(),
            prompts_dir: None,
        }
    }

    /// Applies the values present in a config file.
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(temperature) = file.temperature {
            self.temperature = temperature;
        }
        if let Some(variant) = file.planning_variant {
            self.planning_variant = variant;
        }
        if let Some(variant) = file.code_gen_variant {
            self.code_gen_variant = variant;
        }
        if let Some(dir) = file.prompts_dir {
            self.prompts_dir = Some(dir);
        }
    }

    /// Applies `CODEGEN_AGENT_MODEL`, `OLLAMA_HOST`, and
    /// `CODEGEN_AGENT_TEMPERATURE` through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temperature variable is not a number.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("CODEGEN_AGENT_MODEL") {
            self.model = model;
        }
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.host = host;
        }
        if let Some(raw) = lookup("CODEGEN_AGENT_TEMPERATURE") {
            self.temperature = raw
                .trim()
                .parse()
                .map_err(|e| format!("Invalid CODEGEN_AGENT_TEMPERATURE {raw:?}: {e}"))?;
        }
        Ok(())
    }

    /// Resolves defaults, config file, and process environment for `repo`.
    ///
    /// The repository directory is created if it does not exist. `config`
    /// overrides the default `<repo>/.codegen-agent.yaml` lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository path is not a directory, or the
    /// config file or environment holds invalid values.
    pub fn resolve(repo: &Path, config: Option<&Path>) -> Result<Self, String> {
        let repo = ensure_repo_path(repo)?;
        let _ = dotenvy::dotenv();

        let mut resolved = Self::new(&repo);
        let file_path = config.map_or_else(|| repo.join(CONFIG_FILE_NAME), Path::to_path_buf);
        if config.is_some() || file_path.exists() {
            resolved.apply_file(ConfigFile::load(&file_path)?);
        }
        resolved.apply_env(|key| env::var(key).ok())?;
        Ok(resolved)
    }
}

/// On-disk configuration; every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Model identifier.
    pub model: Option<String>,
    /// Ollama base URL.
    pub host: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Planning prompt variant.
    pub planning_variant: Option<String>,
    /// Code-generation prompt variant.
    pub code_gen_variant: Option<String>,
    /// Prompt override directory.
    pub prompts_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Parses a config file from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed YAML or unknown keys.
    pub fn parse(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| format!("Invalid config: {e}"))
    }

    /// Loads and parses a config file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
        Self::parse(&text).map_err(|e| format!("{}: {e}", path.display()))
    }
}

/// Creates the repository directory if needed and returns its canonical path.
///
/// # Errors
///
/// Returns an error if the path exists but is not a directory, or cannot be
/// created.
pub fn ensure_repo_path(repo: &Path) -> Result<PathBuf, String> {
    if !repo.exists() {
        std::fs::create_dir_all(repo)
            .map_err(|e| format!("Failed to create repo directory {}: {e}", repo.display()))?;
    }
    if !repo.is_dir() {
        return Err(format!("Invalid repo path (not a directory): {}", repo.display()));
    }
    repo.canonicalize().map_err(|e| format!("Failed to resolve repo path {}: {e}", repo.display()))
}
