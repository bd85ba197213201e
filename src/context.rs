//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::adapters::live::{LiveFileSystem, OllamaLlmClient};
use crate::adapters::recording::RecordingLlmClient;
use crate::adapters::replaying::ReplayingLlmClient;
use crate::cassette::format::Cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::AgentConfig;
use crate::ports::filesystem::FileSystem;
use crate::ports::llm::LlmClient;

/// Bundles the injected port objects for one command.
///
/// Constructors wire up different LLM adapters (live, recording, replaying);
/// the filesystem is always the live disk.
pub struct ServiceContext {
    /// Filesystem for file I/O.
    pub fs: Box<dyn FileSystem>,
    /// LLM client for language-model completions.
    pub llm: Box<dyn LlmClient>,
    /// Cassette recorder; written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a context around explicit adapters.
    #[must_use]
    pub fn new(fs: Box<dyn FileSystem>, llm: Box<dyn LlmClient>) -> Self {
        Self { fs, llm, recorder: None }
    }

    /// Creates a live context talking to the configured Ollama host.
    #[must_use]
    pub fn live(config: &AgentConfig) -> Self {
        Self::new(Box::new(LiveFileSystem), Box::new(OllamaLlmClient::new(&config.host)))
    }

    /// Creates a live context that records every completion to `path`.
    ///
    /// The cassette is written when the context is dropped.
    #[must_use]
    pub fn recording(config: &AgentConfig, path: &Path) -> Self {
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, "codegen-agent-session")));
        let inner = Box::new(OllamaLlmClient::new(&config.host));
        Self {
            fs: Box::new(LiveFileSystem),
            llm: Box::new(RecordingLlmClient::new(inner, Arc::clone(&recorder))),
            recorder: Some(recorder),
        }
    }

    /// Creates a context whose completions are served from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette = Cassette::from_yaml(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;
        let llm = ReplayingLlmClient::new(CassetteReplayer::new(&cassette));
        Ok(Self::new(Box::new(LiveFileSystem), Box::new(llm)))
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else {
            return;
        };
        let written = match recorder.lock() {
            Ok(guard) => guard.write(),
            Err(_) => Err(std::io::Error::other("recorder lock poisoned")),
        };
        match written {
            Ok(path) => info!(path = %path.display(), "recording saved"),
            Err(e) => warn!(error = %e, "failed to write cassette"),
        }
    }
}
