//! Records completion exchanges into a cassette file.

use std::path::PathBuf;

use chrono::Utc;

use super::format::{Cassette, Interaction};
use crate::ports::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Records exchanges and writes them as a YAML cassette file.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    interactions: Vec<Interaction>,
    next_seq: u64,
}

impl CassetteRecorder {
    /// Create a new recorder that will write to the given path.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), interactions: Vec::new(), next_seq: 0 }
    }

    /// Record one exchange. The `seq` field is assigned automatically.
    pub fn record(
        &mut self,
        request: &CompletionRequest,
        result: &Result<CompletionResponse, LlmError>,
    ) {
        let (response, error) = match result {
            Ok(response) => (Some(response.clone()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        self.interactions.push(Interaction {
            seq: self.next_seq,
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            response,
            error,
        });
        self.next_seq += 1;
    }

    /// Write everything recorded so far to disk as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn write(&self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette {
            name: self.name.clone(),
            recorded_at: Utc::now(),
            interactions: self.interactions.clone(),
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path.clone())
    }
}
