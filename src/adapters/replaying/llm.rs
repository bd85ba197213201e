//! Replaying adapter for the `LlmClient` port.

use std::sync::Mutex;

use crate::cassette::replayer::CassetteReplayer;
use crate::ports::llm::{CompletionFuture, CompletionRequest, LlmClient, LlmError};

/// Serves recorded LLM completions from a cassette, in order.
pub struct ReplayingLlmClient {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingLlmClient {
    /// Create a replaying LLM client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn next_result(&self) -> Result<crate::ports::llm::CompletionResponse, LlmError> {
        let mut replayer =
            self.replayer.lock().map_err(|_| -> LlmError { "replayer lock poisoned".into() })?;
        let interaction = replayer.next_interaction()?;
        match (interaction.response, interaction.error) {
            (_, Some(error)) => Err(error.into()),
            (Some(response), None) => Ok(response),
            (None, None) => {
                Err(format!("recorded interaction seq={} has no response", interaction.seq).into())
            }
        }
    }
}

impl LlmClient for ReplayingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> CompletionFuture<'_> {
        let result = self.next_result();
        Box::pin(async move { result })
    }
}
