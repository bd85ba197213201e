//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::cassette::recorder::CassetteRecorder;
use crate::ports::llm::{CompletionFuture, CompletionRequest, LlmClient};

/// Records LLM exchanges while delegating to an inner implementation.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingLlmClient {
    /// Creates a new recording LLM client wrapping the given implementation.
    pub fn new(inner: Box<dyn LlmClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();
        let recorder = Arc::clone(&self.recorder);

        Box::pin(async move {
            let result = self.inner.complete(&request).await;

            match recorder.lock() {
                Ok(mut guard) => guard.record(&request, &result),
                Err(_) => warn!("cassette recorder lock poisoned; exchange not recorded"),
            }

            result
        })
    }
}
