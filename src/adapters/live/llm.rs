//! Live adapter for the `LlmClient` port using the Ollama generate API.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::llm::{
    CompletionFuture, CompletionRequest, CompletionResponse, LlmClient, LlmError,
};

/// Live LLM client that calls a local or remote Ollama server.
pub struct OllamaLlmClient {
    client: Client,
    host: String,
}

impl OllamaLlmClient {
    /// Creates a client for the Ollama server at `host` (e.g. `http://localhost:11434`).
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self { client: Client::new(), host: host.into() }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.host.trim_end_matches('/'))
    }
}

/// Request body sent to `/api/generate`.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// Sampling options understood by Ollama.
#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// Non-streaming response from `/api/generate`.
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

/// Error body returned by Ollama on failure.
#[derive(Deserialize)]
struct OllamaError {
    error: String,
}

impl LlmClient for OllamaLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let body = GenerateRequest {
                model: &request.model,
                prompt: &request.prompt,
                stream: false,
                options: GenerateOptions { temperature: request.temperature },
            };

            let response = self
                .client
                .post(self.endpoint())
                .json(&body)
                .send()
                .await
                .map_err(|e| -> LlmError { format!("Ollama request failed: {e}").into() })?;

            let status = response.status();
            let response_text = response
                .text()
                .await
                .map_err(|e| -> LlmError { format!("Failed to read Ollama response: {e}").into() })?;

            if !status.is_success() {
                let msg = serde_json::from_str::<OllamaError>(&response_text)
                    .map(|e| e.error)
                    .unwrap_or(response_text);
                return Err(format!("Ollama error ({}): {msg}", status.as_u16()).into());
            }

            let parsed: GenerateResponse = serde_json::from_str(&response_text)
                .map_err(|e| -> LlmError { format!("Failed to parse Ollama response: {e}").into() })?;

            Ok(CompletionResponse {
                text: parsed.response,
                prompt_tokens: parsed.prompt_eval_count,
                completion_tokens: parsed.eval_count,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OllamaLlmClient::new("http://localhost:11434/");
        assert_eq!(client.endpoint(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn request_body_disables_streaming() {
        let body = GenerateRequest {
            model: "llama3.1",
            prompt: "hi",
            stream: false,
            options: GenerateOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.5);
    }
}
