//! Recording adapters that capture exchanges to cassettes.

pub mod llm;

pub use llm::RecordingLlmClient;
