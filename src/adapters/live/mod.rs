//! Live adapters for real external interactions.

pub mod filesystem;
pub mod llm;

pub use filesystem::LiveFileSystem;
pub use llm::OllamaLlmClient;
