//! Adapter implementations of the port traits.
//!
//! - `live`: real disk and a real Ollama server
//! - `recording`: wraps a live LLM client and captures completions to a cassette
//! - `replaying`: serves completions from a recorded cassette

pub mod live;
pub mod recording;
pub mod replaying;
