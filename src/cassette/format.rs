//! Cassette data structures for recording and replaying completions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::llm::CompletionResponse;

/// A single recorded completion exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// Model the prompt was sent to.
    #[serde(default)]
    pub model: String,
    /// The rendered prompt.
    #[serde(default)]
    pub prompt: String,
    /// The completion, when the call succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<CompletionResponse>,
    /// The error message, when the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A cassette containing a sequence of recorded exchanges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Ordered list of interactions.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Parses a cassette from YAML text.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the text is not a valid cassette.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_written_cassette_needs_only_responses() {
        let yaml = "\
name: handmade
recorded_at: 2025-03-15T14:30:00Z
interactions:
  - seq: 0
    response:
      text: the plan
  - seq: 1
    error: connection refused
";
        let cassette = Cassette::from_yaml(yaml).expect("parse");

        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(
            cassette.interactions[0].response,
            Some(CompletionResponse::text("the plan"))
        );
        assert_eq!(cassette.interactions[1].error.as_deref(), Some("connection refused"));
        assert!(cassette.interactions[1].prompt.is_empty());
    }
}
