//! Replays recorded completions from a cassette.

use std::collections::VecDeque;

use super::format::{Cassette, Interaction};

/// Serves the interactions of a loaded cassette in recording order.
pub struct CassetteReplayer {
    queue: VecDeque<Interaction>,
    total: usize,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut interactions = cassette.interactions.clone();
        interactions.sort_by_key(|i| i.seq);
        let total = interactions.len();
        Self { queue: interactions.into(), total }
    }

    /// Return the next interaction, or an error once every recorded
    /// interaction has been consumed.
    ///
    /// # Errors
    ///
    /// Returns a descriptive message when the cassette is exhausted.
    pub fn next_interaction(&mut self) -> Result<Interaction, String> {
        self.queue.pop_front().ok_or_else(|| {
            format!(
                "Cassette exhausted: all {} recorded completions have been consumed",
                self.total
            )
        })
    }
}
