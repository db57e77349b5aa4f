//! The in-memory history of one logged episode.

use serde_json::value::RawValue;

/// Ordered state documents of one episode on one link.
///
/// States are appended in frame order and never reordered. A recording
/// belongs to exactly one game: the link hands it to the sink and starts
/// a fresh recording before the next `start` command is written.
#[derive(Clone, Debug)]
pub struct EpisodeRecording {
    game_id: String,
    seed: Option<u64>,
    states: Vec<Box<RawValue>>,
}

impl EpisodeRecording {
    /// Start an empty recording for `game_id`.
    pub fn new(game_id: impl Into<String>, seed: Option<u64>) -> Self {
        Self {
            game_id: game_id.into(),
            seed,
            states: Vec::new(),
        }
    }

    /// Append one raw state document.
    pub fn push(&mut self, state: Box<RawValue>) {
        self.states.push(state);
    }

    /// Unique game identifier assigned by the link.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Seed the game was started with, if one was given.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Recorded documents in frame order.
    pub fn states(&self) -> &[Box<RawValue>] {
        &self.states
    }

    /// Number of recorded documents.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
