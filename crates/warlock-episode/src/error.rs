//! Error types for episode execution.

use std::error::Error;
use std::fmt;

use warlock_codec::{ActionPhase, CodecError, PhaseShape};
use warlock_link::LinkError;

use crate::config::ConfigError;

/// Errors raised by [`EpisodeController`](crate::EpisodeController).
#[derive(Debug)]
pub enum EpisodeError {
    /// The simulation link failed.
    Link(LinkError),
    /// A tracked player vanished from the state mid-episode.
    Codec(CodecError),
    /// The episode configuration is invalid.
    Config(ConfigError),
    /// A policy declared shapes that differ from the codec's.
    ShapeMismatch {
        /// Offending slot.
        slot: usize,
        /// Phase whose shape differs.
        phase: ActionPhase,
        /// Shape the codec produces.
        expected: PhaseShape,
        /// Shape the policy declared.
        actual: PhaseShape,
    },
    /// The number of policies differs from the configured player count.
    PolicyCount {
        /// Configured player count.
        expected: usize,
        /// Policies supplied.
        actual: usize,
    },
    /// The simulation reported a different number of players than
    /// requested.
    PlayerCount {
        /// Configured player count.
        expected: usize,
        /// Players present in the first state.
        actual: usize,
    },
}

impl EpisodeError {
    /// Whether the link is unusable after this error.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Link(e) => e.is_fatal(),
            _ => false,
        }
    }
}

impl fmt::Display for EpisodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link error: {e}"),
            Self::Codec(e) => write!(f, "codec error: {e}"),
            Self::Config(e) => write!(f, "config error: {e}"),
            Self::ShapeMismatch {
                slot,
                phase,
                expected,
                actual,
            } => write!(
                f,
                "policy in slot {slot} declares {phase:?} shape {}x{}, codec produces {}x{}",
                actual.observation_len,
                actual.action_categories,
                expected.observation_len,
                expected.action_categories
            ),
            Self::PolicyCount { expected, actual } => {
                write!(f, "expected {expected} policies, got {actual}")
            }
            Self::PlayerCount { expected, actual } => {
                write!(f, "expected {expected} players in simulation, found {actual}")
            }
        }
    }
}

impl Error for EpisodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Link(e) => Some(e),
            Self::Codec(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LinkError> for EpisodeError {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl From<CodecError> for EpisodeError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<ConfigError> for EpisodeError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
