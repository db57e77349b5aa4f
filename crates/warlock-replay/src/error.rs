//! Error types for replay persistence.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can occur while persisting or loading a recording.
#[derive(Debug)]
pub enum ReplayError {
    /// An I/O error occurred while writing or reading a replay.
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// A recording could not be encoded or decoded as JSON.
    Json(serde_json::Error),
    /// A sink refused a recording with no states.
    EmptyRecording {
        /// Game ID of the empty recording.
        game_id: String,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "I/O error at {}: {source}", path.display()),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::EmptyRecording { game_id } => {
                write!(f, "recording for game {game_id} has no states")
            }
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(e) => Some(e),
            Self::EmptyRecording { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
