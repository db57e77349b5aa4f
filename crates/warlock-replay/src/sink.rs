//! Replay sinks.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ReplayError;
use crate::recording::EpisodeRecording;

/// File name of the state array inside each episode directory.
pub const STATE_HISTORY_FILE: &str = "state_history.json";

/// Persists finished episode recordings.
///
/// Called at most once per logged episode, always from the worker that
/// owns the simulation link.
pub trait ReplaySink: Send {
    /// Persist one complete recording.
    fn persist(&mut self, recording: EpisodeRecording) -> Result<(), ReplayError>;
}

/// Writes each recording to `<root>/<unix_nanos>_<game_id>/state_history.json`.
#[derive(Clone, Debug)]
pub struct DirectoryReplaySink {
    root: PathBuf,
}

impl DirectoryReplaySink {
    /// Create a sink rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this sink.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a previously written state history.
    pub fn load(dir: &Path) -> Result<Vec<serde_json::Value>, ReplayError> {
        let path = dir.join(STATE_HISTORY_FILE);
        let file = File::open(&path).map_err(|source| ReplayError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

impl ReplaySink for DirectoryReplaySink {
    fn persist(&mut self, recording: EpisodeRecording) -> Result<(), ReplayError> {
        if recording.is_empty() {
            return Err(ReplayError::EmptyRecording {
                game_id: recording.game_id().to_string(),
            });
        }
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = self.root.join(format!("{nanos}_{}", recording.game_id()));
        fs::create_dir_all(&dir).map_err(|source| ReplayError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(STATE_HISTORY_FILE);
        let io_err = |source| ReplayError::Io {
            path: path.clone(),
            source,
        };
        let file = File::create(&path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, recording.states())?;
        writer.flush().map_err(io_err)?;

        tracing::info!(
            game_id = recording.game_id(),
            states = recording.len(),
            path = %dir.display(),
            "replay written"
        );
        Ok(())
    }
}

/// Keeps recordings in memory.
///
/// Cloning shares the underlying storage, so a test can hand one clone
/// to a link and inspect the other.
#[derive(Clone, Debug, Default)]
pub struct MemoryReplaySink {
    recordings: Arc<Mutex<Vec<EpisodeRecording>>>,
}

impl MemoryReplaySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EpisodeRecording>> {
        // A poisoned lock only means a panicking thread held it; the
        // vector itself is always in a consistent state.
        self.recordings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of recordings persisted so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been persisted.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of all persisted recordings, oldest first.
    pub fn recordings(&self) -> Vec<EpisodeRecording> {
        self.lock().clone()
    }
}

impl ReplaySink for MemoryReplaySink {
    fn persist(&mut self, recording: EpisodeRecording) -> Result<(), ReplayError> {
        self.lock().push(recording);
        Ok(())
    }
}
