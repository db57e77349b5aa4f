//! Link error taxonomy.
//!
//! [`ProcessError`] and [`ProtocolError`] are both fatal for the link,
//! but kept apart: a dead process points at the simulation or the host,
//! a malformed response points at a protocol or schema mismatch.

use std::error::Error;
use std::fmt;
use std::io;

use warlock_core::SchemaError;
use warlock_replay::ReplayError;

use crate::config::ConfigError;

/// The simulation process died or its pipes failed.
#[derive(Debug)]
pub enum ProcessError {
    /// The process could not be launched.
    Spawn {
        /// Program that failed to launch.
        program: String,
        /// The underlying error.
        source: io::Error,
    },
    /// Writing a command failed (typically a broken pipe).
    Write {
        /// Wire tag of the command being written.
        command: &'static str,
        /// The underlying error.
        source: io::Error,
    },
    /// Reading the response failed.
    Read(io::Error),
    /// Output closed before any byte of the expected response.
    Exited {
        /// Exit status, if the process has been reaped.
        status: Option<String>,
    },
    /// Output closed in the middle of a response.
    Truncated {
        /// Bytes received before the pipe closed.
        received: usize,
        /// Exit status, if the process has been reaped.
        status: Option<String>,
    },
    /// Terminating or reaping the process failed.
    Shutdown(io::Error),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { program, source } => write!(f, "failed to spawn '{program}': {source}"),
            Self::Write { command, source } => {
                write!(f, "failed to write '{command}' command: {source}")
            }
            Self::Read(e) => write!(f, "failed to read response: {e}"),
            Self::Exited { status } => match status {
                Some(s) => write!(f, "simulation exited ({s})"),
                None => write!(f, "simulation closed its output"),
            },
            Self::Truncated { received, status } => {
                write!(f, "simulation output closed after {received} bytes")?;
                if let Some(s) = status {
                    write!(f, " ({s})")?;
                }
                Ok(())
            }
            Self::Shutdown(e) => write!(f, "failed to terminate simulation: {e}"),
        }
    }
}

impl Error for ProcessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } | Self::Write { source, .. } => Some(source),
            Self::Read(e) | Self::Shutdown(e) => Some(e),
            _ => None,
        }
    }
}

/// The simulation answered with something that is not a valid state.
#[derive(Debug, PartialEq)]
pub enum ProtocolError {
    /// The response is not valid JSON.
    Malformed {
        /// Parser diagnostic.
        detail: String,
    },
    /// The response is JSON but does not fit the state schema.
    Schema {
        /// Decoder diagnostic.
        detail: String,
    },
    /// The response exceeded `max_response_bytes`.
    ResponseTooLarge {
        /// The configured limit.
        limit: usize,
    },
    /// The frame number went backwards within one game.
    FrameRegression {
        /// Frame of the previous state.
        previous: u64,
        /// Frame of the offending state.
        current: u64,
    },
    /// A command could not be encoded.
    Encode {
        /// Encoder diagnostic.
        detail: String,
    },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { detail } => write!(f, "malformed response: {detail}"),
            Self::Schema { detail } => write!(f, "response does not match schema: {detail}"),
            Self::ResponseTooLarge { limit } => {
                write!(f, "response exceeds {limit} bytes")
            }
            Self::FrameRegression { previous, current } => {
                write!(f, "frame went backwards from {previous} to {current}")
            }
            Self::Encode { detail } => write!(f, "failed to encode command: {detail}"),
        }
    }
}

impl Error for ProtocolError {}

impl From<SchemaError> for ProtocolError {
    fn from(e: SchemaError) -> Self {
        Self::Schema {
            detail: e.to_string(),
        }
    }
}

/// Errors returned by [`SimulationLink`](crate::SimulationLink).
#[derive(Debug)]
pub enum LinkError {
    /// The process died or a pipe failed. Fatal.
    Process(ProcessError),
    /// The process produced an invalid response. Fatal.
    Protocol(ProtocolError),
    /// The replay sink failed to persist a recording.
    Replay(ReplayError),
    /// Invalid link configuration.
    Config(ConfigError),
    /// A command that needs a running game was issued before `start`.
    NotStarted,
    /// Logging was requested but the link has no replay sink.
    ReplayUnavailable,
    /// The link was closed, explicitly or after a fatal error.
    Closed,
}

impl LinkError {
    /// Whether the error poisons the link.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Process(_) | Self::Protocol(_) | Self::Closed)
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process(e) => write!(f, "process error: {e}"),
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
            Self::Replay(e) => write!(f, "replay error: {e}"),
            Self::Config(e) => write!(f, "config error: {e}"),
            Self::NotStarted => write!(f, "simulation not started"),
            Self::ReplayUnavailable => write!(f, "logging requested without a replay sink"),
            Self::Closed => write!(f, "link is closed"),
        }
    }
}

impl Error for LinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Process(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Replay(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProcessError> for LinkError {
    fn from(e: ProcessError) -> Self {
        Self::Process(e)
    }
}

impl From<ProtocolError> for LinkError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

impl From<ReplayError> for LinkError {
    fn from(e: ReplayError) -> Self {
        Self::Replay(e)
    }
}

impl From<ConfigError> for LinkError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
