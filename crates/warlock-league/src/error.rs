//! Error types for the league.

use std::error::Error;
use std::fmt;

use warlock_core::PolicyId;
use warlock_episode::EpisodeError;
use warlock_link::LinkError;

use crate::config::ConfigError;
use crate::sync::WorkerId;

/// Errors raised by the league, its matchmaker and its workers.
#[derive(Debug)]
pub enum LeagueError {
    /// A sampling pool is empty. `agent` is `None` for the pool of
    /// trainable agents, otherwise the agent whose opponents are missing.
    EmptyPool {
        /// Agent whose opponent pool is empty.
        agent: Option<PolicyId>,
    },
    /// An Exploiter was given a target that is not a Main.
    InvalidTarget {
        /// The rejected target.
        target: PolicyId,
    },
    /// A Clone was requested of a frozen agent.
    FrozenSource {
        /// The rejected source.
        source: PolicyId,
    },
    /// The policy ID is not in the roster or the provider.
    UnknownPolicy {
        /// The unknown ID.
        id: PolicyId,
    },
    /// The policy store rejected an operation.
    Store(Box<dyn Error + Send + Sync>),
    /// The league side of a worker endpoint is gone.
    Disconnected {
        /// The orphaned worker.
        worker: WorkerId,
    },
    /// An episode failed.
    Episode(EpisodeError),
    /// Closing a worker's link failed.
    Link(LinkError),
    /// The league configuration is invalid.
    Config(ConfigError),
}

impl LeagueError {
    /// Whether the error left the worker's simulation link unusable.
    pub fn poisons_link(&self) -> bool {
        match self {
            Self::Episode(e) => e.is_fatal(),
            Self::Link(e) => e.is_fatal(),
            _ => false,
        }
    }
}

impl fmt::Display for LeagueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPool { agent: None } => write!(f, "no trainable agents in league"),
            Self::EmptyPool { agent: Some(id) } => {
                write!(f, "opponent pool of agent {id} is empty")
            }
            Self::InvalidTarget { target } => {
                write!(f, "exploiter target {target} is not a main agent")
            }
            Self::FrozenSource { source } => {
                write!(f, "agent {source} is a frozen clone and cannot be cloned")
            }
            Self::UnknownPolicy { id } => write!(f, "unknown policy {id}"),
            Self::Store(e) => write!(f, "policy store error: {e}"),
            Self::Disconnected { worker } => {
                write!(f, "worker {worker} lost its league connection")
            }
            Self::Episode(e) => write!(f, "episode error: {e}"),
            Self::Link(e) => write!(f, "link error: {e}"),
            Self::Config(e) => write!(f, "config error: {e}"),
        }
    }
}

impl Error for LeagueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(e) => Some(e.as_ref()),
            Self::Episode(e) => Some(e),
            Self::Link(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EpisodeError> for LeagueError {
    fn from(e: EpisodeError) -> Self {
        Self::Episode(e)
    }
}

impl From<LinkError> for LeagueError {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl From<ConfigError> for LeagueError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
