//! Self-play league for Warlock agents.
//!
//! The [`League`] owns the roster of policies and evolves it:
//!
//! - **Main** agents are trainable and play the broad pool of Mains and
//!   Clones.
//! - **Exploiter** agents are trainable and play only their target Main.
//! - **Clone** agents are frozen snapshots of a trainable agent.
//!
//! Every roster change builds a new immutable [`Matchmaker`] and
//! broadcasts it to all registered [`RolloutWorker`]s, blocking until
//! each has acknowledged it between episodes. Matchmaking is a pure
//! function of `(episode, slot)`, so a retried episode reproduces its
//! matchup exactly.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod config;
pub mod error;
pub mod league;
pub mod matchmaker;
pub mod store;
pub mod sync;
pub mod worker;

pub use agent::{AgentRecord, LeagueAgent, MatchResult};
pub use config::{ConfigError, LeagueConfig, PromotionConfig};
pub use error::LeagueError;
pub use league::{CollectedResults, League};
pub use matchmaker::Matchmaker;
pub use store::{MemoryPolicyStore, PolicyStore, StoreError};
pub use sync::{EpisodeCounter, RosterUpdate, Synchronizer, WorkerAck, WorkerEndpoint, WorkerId};
pub use worker::{LinkFactory, PolicyProvider, RolloutWorker, MAX_CONSECUTIVE_RELINKS};
