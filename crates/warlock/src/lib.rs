//! Warlock: a self-play training bridge for the Warlock arena simulation.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Warlock sub-crates.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use warlock::prelude::*;
//!
//! struct Idle;
//! impl Policy for Idle {
//!     fn spec(&self) -> PolicySpec { PolicySpec::codec() }
//!     fn act(&mut self, _: ActionPhase, _: &Observation, _: &ActionMask) -> Action {
//!         Action::NOOP
//!     }
//!     fn observe(&mut self, _: f64, _: bool) {}
//! }
//!
//! let config = LinkConfig::new("./warlock-sim").args(["--headless"]);
//! let mut link = SimulationLink::spawn(&config)?;
//! let controller = EpisodeController::new(EpisodeConfig::default())?;
//! let outcome = controller.run(&mut link, Some(7), &mut [Idle, Idle])?;
//! println!("{} steps, wins {:?}", outcome.steps, outcome.wins);
//! link.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `warlock-core` | IDs, ability catalog, wire schema, decoded state, commands |
//! | [`replay`] | `warlock-replay` | Episode recordings and replay sinks |
//! | [`link`] | `warlock-link` | Process transport and the simulation line protocol |
//! | [`codec`] | `warlock-codec` | Observations, action masks and order decoding |
//! | [`episode`] | `warlock-episode` | Policies, rewards and the episode controller |
//! | [`league`] | `warlock-league` | Roster, matchmaking, promotion and rollout workers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`warlock-core`).
///
/// Contains [`types::SimulationState`], the raw wire schema in
/// [`types::wire`], and the [`types::Command`]s written to the simulation.
pub use warlock_core as types;

/// Episode recordings and where they go (`warlock-replay`).
pub use warlock_replay as replay;

/// The simulation process link (`warlock-link`).
///
/// [`link::SimulationLink`] over a [`link::ChildTransport`] for real
/// processes, or any other [`link::Transport`].
pub use warlock_link as link;

/// Tensor encoding of states and decoding of actions (`warlock-codec`).
pub use warlock_codec as codec;

/// Episode control (`warlock-episode`).
pub use warlock_episode as episode;

/// Self-play league (`warlock-league`).
///
/// [`league::League`] owns the roster; [`league::RolloutWorker`]s play
/// episodes against [`league::Matchmaker`] snapshots.
pub use warlock_league as league;

/// Common imports for typical Warlock usage.
///
/// ```rust
/// use warlock::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use warlock_core::{
        AbilityId, Command, EntityId, EpisodeId, Order, PolicyId, SimulationState, Vec2,
    };

    // Codec
    pub use warlock_codec::{Action, ActionMask, ActionPhase, Observation, Perspective, TargetMode};

    // Link
    pub use warlock_link::{LinkConfig, LinkError, SimulationLink, StartOptions, StepMode};

    // Replay
    pub use warlock_replay::{DirectoryReplaySink, ReplaySink};

    // Episode
    pub use warlock_episode::{
        EpisodeConfig, EpisodeController, EpisodeError, EpisodeOutcome, Policy, PolicySpec,
    };

    // League
    pub use warlock_league::{
        League, LeagueAgent, LeagueConfig, LeagueError, MatchResult, PolicyProvider, PolicyStore,
        RolloutWorker,
    };
}
