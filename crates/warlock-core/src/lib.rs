//! Core types for the Warlock training bridge.
//!
//! This is the leaf crate of the workspace. It defines the strongly-typed
//! vocabulary shared by every other crate: entity and policy IDs, the
//! ability catalog, the wire schema of the simulation's state documents,
//! the decoded [`SimulationState`] record, and the [`Command`]/[`Order`]
//! types written to the simulation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod ability;
pub mod command;
pub mod error;
pub mod id;
pub mod state;
pub mod vec2;
pub mod wire;

pub use ability::{AbilityId, AbilityTarget};
pub use command::{Command, Order};
pub use error::SchemaError;
pub use id::{EntityId, EpisodeId, PolicyId};
pub use state::{
    AbilityRecord, Entity, GameEvent, Health, Phase, PlayerInfo, SimulationState, UnitActivity,
};
pub use vec2::Vec2;
pub use wire::RawState;
