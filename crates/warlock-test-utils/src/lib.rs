//! Test support for Warlock development.
//!
//! - [`FakeSimulation`]: an in-process [`Transport`](warlock_link::Transport)
//!   speaking the simulation's line protocol, with scripted damage and
//!   fault injection.
//! - [`StateBuilder`]: hand-crafted [`SimulationState`](warlock_core::SimulationState)
//!   fixtures for codec tests.
//! - Scripted [`Policy`](warlock_episode::Policy) implementations.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fake_sim;
pub mod fixtures;
pub mod policies;

pub use fake_sim::{
    ability_defaults, FakeConfig, FakeHandle, FakeSimulation, Fault, FaultKind, ScheduledDamage,
    FIRST_PLAYER_ID,
};
pub use fixtures::StateBuilder;
pub use policies::{ConstantPolicy, RecordedStep, RecordingPolicy, ScriptedPolicy};
