//! Episode controller for Warlock self-play.
//!
//! An [`EpisodeController`] runs one game on a
//! [`SimulationLink`](warlock_link::SimulationLink): every step it
//! encodes each slot's observation and mask, asks the slot's
//! [`Policy`] for an action, submits the decoded order, advances a fixed
//! number of frames and hands each policy its reward.
//!
//! Episode phases move `NotStarted → Shopping → Round → (Shopping |
//! Terminal)`. The episode terminates when the configured number of
//! rounds has been played and the simulation is back in the shop, or
//! when a tracked player's health reaches zero mid-round.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod error;
pub mod policy;
pub mod reward;

pub use config::{ConfigError, EpisodeConfig};
pub use controller::{EpisodeController, EpisodeOutcome, EpisodePhase};
pub use error::EpisodeError;
pub use policy::{Policy, PolicySpec};
pub use reward::{is_terminal, round_results, step_reward, RoundResult};
