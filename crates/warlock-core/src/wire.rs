//! Wire schema of the simulation's `getComponents` document.
//!
//! These structs mirror the JSON the simulation writes, one component
//! map per concern, keyed by stringified entity IDs. Required fields are
//! required and mistyped fields fail; fields this crate does not use are
//! ignored. [`SimulationState::from_raw`](crate::SimulationState::from_raw)
//! turns a [`RawState`] into the typed record consumed by the codec.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::command::Order;
use crate::vec2::Vec2;

/// One complete state document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawState {
    /// Global frame/phase bookkeeping.
    pub game_state: RawGameState,
    /// Physical bodies.
    pub bodies: BTreeMap<String, RawBody>,
    /// Health pools.
    pub healths: BTreeMap<String, RawHealth>,
    /// Owned abilities per entity, keyed by ability name.
    #[serde(default)]
    pub abilities: BTreeMap<String, BTreeMap<String, RawAbility>>,
    /// Controllable units.
    #[serde(default)]
    pub units: BTreeMap<String, RawUnit>,
    /// Ownership links.
    #[serde(default)]
    pub player_owneds: BTreeMap<String, RawPlayerOwned>,
    /// Live projectiles.
    #[serde(default)]
    pub projectiles: BTreeMap<String, RawProjectile>,
    /// Player bookkeeping (ready flags).
    #[serde(default)]
    pub players: BTreeMap<String, RawPlayer>,
    /// Shop state per player.
    #[serde(default)]
    pub shops: BTreeMap<String, RawShop>,
    /// Arena geometry.
    pub arena: RawArena,
    /// Events emitted during the last frame.
    #[serde(default)]
    pub game_events: RawGameEvents,
}

/// Global bookkeeping component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGameState {
    /// Frames advanced since start.
    pub frame_number: u64,
    /// Seconds per frame.
    pub delta_time: f64,
    /// Active high-level phase.
    pub state: RawPhase,
    /// Number of rounds started so far.
    #[serde(default)]
    pub round: u32,
}

/// High-level phase, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RawPhase {
    /// Purchase phase between rounds.
    Shop {
        /// Frame the shop opened.
        start_frame: u64,
        /// Shop duration in seconds.
        duration: f64,
    },
    /// Combat phase.
    Round {
        /// Frame the round started.
        start_frame: u64,
    },
}

/// Physical body component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBody {
    /// Position in world units.
    pub location: Vec2,
    /// Velocity in world units per second.
    #[serde(default)]
    pub velocity: Vec2,
    /// Facing angle in radians.
    #[serde(default)]
    pub facing: f64,
    /// Collision radius.
    #[serde(default)]
    pub radius: f64,
}

/// Health component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawHealth {
    /// Current health.
    pub current: f64,
    /// Maximum health.
    pub maximum: f64,
}

/// One owned ability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAbility {
    /// Cooldown in seconds.
    pub cooldown: f64,
    /// Frame the ability was last used; absent if never used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_frame: Option<u64>,
    /// Cast time in seconds, if the ability has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_time: Option<f64>,
}

/// Unit component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawUnit {
    /// Current activity.
    pub state: RawUnitState,
}

/// Unit activity, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RawUnitState {
    /// Standing still.
    Idle,
    /// Walking to a point.
    Moving {
        /// Destination.
        target: Vec2,
    },
    /// Casting an ability.
    Casting {
        /// The order being executed.
        cast_order: Order,
        /// Frame the cast started.
        start_frame: u64,
    },
}

/// Ownership component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayerOwned {
    /// Entity ID of the owning player.
    pub owning_player_id: u64,
}

/// Projectile component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawProjectile {
    /// Damage on hit.
    #[serde(default)]
    pub damage: f64,
}

/// Player component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlayer {
    /// Ready to leave the shop.
    #[serde(default)]
    pub ready: bool,
}

/// Shop component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawShop {
    /// Available gold.
    pub gold: f64,
    /// Ability prices by ability name; unlisted abilities are not for sale.
    #[serde(default)]
    pub costs: BTreeMap<String, f64>,
}

/// Arena component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawArena {
    /// Radius of the safe area.
    pub radius: f64,
}

/// Event list component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGameEvents {
    /// Events emitted during the last frame.
    #[serde(default)]
    pub events: Vec<RawGameEvent>,
}

/// An entity ID that may arrive as a number or as a map-key string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEntityRef {
    /// Numeric form.
    Number(u64),
    /// Stringified form.
    Text(String),
}

/// Discrete event, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RawGameEvent {
    /// An entity finished casting an ability.
    AbilityUsed {
        /// Caster.
        entity_id: RawEntityRef,
        /// Ability name.
        ability_id: String,
    },
    /// A round ended; `winners` are the surviving players.
    RoundOver {
        /// Surviving player entity IDs.
        winners: Vec<u64>,
    },
    /// Any event type this crate does not interpret.
    #[serde(other)]
    Other,
}
