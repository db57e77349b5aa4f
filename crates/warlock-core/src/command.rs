//! Commands written to the simulation process and the orders they carry.
//!
//! Every command is encoded as one self-describing JSON object with a
//! `type` tag, terminated by a newline. Only [`Command::GetComponents`]
//! produces a response; everything else mutates simulation state
//! silently.

use serde::{Deserialize, Serialize};

use crate::ability::AbilityId;
use crate::id::EntityId;
use crate::vec2::Vec2;

/// Intent for one entity, applied by the simulation's order system.
///
/// "Do nothing" is the absence of an order, not a variant: sending
/// `SetOrder` with `order: None` clears the pending order.
///
/// # Examples
///
/// ```
/// use warlock_core::{AbilityId, Order, Vec2};
///
/// let order = Order::UseAbility {
///     ability_id: AbilityId::Teleport,
///     target: Some(Vec2::new(100.0, 100.0)),
/// };
/// let json = serde_json::to_string(&order).unwrap();
/// assert_eq!(
///     json,
///     r#"{"type":"useAbility","abilityId":"teleport","target":{"e1":100.0,"e2":100.0}}"#
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Order {
    /// Cancel whatever the unit is doing, including casts.
    Stop,
    /// Walk to a world point.
    Move {
        /// Destination in world units.
        target: Vec2,
    },
    /// Cast an ability, optionally at a world point.
    UseAbility {
        /// Ability to cast.
        ability_id: AbilityId,
        /// Target point in world units; `None` for self-cast abilities.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<Vec2>,
    },
}

impl Order {
    /// The world-space target of this order, if it has one.
    pub fn target(&self) -> Option<Vec2> {
        match self {
            Order::Stop => None,
            Order::Move { target } => Some(*target),
            Order::UseAbility { target, .. } => *target,
        }
    }
}

/// A request written to the simulation's input stream.
///
/// `GetComponents` is the only idempotent command. The others advance
/// or mutate the simulation; a later `SetOrder` for the same entity
/// overwrites an earlier one that has not yet been applied by a step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Create a fresh game, discarding any previous one.
    Start {
        /// Number of player units to spawn.
        num_players: u32,
        /// RNG seed; the simulation picks one when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
        /// Seconds per frame; the simulation defaults to 1/30.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delta_time: Option<f64>,
        /// Gold each player starts with in the first shop.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_gold: Option<f64>,
    },
    /// Advance the simulation by `steps` frames.
    Step {
        /// Number of frames to advance.
        steps: u32,
    },
    /// Replace the pending order of an entity.
    SetOrder {
        /// Entity receiving the order.
        entity_id: EntityId,
        /// The order, or `None` to clear it.
        order: Option<Order>,
    },
    /// Mark a player ready (or not) to leave the shop.
    SetReady {
        /// Player entity.
        entity_id: EntityId,
        /// Ready flag.
        ready: bool,
    },
    /// Queue an ability purchase for the next shop frame.
    BuyAbility {
        /// Player entity.
        entity_id: EntityId,
        /// Ability to purchase.
        ability_id: AbilityId,
    },
    /// Request the full component state.
    GetComponents,
}

impl Command {
    /// Wire tag of this command.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Step { .. } => "step",
            Command::SetOrder { .. } => "setOrder",
            Command::SetReady { .. } => "setReady",
            Command::BuyAbility { .. } => "buyAbility",
            Command::GetComponents => "getComponents",
        }
    }

    /// Whether the simulation answers this command with a state document.
    pub fn expects_response(&self) -> bool {
        matches!(self, Command::GetComponents)
    }

    /// Encode as one newline-terminated JSON line.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
