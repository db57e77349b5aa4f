//! Decoding policy actions into simulation orders.
//!
//! A decoded action that names an unowned or not-ready ability is not
//! an error: it decodes to `None` and the entity keeps whatever it was
//! doing, exactly like a no-op.

use warlock_core::{AbilityId, AbilityTarget, Order, SimulationState, Vec2};

use crate::layout::{Perspective, OBSERVED_ABILITIES, ROUND_ACTIONS, SHOP_ACTIONS};
use crate::observation::denormalize_position;

/// One discrete category plus a normalized target point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Action {
    /// Chosen category index (see the phase's mask layout).
    pub category: usize,
    /// Target in normalized `[0, 1]` coordinates; ignored by categories
    /// that take no target.
    pub target: [f32; 2],
}

impl Action {
    /// The no-op action.
    pub const NOOP: Action = Action {
        category: 0,
        target: [0.5, 0.5],
    };

    /// Category with a centered target.
    pub fn new(category: usize) -> Self {
        Self {
            category,
            target: [0.5, 0.5],
        }
    }

    /// Category with a target.
    pub fn targeted(category: usize, target: [f32; 2]) -> Self {
        Self { category, target }
    }
}

/// How normalized targets map to world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetMode {
    /// `(t - 0.5) * WORLD_SCALE` around the world origin.
    #[default]
    Absolute,
    /// Same offset, around the opponent's position.
    RelativeToEnemy,
}

/// A decoded shop action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShopDecision {
    /// Mark the player ready.
    Ready,
    /// Buy an ability.
    Buy(AbilityId),
}

fn world_target(
    state: &SimulationState,
    view: Perspective,
    action: &Action,
    mode: TargetMode,
) -> Vec2 {
    let offset = Vec2::new(
        denormalize_position(f64::from(action.target[0])),
        denormalize_position(f64::from(action.target[1])),
    );
    match mode {
        TargetMode::Absolute => offset,
        TargetMode::RelativeToEnemy => {
            let anchor = state
                .entity(view.other_id)
                .map_or(Vec2::ZERO, |e| e.location);
            anchor + offset
        }
    }
}

/// Decode a round action into an order for `view.self_id`.
///
/// Categories: 0 no-op, 1 stop, 2 move, `3 + i` use
/// `OBSERVED_ABILITIES[i]`. Returns `None` for no-op, an out-of-range
/// category, or an ability the entity does not own or cannot use yet.
/// Abilities without a point target (scourge, shield) get `target:
/// None`.
pub fn decode_order(
    state: &SimulationState,
    view: Perspective,
    action: &Action,
    mode: TargetMode,
) -> Option<Order> {
    match action.category {
        0 => None,
        1 => Some(Order::Stop),
        2 => Some(Order::Move {
            target: world_target(state, view, action, mode),
        }),
        c if c < ROUND_ACTIONS => {
            let ability = OBSERVED_ABILITIES[c - 3];
            if !state.ability_ready(view.self_id, ability) {
                return None;
            }
            let target = match ability.target() {
                AbilityTarget::Point => Some(world_target(state, view, action, mode)),
                AbilityTarget::None => None,
            };
            Some(Order::UseAbility {
                ability_id: ability,
                target,
            })
        }
        _ => None,
    }
}

/// Decode a shop action for `view.self_id`.
///
/// Categories: 0 no-op, 1 ready, `2 + i` buy `OBSERVED_ABILITIES[i]`.
/// A purchase that is already owned, not for sale or unaffordable
/// decodes to `None`.
pub fn decode_shop_action(
    state: &SimulationState,
    view: Perspective,
    action: &Action,
) -> Option<ShopDecision> {
    match action.category {
        0 => None,
        1 => Some(ShopDecision::Ready),
        c if c < SHOP_ACTIONS => {
            let ability = OBSERVED_ABILITIES[c - 2];
            let shop = state.players.get(&view.self_id)?;
            let owned = state.entity(view.self_id)?.owns(ability);
            let cost = *shop.costs.get(&ability)?;
            (!owned && cost <= shop.gold).then_some(ShopDecision::Buy(ability))
        }
        _ => None,
    }
}
