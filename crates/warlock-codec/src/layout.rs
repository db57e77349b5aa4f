//! Tensor layout constants and the encoding perspective.

use warlock_core::{AbilityId, EntityId};

/// World units mapped onto the unit interval by position encoding.
pub const WORLD_SCALE: f64 = 2000.0;

/// Number of nearest projectiles encoded per observation.
pub const PROJECTILE_SLOTS: usize = 5;

/// Features per projectile slot: `x, y, dx, dy, distance, enemy`.
pub const PROJECTILE_FEATURES: usize = 6;

/// Value of unfilled projectile slots.
pub const PAD_VALUE: f32 = 0.5;

/// Abilities with a slot in observations and masks, in slot order.
pub const OBSERVED_ABILITIES: [AbilityId; 6] = [
    AbilityId::Shoot,
    AbilityId::Teleport,
    AbilityId::Swap,
    AbilityId::Homing,
    AbilityId::Scourge,
    AbilityId::Shield,
];

/// Gold amount encoded as 1.0.
pub const GOLD_SCALE: f64 = 100.0;

/// Round index encoded as 1.0.
pub const MAX_ROUNDS_SCALE: f64 = 16.0;

const ABILITY_SLOTS: usize = OBSERVED_ABILITIES.len();

/// Round observation length.
///
/// health ×2, position ×4, relative position ×2, facing ×4, velocity ×4,
/// unit state one-hot ×6, arena radius ×1, cooldown fractions ×12,
/// projectile slots ×30.
pub const ROUND_OBS_LEN: usize =
    2 + 4 + 2 + 4 + 4 + 6 + 1 + 2 * ABILITY_SLOTS + PROJECTILE_SLOTS * PROJECTILE_FEATURES;

/// Shop observation length: gold, round, then per ability
/// `(owned, cost, affordable, other owned)`.
pub const SHOP_OBS_LEN: usize = 2 + 4 * ABILITY_SLOTS;

/// Round action categories: no-op, stop, move, then one per ability.
pub const ROUND_ACTIONS: usize = 3 + ABILITY_SLOTS;

/// Shop action categories: no-op, ready, then one buy per ability.
pub const SHOP_ACTIONS: usize = 2 + ABILITY_SLOTS;

/// Tensor shape of one phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PhaseShape {
    /// Observation vector length.
    pub observation_len: usize,
    /// Number of discrete action categories (= mask length).
    pub action_categories: usize,
}

/// Declared round-phase shape.
pub const ROUND_SHAPE: PhaseShape = PhaseShape {
    observation_len: ROUND_OBS_LEN,
    action_categories: ROUND_ACTIONS,
};

/// Declared shop-phase shape.
pub const SHOP_SHAPE: PhaseShape = PhaseShape {
    observation_len: SHOP_OBS_LEN,
    action_categories: SHOP_ACTIONS,
};

/// Which layout a policy is asked to act in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionPhase {
    /// Shop layout.
    Shop,
    /// Round layout.
    Round,
}

impl ActionPhase {
    /// Declared shape of this phase.
    pub fn shape(self) -> PhaseShape {
        match self {
            ActionPhase::Shop => SHOP_SHAPE,
            ActionPhase::Round => ROUND_SHAPE,
        }
    }
}

/// The pair of players an encoding is computed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Perspective {
    /// The acting player.
    pub self_id: EntityId,
    /// Its opponent.
    pub other_id: EntityId,
}

impl Perspective {
    /// Perspective of `self_id` against `other_id`.
    pub fn new(self_id: EntityId, other_id: EntityId) -> Self {
        Self { self_id, other_id }
    }

    /// The same pair seen from the opponent's side.
    pub fn flipped(self) -> Self {
        Self {
            self_id: self.other_id,
            other_id: self.self_id,
        }
    }
}
