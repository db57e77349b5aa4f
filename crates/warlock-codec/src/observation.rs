//! Observation encoding for both phases.

use std::cmp::Ordering;

use smallvec::SmallVec;

use warlock_core::{AbilityId, Entity, EntityId, SimulationState, UnitActivity, Vec2};

use crate::error::CodecError;
use crate::layout::{
    Perspective, GOLD_SCALE, MAX_ROUNDS_SCALE, OBSERVED_ABILITIES, PAD_VALUE, PROJECTILE_FEATURES,
    PROJECTILE_SLOTS, ROUND_OBS_LEN, SHOP_OBS_LEN, WORLD_SCALE,
};

/// A fixed-length observation vector with every value in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation(Vec<f32>);

impl Observation {
    /// The values.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Vector length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take ownership of the values.
    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }
}

impl AsRef<[f32]> for Observation {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Appends values clamped to the unit interval.
struct Writer {
    out: Vec<f32>,
}

impl Writer {
    fn with_capacity(len: usize) -> Self {
        Self {
            out: Vec::with_capacity(len),
        }
    }

    fn push(&mut self, value: f64) {
        self.out.push(value.clamp(0.0, 1.0) as f32);
    }

    fn flag(&mut self, on: bool) {
        self.out.push(if on { 1.0 } else { 0.0 });
    }

    fn finish(self, expected: usize) -> Observation {
        debug_assert_eq!(self.out.len(), expected);
        Observation(self.out)
    }
}

/// Map one world coordinate to `[0, 1]` (before clamping).
pub fn normalize_position(coordinate: f64) -> f64 {
    coordinate / WORLD_SCALE + 0.5
}

/// Inverse of [`normalize_position`].
pub fn denormalize_position(normalized: f64) -> f64 {
    (normalized - 0.5) * WORLD_SCALE
}

/// Remaining cooldown of `ability` as a fraction of its full cooldown.
///
/// 1.0 when the entity does not own the ability, 0.0 when it is ready or
/// has never been used.
pub fn cooldown_fraction(state: &SimulationState, entity: EntityId, ability: AbilityId) -> f64 {
    let Some(remaining) = state.cooldown_remaining(entity, ability) else {
        return 1.0;
    };
    let cooldown = state
        .entity(entity)
        .and_then(|e| e.abilities.get(&ability))
        .map_or(0.0, |r| r.cooldown);
    if cooldown > 0.0 {
        (remaining / cooldown).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn lookup(state: &SimulationState, id: EntityId) -> Result<&Entity, CodecError> {
    state
        .entity(id)
        .ok_or(CodecError::MissingEntity { entity: id })
}

fn health_fraction(entity: &Entity) -> f64 {
    entity.health.map_or(0.0, |h| h.fraction())
}

fn push_position(w: &mut Writer, p: Vec2) {
    w.push(normalize_position(p.x));
    w.push(normalize_position(p.y));
}

fn push_facing(w: &mut Writer, angle: f64) {
    w.push((angle.cos() + 1.0) / 2.0);
    w.push((angle.sin() + 1.0) / 2.0);
}

fn push_activity(w: &mut Writer, activity: Option<&UnitActivity>) {
    w.flag(matches!(activity, Some(UnitActivity::Idle)));
    w.flag(matches!(activity, Some(UnitActivity::Moving { .. })));
    w.flag(matches!(activity, Some(UnitActivity::Casting { .. })));
}

/// Encode the round observation of `view.self_id` against `view.other_id`.
///
/// Layout, in order: health (self, other); position (self, other);
/// other relative to self; facing `(cos, sin)` (self, other); velocity
/// (self, other); unit state one-hot idle/moving/casting (self, other);
/// arena radius; cooldown fractions for [`OBSERVED_ABILITIES`] (self,
/// then other); the [`PROJECTILE_SLOTS`] projectiles nearest to self as
/// `(x, y, dx, dy, distance, enemy)`, padded with [`PAD_VALUE`].
///
/// # Errors
///
/// [`CodecError::MissingEntity`] if either player is absent.
pub fn encode_observation(
    state: &SimulationState,
    view: Perspective,
) -> Result<Observation, CodecError> {
    let me = lookup(state, view.self_id)?;
    let other = lookup(state, view.other_id)?;
    let mut w = Writer::with_capacity(ROUND_OBS_LEN);

    w.push(health_fraction(me));
    w.push(health_fraction(other));

    push_position(&mut w, me.location);
    push_position(&mut w, other.location);
    push_position(&mut w, other.location - me.location);

    push_facing(&mut w, me.facing);
    push_facing(&mut w, other.facing);

    push_position(&mut w, me.velocity);
    push_position(&mut w, other.velocity);

    push_activity(&mut w, me.activity.as_ref());
    push_activity(&mut w, other.activity.as_ref());

    w.push(state.arena_radius / WORLD_SCALE);

    for id in [view.self_id, view.other_id] {
        for ability in OBSERVED_ABILITIES {
            w.push(cooldown_fraction(state, id, ability));
        }
    }

    let mut nearest: SmallVec<[(f64, &Entity); 8]> = state
        .projectiles()
        .map(|p| (p.location.distance(me.location), p))
        .collect();
    // Ties broken by entity ID so the order never depends on float noise.
    nearest.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(Ordering::Equal)
            .then(a.1.id.cmp(&b.1.id))
    });
    for slot in 0..PROJECTILE_SLOTS {
        match nearest.get(slot) {
            Some(&(distance, projectile)) => {
                push_position(&mut w, projectile.location);
                push_position(&mut w, projectile.location - me.location);
                w.push(distance / WORLD_SCALE);
                w.flag(projectile.owner != Some(view.self_id));
            }
            None => {
                for _ in 0..PROJECTILE_FEATURES {
                    w.out.push(PAD_VALUE);
                }
            }
        }
    }

    Ok(w.finish(ROUND_OBS_LEN))
}

/// Encode the shop observation of `view.self_id`.
///
/// Layout: gold over [`GOLD_SCALE`]; round over [`MAX_ROUNDS_SCALE`];
/// then per observed ability `(owned, cost, affordable, other owned)`.
/// Abilities not for sale encode a cost of 1.0 and are never
/// affordable.
///
/// # Errors
///
/// [`CodecError::MissingEntity`] if either player is absent,
/// [`CodecError::MissingShop`] if self has no shop record.
pub fn encode_shop_observation(
    state: &SimulationState,
    view: Perspective,
) -> Result<Observation, CodecError> {
    let me = lookup(state, view.self_id)?;
    let other = lookup(state, view.other_id)?;
    let shop = state
        .players
        .get(&view.self_id)
        .ok_or(CodecError::MissingShop {
            entity: view.self_id,
        })?;
    let mut w = Writer::with_capacity(SHOP_OBS_LEN);

    w.push(shop.gold / GOLD_SCALE);
    w.push(f64::from(state.round) / MAX_ROUNDS_SCALE);

    for ability in OBSERVED_ABILITIES {
        let cost = shop.costs.get(&ability).copied();
        w.flag(me.owns(ability));
        w.push(cost.map_or(1.0, |c| c / GOLD_SCALE));
        w.flag(cost.is_some_and(|c| c <= shop.gold));
        w.flag(other.owns(ability));
    }

    Ok(w.finish(SHOP_OBS_LEN))
}
