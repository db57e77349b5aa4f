//! Action-validity masks.

use warlock_core::{EntityId, SimulationState};

use crate::error::CodecError;
use crate::layout::{OBSERVED_ABILITIES, ROUND_ACTIONS, SHOP_ACTIONS};

/// Legal action categories, one byte per category (1 = legal).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionMask(Vec<u8>);

impl ActionMask {
    /// The mask bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mask has no categories.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `category` is legal. Out-of-range categories are not.
    pub fn is_legal(&self, category: usize) -> bool {
        self.0.get(category) == Some(&1)
    }

    /// Indices of all legal categories, ascending.
    pub fn legal(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &m)| m == 1)
            .map(|(i, _)| i)
    }
}

/// Round mask: `[no-op, stop, move, use(ability) × 6]`.
///
/// The first three are always legal. An ability is legal iff `entity`
/// owns it and its remaining cooldown is exactly zero.
///
/// # Errors
///
/// [`CodecError::MissingEntity`] if `entity` is absent.
pub fn encode_action_mask(
    state: &SimulationState,
    entity: EntityId,
) -> Result<ActionMask, CodecError> {
    if state.entity(entity).is_none() {
        return Err(CodecError::MissingEntity { entity });
    }
    let mut mask: Vec<u8> = Vec::with_capacity(ROUND_ACTIONS);
    mask.extend([1, 1, 1]);
    mask.extend(
        OBSERVED_ABILITIES
            .iter()
            .map(|&a| u8::from(state.ability_ready(entity, a))),
    );
    Ok(ActionMask(mask))
}

/// Shop mask: `[no-op, ready, buy(ability) × 6]`.
///
/// No-op and ready are always legal. A purchase is legal iff the ability
/// is not owned, is for sale, and its cost does not exceed the gold.
///
/// # Errors
///
/// [`CodecError::MissingEntity`] / [`CodecError::MissingShop`].
pub fn encode_shop_action_mask(
    state: &SimulationState,
    entity: EntityId,
) -> Result<ActionMask, CodecError> {
    let me = state
        .entity(entity)
        .ok_or(CodecError::MissingEntity { entity })?;
    let shop = state
        .players
        .get(&entity)
        .ok_or(CodecError::MissingShop { entity })?;
    let mut mask: Vec<u8> = Vec::with_capacity(SHOP_ACTIONS);
    mask.extend([1, 1]);
    mask.extend(OBSERVED_ABILITIES.iter().map(|&a| {
        let affordable = shop.costs.get(&a).is_some_and(|&c| c <= shop.gold);
        u8::from(affordable && !me.owns(a))
    }));
    Ok(ActionMask(mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use warlock_core::RawState;

    fn teleport_state(frame: u64) -> SimulationState {
        let doc = format!(
            r#"{{
            "gameState": {{"frameNumber": {frame}, "deltaTime": 0.03333333333333333,
                          "state": {{"type": "round", "startFrame": 0}}}},
            "bodies": {{"7": {{"location": {{"e1": 0, "e2": 0}}}}}},
            "healths": {{"7": {{"current": 100, "maximum": 100}}}},
            "abilities": {{"7": {{
                "teleport": {{"cooldown": 8, "lastUsedFrame": 100}},
                "shoot": {{"cooldown": 3}}
            }}}},
            "arena": {{"radius": 600}}
        }}"#
        );
        let raw: RawState = serde_json::from_str(&doc).unwrap();
        SimulationState::from_raw(&raw).unwrap()
    }

    #[test]
    fn teleport_on_cooldown_at_frame_105() {
        let mask = encode_action_mask(&teleport_state(105), EntityId(7)).unwrap();
        assert_eq!(mask.as_slice(), &[1, 1, 1, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn teleport_ready_at_frame_340() {
        let mask = encode_action_mask(&teleport_state(340), EntityId(7)).unwrap();
        assert!(mask.is_legal(4));
        assert_eq!(mask.legal().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn out_of_range_category_is_illegal() {
        let mask = encode_action_mask(&teleport_state(340), EntityId(7)).unwrap();
        assert!(!mask.is_legal(ROUND_ACTIONS));
    }
}
