//! Teleport cooldown: used at frame 100 with an 8 s cooldown at 30 fps.

use warlock_codec::{cooldown_fraction, encode_action_mask, encode_observation, Perspective};
use warlock_core::{AbilityId, EntityId, SimulationState};
use warlock_test_utils::StateBuilder;

const TELEPORT_SLOT: usize = 1;

fn at_frame(frame: u64) -> SimulationState {
    StateBuilder::round(frame)
        .player(1000, 0.0, 0.0)
        .player(1001, 200.0, 0.0)
        .ability(1000, AbilityId::Teleport, 8.0, Some(100))
        .build()
}

#[test]
fn on_cooldown_at_frame_105() {
    let state = at_frame(105);
    let remaining = state
        .cooldown_remaining(EntityId(1000), AbilityId::Teleport)
        .unwrap();
    assert!((remaining - 7.833_333).abs() < 1e-5, "remaining {remaining}");

    let mask = encode_action_mask(&state, EntityId(1000)).unwrap();
    assert!(!mask.is_legal(3 + TELEPORT_SLOT));

    let fraction = cooldown_fraction(&state, EntityId(1000), AbilityId::Teleport);
    assert!((fraction - 7.833_333 / 8.0).abs() < 1e-5);
    let obs = encode_observation(&state, Perspective::new(EntityId(1000), EntityId(1001))).unwrap();
    assert_eq!(obs.as_slice()[23 + TELEPORT_SLOT], fraction as f32);
}

#[test]
fn ready_at_frame_340() {
    let state = at_frame(340);
    assert_eq!(
        state.cooldown_remaining(EntityId(1000), AbilityId::Teleport),
        Some(0.0)
    );
    let mask = encode_action_mask(&state, EntityId(1000)).unwrap();
    assert!(mask.is_legal(3 + TELEPORT_SLOT));
    assert_eq!(cooldown_fraction(&state, EntityId(1000), AbilityId::Teleport), 0.0);
}

#[test]
fn never_used_and_unowned() {
    let state = at_frame(105);
    assert_eq!(cooldown_fraction(&state, EntityId(1000), AbilityId::Swap), 1.0);
    let fresh = StateBuilder::round(0)
        .player(1000, 0.0, 0.0)
        .ability(1000, AbilityId::Shoot, 3.0, None)
        .build();
    assert_eq!(cooldown_fraction(&fresh, EntityId(1000), AbilityId::Shoot), 0.0);
}
