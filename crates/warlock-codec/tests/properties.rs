//! Property tests for the codec: bounds, fixed length, determinism, and
//! action decode round-trips.

use proptest::prelude::*;

use warlock_codec::{
    decode_order, encode_action_mask, encode_observation, encode_shop_action_mask,
    encode_shop_observation, normalize_position, Action, Observation, Perspective, TargetMode,
    OBSERVED_ABILITIES, PAD_VALUE, PROJECTILE_FEATURES, ROUND_ACTIONS, ROUND_OBS_LEN,
    SHOP_ACTIONS, SHOP_OBS_LEN, WORLD_SCALE,
};
use warlock_core::wire::RawUnitState;
use warlock_core::{EntityId, Order, SimulationState, Vec2};
use warlock_test_utils::StateBuilder;

const ME: u64 = 1000;
const THEM: u64 = 1001;

fn view() -> Perspective {
    Perspective::new(EntityId(ME), EntityId(THEM))
}

prop_compose! {
    fn arb_state()(
        frame in 0u64..10_000,
        me in (-5000.0f64..5000.0, -5000.0f64..5000.0),
        them in (-5000.0f64..5000.0, -5000.0f64..5000.0),
        vel in (-3000.0f64..3000.0, -3000.0f64..3000.0),
        facing in -10.0f64..10.0,
        health in (0.0f64..150.0, 0.0f64..150.0),
        last_used in proptest::option::of(0u64..10_000),
        cooldown in 0.0f64..20.0,
        projectiles in proptest::collection::vec(
            (-4000.0f64..4000.0, -4000.0f64..4000.0, any::<bool>()),
            0..9,
        ),
        arena in 0.0f64..5000.0,
        moving in any::<bool>(),
    ) -> SimulationState {
        let last_used = last_used.map(|l| l.min(frame));
        let mut b = StateBuilder::round(frame)
            .arena_radius(arena)
            .player(ME, me.0, me.1)
            .player(THEM, them.0, them.1)
            .health(ME, health.0, 100.0)
            .health(THEM, health.1, 100.0)
            .velocity(ME, vel.0, vel.1)
            .facing(THEM, facing)
            .ability(ME, OBSERVED_ABILITIES[1], cooldown, last_used)
            .ability(THEM, OBSERVED_ABILITIES[0], cooldown, last_used);
        if moving {
            b = b.activity(ME, RawUnitState::Moving { target: Vec2::new(1.0, 2.0) });
        }
        for (i, (x, y, mine)) in projectiles.into_iter().enumerate() {
            b = b.projectile(2000 + i as u64, if mine { ME } else { THEM }, x, y);
        }
        b.build()
    }
}

proptest! {
    #[test]
    fn round_observation_bounded_and_fixed(state in arb_state()) {
        let obs = encode_observation(&state, view()).unwrap();
        prop_assert_eq!(obs.len(), ROUND_OBS_LEN);
        for &v in obs.as_slice() {
            prop_assert!((0.0..=1.0).contains(&v), "value {} out of range", v);
        }
    }

    #[test]
    fn encoding_is_deterministic(state in arb_state()) {
        let a = encode_observation(&state, view()).unwrap();
        let b = encode_observation(&state.clone(), view()).unwrap();
        let bits = |o: &Observation| {
            o.as_slice().iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        };
        prop_assert_eq!(bits(&a), bits(&b));
        prop_assert_eq!(
            encode_action_mask(&state, EntityId(ME)).unwrap(),
            encode_action_mask(&state, EntityId(ME)).unwrap()
        );
    }

    #[test]
    fn mask_matches_cooldown_rule(state in arb_state()) {
        let mask = encode_action_mask(&state, EntityId(ME)).unwrap();
        prop_assert_eq!(mask.len(), ROUND_ACTIONS);
        prop_assert!(mask.is_legal(0) && mask.is_legal(1) && mask.is_legal(2));
        for (i, ability) in OBSERVED_ABILITIES.iter().enumerate() {
            let entity = state.entity(EntityId(ME)).unwrap();
            let expected = match entity.abilities.get(ability) {
                None => false,
                Some(record) => match record.last_used_frame {
                    None => true,
                    Some(last) => {
                        state.frame as f64 * state.delta_time
                            >= last as f64 * state.delta_time + record.cooldown
                    }
                },
            };
            prop_assert_eq!(mask.is_legal(3 + i), expected);
        }
    }

    #[test]
    fn shop_encoding_bounded(state in arb_state(), gold in 0.0f64..500.0) {
        let mut state = state;
        if let Some(p) = state.players.get_mut(&EntityId(ME)) {
            p.gold = gold;
        }
        let obs = encode_shop_observation(&state, view()).unwrap();
        prop_assert_eq!(obs.len(), SHOP_OBS_LEN);
        prop_assert!(obs.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
        prop_assert_eq!(encode_shop_action_mask(&state, EntityId(ME)).unwrap().len(), SHOP_ACTIONS);
    }

    #[test]
    fn move_target_round_trips(x in -900.0f64..900.0, y in -900.0f64..900.0) {
        let state = StateBuilder::round(1).player(ME, 0.0, 0.0).player(THEM, 10.0, 10.0).build();
        let action = Action::targeted(
            2,
            [normalize_position(x) as f32, normalize_position(y) as f32],
        );
        let decoded = decode_order(&state, view(), &action, TargetMode::Absolute);
        let Some(Order::Move { target }) = decoded else {
            panic!("move did not decode: {decoded:?}");
        };
        // f32 quantization of the normalized value bounds the error.
        let tolerance = WORLD_SCALE * f64::from(f32::EPSILON);
        prop_assert!((target.x - x).abs() <= tolerance);
        prop_assert!((target.y - y).abs() <= tolerance);
    }
}

#[test]
fn nearest_projectiles_fill_slots_in_distance_order() {
    let state = StateBuilder::round(5)
        .player(ME, 0.0, 0.0)
        .player(THEM, 500.0, 0.0)
        .projectile(2000, THEM, 400.0, 0.0)
        .projectile(2001, ME, 100.0, 0.0)
        .build();
    let obs = encode_observation(&state, view()).unwrap();
    let tail = &obs.as_slice()[ROUND_OBS_LEN - 5 * PROJECTILE_FEATURES..];

    // Slot 0: own projectile at distance 100.
    assert_eq!(tail[0], (100.0 / WORLD_SCALE + 0.5) as f32);
    assert_eq!(tail[4], (100.0 / WORLD_SCALE) as f32);
    assert_eq!(tail[5], 0.0);
    // Slot 1: enemy projectile at distance 400.
    assert_eq!(tail[6], (400.0 / WORLD_SCALE + 0.5) as f32);
    assert_eq!(tail[11], 1.0);
    // Remaining slots padded.
    assert!(tail[12..].iter().all(|&v| v == PAD_VALUE));
}

#[test]
fn unit_state_one_hot() {
    let state = StateBuilder::round(5)
        .player(ME, 0.0, 0.0)
        .player(THEM, 0.0, 0.0)
        .activity(ME, RawUnitState::Moving { target: Vec2::new(1.0, 1.0) })
        .build();
    let obs = encode_observation(&state, view()).unwrap();
    assert_eq!(&obs.as_slice()[16..22], &[0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn shop_mask_excludes_owned_and_unaffordable() {
    let state = StateBuilder::shop(200, 1)
        .player(ME, 0.0, 0.0)
        .player(THEM, 0.0, 0.0)
        .ability(ME, OBSERVED_ABILITIES[0], 3.0, None)
        .gold(ME, 10.0)
        .cost(ME, OBSERVED_ABILITIES[0], 1.0)
        .cost(ME, OBSERVED_ABILITIES[1], 10.0)
        .cost(ME, OBSERVED_ABILITIES[3], 11.0)
        .build();
    let mask = encode_shop_action_mask(&state, EntityId(ME)).unwrap();
    assert_eq!(mask.as_slice(), &[1, 1, 0, 1, 0, 0, 0, 0]);
}
