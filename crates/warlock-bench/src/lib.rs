//! Benchmark fixtures for the Warlock training bridge.
//!
//! - [`crowded_round`]: a two-player round with many projectiles in flight
//! - [`crowded_round_document`]: the same state as a wire document
//! - [`bench_view`]: the perspective of the first player

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warlock_codec::{Perspective, OBSERVED_ABILITIES};
use warlock_core::{EntityId, SimulationState};
use warlock_test_utils::StateBuilder;

/// Entity ID of the observing player.
pub const SELF_ID: u64 = 1000;
/// Entity ID of the opponent.
pub const OTHER_ID: u64 = 1001;

/// Arena radius used by every profile.
pub const ARENA_RADIUS: f64 = 640.0;

fn builder(projectiles: usize, seed: u64) -> StateBuilder {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut b = StateBuilder::round(300)
        .arena_radius(ARENA_RADIUS)
        .player(SELF_ID, -200.0, 0.0)
        .player(OTHER_ID, 200.0, 0.0)
        .health(SELF_ID, 80.0, 100.0)
        .health(OTHER_ID, 55.0, 100.0)
        .velocity(SELF_ID, 30.0, -12.0)
        .facing(OTHER_ID, 2.5);
    for (i, &ability) in OBSERVED_ABILITIES.iter().enumerate() {
        let last_used = (i % 2 == 0).then_some(250 + i as u64 * 10);
        b = b
            .ability(SELF_ID, ability, 3.0, last_used)
            .ability(OTHER_ID, ability, 3.0, None);
    }
    for i in 0..projectiles {
        let owner = if rng.random_bool(0.5) {
            SELF_ID
        } else {
            OTHER_ID
        };
        let x = rng.random_range(-ARENA_RADIUS..ARENA_RADIUS);
        let y = rng.random_range(-ARENA_RADIUS..ARENA_RADIUS);
        b = b.projectile(2000 + i as u64, owner, x, y);
    }
    b
}

/// A round at frame 300 with `projectiles` projectiles placed from `seed`.
///
/// Both players own every observed ability; half of self's are cooling
/// down.
pub fn crowded_round(projectiles: usize, seed: u64) -> SimulationState {
    builder(projectiles, seed).build()
}

/// [`crowded_round`] serialized as the simulation would send it.
pub fn crowded_round_document(projectiles: usize, seed: u64) -> serde_json::Result<String> {
    serde_json::to_string(builder(projectiles, seed).raw())
}

/// Perspective of [`SELF_ID`] against [`OTHER_ID`].
pub fn bench_view() -> Perspective {
    Perspective::new(EntityId(SELF_ID), EntityId(OTHER_ID))
}
