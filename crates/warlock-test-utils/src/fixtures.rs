//! Hand-built simulation states.

use std::collections::BTreeMap;

use warlock_core::wire::{
    RawAbility, RawArena, RawBody, RawGameEvent, RawGameEvents, RawGameState, RawHealth,
    RawPhase, RawPlayer, RawPlayerOwned, RawProjectile, RawShop, RawState, RawUnit, RawUnitState,
};
use warlock_core::{AbilityId, SimulationState, Vec2};

/// Builder over a [`RawState`] document.
///
/// Players get a body, a 100/100 health pool, an idle unit, self
/// ownership, a player record and an empty shop. Everything else is
/// opt-in.
#[derive(Clone, Debug)]
pub struct StateBuilder {
    raw: RawState,
}

impl StateBuilder {
    fn with_phase(frame: u64, state: RawPhase, round: u32) -> Self {
        Self {
            raw: RawState {
                game_state: RawGameState {
                    frame_number: frame,
                    delta_time: 1.0 / 30.0,
                    state,
                    round,
                },
                bodies: BTreeMap::new(),
                healths: BTreeMap::new(),
                abilities: BTreeMap::new(),
                units: BTreeMap::new(),
                player_owneds: BTreeMap::new(),
                projectiles: BTreeMap::new(),
                players: BTreeMap::new(),
                shops: BTreeMap::new(),
                arena: RawArena { radius: 640.0 },
                game_events: RawGameEvents::default(),
            },
        }
    }

    /// Round 1 in progress at `frame`.
    pub fn round(frame: u64) -> Self {
        Self::with_phase(frame, RawPhase::Round { start_frame: 0 }, 1)
    }

    /// Shop open at `frame` before round `round + 1`.
    pub fn shop(frame: u64, round: u32) -> Self {
        Self::with_phase(
            frame,
            RawPhase::Shop {
                start_frame: frame,
                duration: 30.0,
            },
            round,
        )
    }

    pub fn delta_time(mut self, dt: f64) -> Self {
        self.raw.game_state.delta_time = dt;
        self
    }

    pub fn arena_radius(mut self, radius: f64) -> Self {
        self.raw.arena.radius = radius;
        self
    }

    /// Add a player at `(x, y)`.
    pub fn player(mut self, id: u64, x: f64, y: f64) -> Self {
        let key = id.to_string();
        self.raw.bodies.insert(
            key.clone(),
            RawBody {
                location: Vec2::new(x, y),
                velocity: Vec2::ZERO,
                facing: 0.0,
                radius: 30.0,
            },
        );
        self.raw.healths.insert(
            key.clone(),
            RawHealth {
                current: 100.0,
                maximum: 100.0,
            },
        );
        self.raw.units.insert(
            key.clone(),
            RawUnit {
                state: RawUnitState::Idle,
            },
        );
        self.raw.player_owneds.insert(
            key.clone(),
            RawPlayerOwned {
                owning_player_id: id,
            },
        );
        self.raw.players.insert(key.clone(), RawPlayer::default());
        self.raw.shops.insert(
            key,
            RawShop {
                gold: 0.0,
                costs: BTreeMap::new(),
            },
        );
        self
    }

    pub fn health(mut self, id: u64, current: f64, maximum: f64) -> Self {
        self.raw
            .healths
            .insert(id.to_string(), RawHealth { current, maximum });
        self
    }

    pub fn velocity(mut self, id: u64, vx: f64, vy: f64) -> Self {
        if let Some(body) = self.raw.bodies.get_mut(&id.to_string()) {
            body.velocity = Vec2::new(vx, vy);
        }
        self
    }

    pub fn facing(mut self, id: u64, angle: f64) -> Self {
        if let Some(body) = self.raw.bodies.get_mut(&id.to_string()) {
            body.facing = angle;
        }
        self
    }

    pub fn activity(mut self, id: u64, state: RawUnitState) -> Self {
        self.raw.units.insert(id.to_string(), RawUnit { state });
        self
    }

    /// Give `id` an ability with the given cooldown and last use.
    pub fn ability(
        mut self,
        id: u64,
        ability: AbilityId,
        cooldown: f64,
        last_used_frame: Option<u64>,
    ) -> Self {
        self.raw.abilities.entry(id.to_string()).or_default().insert(
            ability.as_str().to_string(),
            RawAbility {
                cooldown,
                last_used_frame,
                cast_time: None,
            },
        );
        self
    }

    pub fn gold(mut self, id: u64, gold: f64) -> Self {
        if let Some(shop) = self.raw.shops.get_mut(&id.to_string()) {
            shop.gold = gold;
        }
        self
    }

    pub fn cost(mut self, id: u64, ability: AbilityId, cost: f64) -> Self {
        if let Some(shop) = self.raw.shops.get_mut(&id.to_string()) {
            shop.costs.insert(ability.as_str().to_string(), cost);
        }
        self
    }

    /// Add a projectile owned by `owner`.
    pub fn projectile(mut self, id: u64, owner: u64, x: f64, y: f64) -> Self {
        let key = id.to_string();
        self.raw.bodies.insert(
            key.clone(),
            RawBody {
                location: Vec2::new(x, y),
                velocity: Vec2::ZERO,
                facing: 0.0,
                radius: 5.0,
            },
        );
        self.raw.player_owneds.insert(
            key.clone(),
            RawPlayerOwned {
                owning_player_id: owner,
            },
        );
        self.raw
            .projectiles
            .insert(key, RawProjectile { damage: 10.0 });
        self
    }

    pub fn event(mut self, event: RawGameEvent) -> Self {
        self.raw.game_events.events.push(event);
        self
    }

    pub fn raw(&self) -> &RawState {
        &self.raw
    }

    /// Decode into a [`SimulationState`].
    ///
    /// # Panics
    ///
    /// If the document violates the schema.
    pub fn build(self) -> SimulationState {
        SimulationState::from_raw(&self.raw).expect("fixture violates state schema")
    }
}
