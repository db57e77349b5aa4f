//! The decoded, immutable simulation snapshot.
//!
//! [`SimulationState`] is a fixed structured record built from one
//! [`RawState`] document. All component maps are folded into one
//! [`Entity`] per ID and stored in ordered maps, so iteration order is
//! deterministic and independent of the JSON key order.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::ability::AbilityId;
use crate::command::Order;
use crate::error::SchemaError;
use crate::id::EntityId;
use crate::vec2::Vec2;
use crate::wire::{RawEntityRef, RawGameEvent, RawPhase, RawState, RawUnitState};

/// High-level phase. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    /// Purchase phase.
    Shop {
        /// Shop duration in seconds.
        duration: f64,
    },
    /// Combat phase.
    Round,
}

impl Phase {
    /// Whether this is the shop phase.
    pub fn is_shop(&self) -> bool {
        matches!(self, Phase::Shop { .. })
    }

    /// Whether this is the round phase.
    pub fn is_round(&self) -> bool {
        matches!(self, Phase::Round)
    }
}

/// Health pool, with `current` clamped to `[0, maximum]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Health {
    /// Current health.
    pub current: f64,
    /// Maximum health.
    pub maximum: f64,
}

impl Health {
    /// `current / maximum`, or 0 when the maximum is 0.
    pub fn fraction(&self) -> f64 {
        if self.maximum > 0.0 {
            self.current / self.maximum
        } else {
            0.0
        }
    }
}

/// Cooldown bookkeeping for one owned ability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbilityRecord {
    /// Frame of last use, `None` if never used.
    pub last_used_frame: Option<u64>,
    /// Cooldown in seconds.
    pub cooldown: f64,
    /// Cast time in seconds.
    pub cast_time: Option<f64>,
}

/// What a unit is currently doing.
#[derive(Clone, Debug, PartialEq)]
pub enum UnitActivity {
    /// Standing still.
    Idle,
    /// Walking to `target`.
    Moving {
        /// Destination.
        target: Vec2,
    },
    /// Casting an ability.
    Casting {
        /// Order being executed.
        order: Order,
        /// Frame the cast started.
        start_frame: u64,
    },
}

/// Per-entity fields folded from every component map.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Stable entity ID.
    pub id: EntityId,
    /// Position in world units.
    pub location: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Facing angle in radians.
    pub facing: f64,
    /// Health pool, if the entity has one.
    pub health: Option<Health>,
    /// Owned abilities. Absent key means not owned.
    pub abilities: BTreeMap<AbilityId, AbilityRecord>,
    /// Unit activity, if the entity is a unit.
    pub activity: Option<UnitActivity>,
    /// Owning player, if any.
    pub owner: Option<EntityId>,
    /// Whether the entity is a projectile.
    pub is_projectile: bool,
}

impl Entity {
    fn empty(id: EntityId) -> Self {
        Self {
            id,
            location: Vec2::ZERO,
            velocity: Vec2::ZERO,
            facing: 0.0,
            health: None,
            abilities: BTreeMap::new(),
            activity: None,
            owner: None,
            is_projectile: false,
        }
    }

    /// Whether the entity owns `ability`.
    pub fn owns(&self, ability: AbilityId) -> bool {
        self.abilities.contains_key(&ability)
    }
}

/// Per-player shop and readiness state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerInfo {
    /// Ready to leave the shop.
    pub ready: bool,
    /// Available gold.
    pub gold: f64,
    /// Prices of abilities currently for sale.
    pub costs: BTreeMap<AbilityId, f64>,
}

/// Discrete event reported by the simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// `entity` finished casting `ability`.
    AbilityUsed {
        /// Caster.
        entity: EntityId,
        /// Ability cast.
        ability: AbilityId,
    },
    /// A round ended with the given surviving players.
    RoundOver {
        /// Surviving players; empty on a draw.
        winners: Vec<EntityId>,
    },
}

/// Immutable snapshot of the simulation after one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    /// Frames advanced since start.
    pub frame: u64,
    /// Seconds per frame.
    pub delta_time: f64,
    /// Active phase.
    pub phase: Phase,
    /// Frame the active phase began.
    pub phase_start_frame: u64,
    /// Number of rounds started so far.
    pub round: u32,
    /// Radius of the safe arena area.
    pub arena_radius: f64,
    /// All entities by ID.
    pub entities: BTreeMap<EntityId, Entity>,
    /// Player bookkeeping by player entity ID.
    pub players: BTreeMap<EntityId, PlayerInfo>,
    /// Events emitted by the frames this snapshot covers, in order.
    pub events: SmallVec<[GameEvent; 2]>,
}

fn parse_key(component: &'static str, key: &str) -> Result<EntityId, SchemaError> {
    key.parse().map_err(|_| SchemaError::InvalidEntityKey {
        component,
        key: key.to_string(),
    })
}

fn check_finite(field: impl FnOnce() -> String, value: f64) -> Result<f64, SchemaError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SchemaError::NonFinite { field: field() })
    }
}

fn check_vec(field: impl FnOnce() -> String, value: Vec2) -> Result<Vec2, SchemaError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SchemaError::NonFinite { field: field() })
    }
}

impl SimulationState {
    /// Decode a wire document into the typed record.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when a key is not a numeric entity ID, an
    /// ability name is outside the catalog, a number is non-finite, or a
    /// health maximum is negative.
    pub fn from_raw(raw: &RawState) -> Result<Self, SchemaError> {
        let gs = &raw.game_state;
        if !(gs.delta_time.is_finite() && gs.delta_time > 0.0) {
            return Err(SchemaError::InvalidDeltaTime {
                value: gs.delta_time,
            });
        }
        let (phase, phase_start_frame) = match &gs.state {
            RawPhase::Shop {
                start_frame,
                duration,
            } => (
                Phase::Shop {
                    duration: check_finite(|| "gameState.state.duration".into(), *duration)?,
                },
                *start_frame,
            ),
            RawPhase::Round { start_frame } => (Phase::Round, *start_frame),
        };

        let mut entities: BTreeMap<EntityId, Entity> = BTreeMap::new();

        for (key, body) in &raw.bodies {
            let id = parse_key("bodies", key)?;
            let entity = entities.entry(id).or_insert_with(|| Entity::empty(id));
            entity.location = check_vec(|| format!("bodies.{key}.location"), body.location)?;
            entity.velocity = check_vec(|| format!("bodies.{key}.velocity"), body.velocity)?;
            entity.facing = check_finite(|| format!("bodies.{key}.facing"), body.facing)?;
        }

        for (key, health) in &raw.healths {
            let id = parse_key("healths", key)?;
            if !(health.maximum.is_finite() && health.maximum >= 0.0) {
                return Err(SchemaError::InvalidHealth {
                    entity: id.0,
                    maximum: health.maximum,
                });
            }
            let current = check_finite(|| format!("healths.{key}.current"), health.current)?;
            let entity = entities.entry(id).or_insert_with(|| Entity::empty(id));
            entity.health = Some(Health {
                current: current.clamp(0.0, health.maximum),
                maximum: health.maximum,
            });
        }

        for (key, unit) in &raw.units {
            let id = parse_key("units", key)?;
            let activity = match &unit.state {
                RawUnitState::Idle => UnitActivity::Idle,
                RawUnitState::Moving { target } => UnitActivity::Moving { target: *target },
                RawUnitState::Casting {
                    cast_order,
                    start_frame,
                } => UnitActivity::Casting {
                    order: cast_order.clone(),
                    start_frame: *start_frame,
                },
            };
            entities
                .entry(id)
                .or_insert_with(|| Entity::empty(id))
                .activity = Some(activity);
        }

        for (key, owned) in &raw.abilities {
            let id = parse_key("abilities", key)?;
            let mut records = BTreeMap::new();
            for (name, ability) in owned {
                let ability_id: AbilityId = name.parse()?;
                records.insert(
                    ability_id,
                    AbilityRecord {
                        last_used_frame: ability.last_used_frame,
                        cooldown: check_finite(
                            || format!("abilities.{key}.{name}.cooldown"),
                            ability.cooldown,
                        )?,
                        cast_time: ability.cast_time,
                    },
                );
            }
            // Ability sets of entities without a body/health/unit are
            // dropped: nothing can observe or cast them.
            if let Some(entity) = entities.get_mut(&id) {
                entity.abilities = records;
            }
        }

        for (key, owned) in &raw.player_owneds {
            let id = parse_key("playerOwneds", key)?;
            if let Some(entity) = entities.get_mut(&id) {
                entity.owner = Some(EntityId(owned.owning_player_id));
            }
        }

        for key in raw.projectiles.keys() {
            let id = parse_key("projectiles", key)?;
            if let Some(entity) = entities.get_mut(&id) {
                entity.is_projectile = true;
            }
        }

        let mut players: BTreeMap<EntityId, PlayerInfo> = BTreeMap::new();
        for (key, player) in &raw.players {
            let id = parse_key("players", key)?;
            players.entry(id).or_default().ready = player.ready;
        }
        for (key, shop) in &raw.shops {
            let id = parse_key("shops", key)?;
            let info = players.entry(id).or_default();
            info.gold = check_finite(|| format!("shops.{key}.gold"), shop.gold)?;
            for (name, cost) in &shop.costs {
                let ability: AbilityId = name.parse()?;
                info.costs.insert(
                    ability,
                    check_finite(|| format!("shops.{key}.costs.{name}"), *cost)?,
                );
            }
        }

        let mut events = SmallVec::new();
        for event in &raw.game_events.events {
            match event {
                RawGameEvent::AbilityUsed {
                    entity_id,
                    ability_id,
                } => {
                    let entity = match entity_id {
                        RawEntityRef::Number(n) => EntityId(*n),
                        RawEntityRef::Text(s) => parse_key("gameEvents", s)?,
                    };
                    events.push(GameEvent::AbilityUsed {
                        entity,
                        ability: ability_id.parse()?,
                    });
                }
                RawGameEvent::RoundOver { winners } => events.push(GameEvent::RoundOver {
                    winners: winners.iter().copied().map(EntityId).collect(),
                }),
                RawGameEvent::Other => {}
            }
        }

        Ok(Self {
            frame: gs.frame_number,
            delta_time: gs.delta_time,
            phase,
            phase_start_frame,
            round: gs.round,
            arena_radius: check_finite(|| "arena.radius".into(), raw.arena.radius)?,
            entities,
            players,
            events,
        })
    }

    /// Simulation time in seconds (`frame * delta_time`).
    pub fn time(&self) -> f64 {
        self.frame as f64 * self.delta_time
    }

    /// Look up an entity.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Player entity IDs in ascending order.
    ///
    /// Players are the keys of the `players` component; when a document
    /// carries no player component, every unit that owns itself counts.
    pub fn player_ids(&self) -> Vec<EntityId> {
        if !self.players.is_empty() {
            return self.players.keys().copied().collect();
        }
        self.entities
            .values()
            .filter(|e| e.activity.is_some() && e.owner == Some(e.id))
            .map(|e| e.id)
            .collect()
    }

    /// Current health of an entity, 0 if it has no health pool.
    pub fn health_of(&self, id: EntityId) -> f64 {
        self.entity(id)
            .and_then(|e| e.health)
            .map(|h| h.current)
            .unwrap_or(0.0)
    }

    /// Iterate projectiles in ID order.
    pub fn projectiles(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.is_projectile)
    }

    /// Seconds until `ability` is ready for `entity`.
    ///
    /// `None` when the entity does not own the ability; `Some(0.0)` when
    /// it is ready or has never been used. Computed as
    /// `last_used * dt + cooldown - frame * dt`, floored at zero, which
    /// matches the simulation's own readiness test exactly.
    pub fn cooldown_remaining(&self, entity: EntityId, ability: AbilityId) -> Option<f64> {
        let record = self.entity(entity)?.abilities.get(&ability)?;
        let remaining = match record.last_used_frame {
            None => 0.0,
            Some(last) => {
                let available_at = last as f64 * self.delta_time + record.cooldown;
                (available_at - self.time()).max(0.0)
            }
        };
        Some(remaining)
    }

    /// Whether `entity` owns `ability` and it is off cooldown.
    pub fn ability_ready(&self, entity: EntityId, ability: AbilityId) -> bool {
        self.cooldown_remaining(entity, ability) == Some(0.0)
    }
}
