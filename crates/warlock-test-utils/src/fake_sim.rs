//! An in-process stand-in for the simulation process.
//!
//! Implements the same line protocol and the same phase rules (shop
//! until everyone is ready or time runs out, round until at most one
//! player is alive, full reset in between) with deliberately crude
//! physics. Damage can be scheduled per frame so reward and
//! termination scenarios are exact, and faults can be injected into
//! any `getComponents` response.

use std::collections::{BTreeMap, VecDeque};
use std::io::{self, BufRead};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warlock_core::wire::{
    RawAbility, RawArena, RawBody, RawEntityRef, RawGameEvent, RawGameEvents, RawGameState,
    RawHealth, RawPhase, RawPlayer, RawPlayerOwned, RawProjectile, RawShop, RawState, RawUnit,
    RawUnitState,
};
use warlock_core::{AbilityId, Command, EntityId, Order, Vec2};
use warlock_link::Transport;

/// Entity ID of the first player; later players count up from here.
pub const FIRST_PLAYER_ID: u64 = 1000;

const PLAYER_RADIUS: f64 = 30.0;
const PROJECTILE_SPEED: f64 = 500.0;
const PROJECTILE_LIFETIME: u32 = 60;
const SCOURGE_RADIUS: f64 = 200.0;

/// `(cooldown seconds, cast time seconds)` of an ability.
pub fn ability_defaults(ability: AbilityId) -> (f64, Option<f64>) {
    match ability {
        AbilityId::Shoot => (3.0, Some(0.2)),
        AbilityId::Teleport => (16.0, None),
        AbilityId::Swap => (15.8, None),
        AbilityId::Homing => (15.0, Some(0.2)),
        AbilityId::Scourge => (3.0, Some(0.9)),
        AbilityId::Shield => (14.0, None),
        _ => (10.0, None),
    }
}

/// Rules of the fake game.
#[derive(Clone, Debug)]
pub struct FakeConfig {
    /// Seconds per frame when `start` does not set one.
    pub delta_time: f64,
    /// Shop duration in seconds.
    pub shop_time: f64,
    /// Gold in the first shop when `start` does not set it.
    pub start_gold: f64,
    /// Gold added to every shop after each round.
    pub gold_per_round: f64,
    /// Arena radius.
    pub arena_radius: f64,
    /// Player maximum health.
    pub max_health: f64,
    /// Walking speed in world units per second.
    pub move_speed: f64,
    /// Damage of shoot/homing projectiles.
    pub projectile_damage: f64,
    /// Damage scourge deals to nearby enemies.
    pub scourge_damage: f64,
    /// Abilities every player starts with.
    pub starting_abilities: Vec<AbilityId>,
    /// Shop prices.
    pub costs: BTreeMap<AbilityId, f64>,
    /// Health changes applied at fixed frames.
    pub damage: Vec<ScheduledDamage>,
    /// Injected response fault.
    pub fault: Option<Fault>,
}

impl Default for FakeConfig {
    fn default() -> Self {
        let costs = [
            (AbilityId::Teleport, 5.0),
            (AbilityId::Swap, 5.0),
            (AbilityId::Homing, 8.0),
            (AbilityId::Scourge, 6.0),
            (AbilityId::Shield, 6.0),
        ]
        .into_iter()
        .collect();
        Self {
            delta_time: 1.0 / 30.0,
            shop_time: 30.0,
            start_gold: 10.0,
            gold_per_round: 10.0,
            arena_radius: 640.0,
            max_health: 100.0,
            move_speed: 210.0,
            projectile_damage: 10.0,
            scourge_damage: 20.0,
            starting_abilities: vec![AbilityId::Shoot],
            costs,
            damage: Vec::new(),
            fault: None,
        }
    }
}

/// Damage to one player applied when the game reaches `frame`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledDamage {
    /// Frame at which the damage lands, during a round only.
    pub frame: u64,
    /// Index of the player (0-based, in spawn order).
    pub player: usize,
    /// Health removed; negative values heal.
    pub amount: f64,
}

/// What goes wrong with an injected response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// The process dies without writing anything.
    Exit,
    /// Half a document is written, then the process dies.
    Truncate,
    /// Non-JSON bytes are written.
    Garbage,
    /// A document larger than any sane response limit.
    Oversize,
    /// Valid JSON that does not fit the state schema.
    SchemaViolation,
    /// A valid state whose frame number is lower than the last one.
    FrameRegression,
}

/// Fault injected into the `on_query`-th `getComponents` (0-based,
/// counted over the fake's whole lifetime).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fault {
    /// Query index that fails.
    pub on_query: usize,
    /// Failure mode.
    pub kind: FaultKind,
}

// ── Shared log ──────────────────────────────────────────────────

#[derive(Debug, Default)]
struct FakeLog {
    commands: Vec<Command>,
    applied_orders: Vec<(u64, EntityId, Order)>,
    shutdowns: usize,
}

/// Inspection handle that outlives the transport it was taken from.
#[derive(Clone, Debug, Default)]
pub struct FakeHandle {
    log: Arc<Mutex<FakeLog>>,
}

impl FakeHandle {
    fn lock(&self) -> MutexGuard<'_, FakeLog> {
        self.log.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Every command received, in order.
    pub fn commands(&self) -> Vec<Command> {
        self.lock().commands.clone()
    }

    /// Number of received commands with wire tag `kind`.
    pub fn count(&self, kind: &str) -> usize {
        self.lock()
            .commands
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    /// Orders actually executed by a step: `(frame, entity, order)`.
    pub fn applied_orders(&self) -> Vec<(u64, EntityId, Order)> {
        self.lock().applied_orders.clone()
    }

    /// How many times the transport was shut down.
    pub fn shutdowns(&self) -> usize {
        self.lock().shutdowns
    }
}

// ── Game model ──────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Ability {
    cooldown: f64,
    cast_time: Option<f64>,
    last_used_frame: Option<u64>,
}

impl Ability {
    fn new(id: AbilityId) -> Self {
        let (cooldown, cast_time) = ability_defaults(id);
        Self {
            cooldown,
            cast_time,
            last_used_frame: None,
        }
    }

    fn ready(&self, frame: u64, dt: f64) -> bool {
        match self.last_used_frame {
            None => true,
            Some(last) => last as f64 * dt + self.cooldown <= frame as f64 * dt,
        }
    }
}

#[derive(Clone, Debug)]
struct Player {
    location: Vec2,
    velocity: Vec2,
    facing: f64,
    health: f64,
    ready: bool,
    gold: f64,
    abilities: BTreeMap<AbilityId, Ability>,
    activity: RawUnitState,
    pending_order: Option<Order>,
    pending_buys: Vec<AbilityId>,
}

#[derive(Clone, Debug)]
struct Projectile {
    id: u64,
    owner: u64,
    location: Vec2,
    velocity: Vec2,
    damage: f64,
    frames_left: u32,
}

#[derive(Debug)]
struct Game {
    frame: u64,
    delta_time: f64,
    round: u32,
    phase: RawPhase,
    arena_radius: f64,
    players: BTreeMap<u64, Player>,
    projectiles: Vec<Projectile>,
    events: Vec<RawGameEvent>,
    next_id: u64,
    rng: ChaCha8Rng,
}

fn toward(from: Vec2, to: Vec2, speed: f64) -> Vec2 {
    let d = to - from;
    let len = d.length();
    if len <= f64::EPSILON {
        Vec2::ZERO
    } else {
        Vec2::new(d.x / len * speed, d.y / len * speed)
    }
}

fn spawn_point(rng: &mut ChaCha8Rng) -> Vec2 {
    Vec2::new(
        rng.random_range(-250.0..250.0),
        rng.random_range(-250.0..250.0),
    )
}

impl Game {
    fn new(config: &FakeConfig, players: u32, seed: u64, dt: f64, gold: f64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let players = (0..u64::from(players))
            .map(|i| {
                let abilities = config
                    .starting_abilities
                    .iter()
                    .map(|&a| (a, Ability::new(a)))
                    .collect();
                let player = Player {
                    location: spawn_point(&mut rng),
                    velocity: Vec2::ZERO,
                    facing: 0.0,
                    health: config.max_health,
                    ready: false,
                    gold,
                    abilities,
                    activity: RawUnitState::Idle,
                    pending_order: None,
                    pending_buys: Vec::new(),
                };
                (FIRST_PLAYER_ID + i, player)
            })
            .collect();
        Self {
            frame: 0,
            delta_time: dt,
            round: 0,
            phase: RawPhase::Shop {
                start_frame: 0,
                duration: config.shop_time,
            },
            arena_radius: config.arena_radius,
            players,
            projectiles: Vec::new(),
            events: Vec::new(),
            next_id: FIRST_PLAYER_ID + 100,
            rng,
        }
    }

    fn reset(&mut self, config: &FakeConfig) {
        self.projectiles.clear();
        self.arena_radius = config.arena_radius;
        for player in self.players.values_mut() {
            player.ready = false;
            player.health = config.max_health;
            player.location = spawn_point(&mut self.rng);
            player.velocity = Vec2::ZERO;
            player.activity = RawUnitState::Idle;
            player.pending_order = None;
            for ability in player.abilities.values_mut() {
                ability.last_used_frame = None;
            }
        }
    }

    fn living(&self) -> Vec<u64> {
        self.players
            .iter()
            .filter(|(_, p)| p.health > 0.0)
            .map(|(&id, _)| id)
            .collect()
    }

    fn step(&mut self, config: &FakeConfig, log: &FakeHandle) {
        self.frame += 1;
        self.events.clear();
        match self.phase {
            RawPhase::Shop {
                start_frame,
                duration,
            } => self.step_shop(config, start_frame, duration),
            RawPhase::Round { .. } => self.step_round(config, log),
        }
    }

    fn step_shop(&mut self, config: &FakeConfig, start_frame: u64, duration: f64) {
        for player in self.players.values_mut() {
            player.pending_order = None;
            for ability in std::mem::take(&mut player.pending_buys) {
                let Some(&cost) = config.costs.get(&ability) else {
                    continue;
                };
                if cost <= player.gold && !player.abilities.contains_key(&ability) {
                    player.gold -= cost;
                    player.abilities.insert(ability, Ability::new(ability));
                }
            }
        }
        let dt = self.delta_time;
        let expired = self.frame as f64 * dt > start_frame as f64 * dt + duration;
        if expired || self.players.values().all(|p| p.ready) {
            self.reset(config);
            self.round += 1;
            self.phase = RawPhase::Round {
                start_frame: self.frame,
            };
        }
    }

    fn step_round(&mut self, config: &FakeConfig, log: &FakeHandle) {
        let dt = self.delta_time;
        let frame = self.frame;

        let ids: Vec<u64> = self.players.keys().copied().collect();
        for id in &ids {
            let Some(order) = self.players.get_mut(id).and_then(|p| p.pending_order.take()) else {
                continue;
            };
            log.lock()
                .applied_orders
                .push((frame, EntityId(*id), order.clone()));
            self.apply_order(config, *id, order);
        }

        for player in self.players.values_mut() {
            if let RawUnitState::Moving { target } = player.activity {
                let step = config.move_speed * dt;
                if player.location.distance(target) <= step {
                    player.location = target;
                    player.velocity = Vec2::ZERO;
                    player.activity = RawUnitState::Idle;
                } else {
                    player.velocity = toward(player.location, target, config.move_speed);
                    player.location = player.location
                        + Vec2::new(player.velocity.x * dt, player.velocity.y * dt);
                }
            }
        }

        self.step_projectiles();

        for hit in config.damage.iter().filter(|d| d.frame == frame) {
            if let Some(player) = self.players.values_mut().nth(hit.player) {
                player.health = (player.health - hit.amount).clamp(0.0, config.max_health);
            }
        }

        let living = self.living();
        let over = match self.players.len() {
            0 => false,
            1 => living.is_empty(),
            _ => living.len() <= 1,
        };
        if over {
            self.events
                .push(RawGameEvent::RoundOver { winners: living });
            self.reset(config);
            for player in self.players.values_mut() {
                player.gold += config.gold_per_round;
            }
            self.phase = RawPhase::Shop {
                start_frame: frame,
                duration: config.shop_time,
            };
        }
    }

    fn apply_order(&mut self, config: &FakeConfig, id: u64, order: Order) {
        let dt = self.delta_time;
        let frame = self.frame;
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        match order {
            Order::Stop => {
                player.activity = RawUnitState::Idle;
                player.velocity = Vec2::ZERO;
            }
            Order::Move { target } => {
                player.activity = RawUnitState::Moving { target };
                let d = target - player.location;
                player.facing = d.y.atan2(d.x);
            }
            Order::UseAbility { ability_id, target } => {
                let Some(ability) = player.abilities.get_mut(&ability_id) else {
                    return;
                };
                if !ability.ready(frame, dt) {
                    return;
                }
                ability.last_used_frame = Some(frame);
                let origin = player.location;
                if let Some(t) = target {
                    let d = t - origin;
                    player.facing = d.y.atan2(d.x);
                }
                self.events.push(RawGameEvent::AbilityUsed {
                    entity_id: RawEntityRef::Number(id),
                    ability_id: ability_id.as_str().to_string(),
                });
                match (ability_id, target) {
                    (AbilityId::Shoot | AbilityId::Homing, Some(t)) => {
                        let velocity = toward(origin, t, PROJECTILE_SPEED);
                        self.projectiles.push(Projectile {
                            id: self.next_id,
                            owner: id,
                            location: origin,
                            velocity,
                            damage: config.projectile_damage,
                            frames_left: PROJECTILE_LIFETIME,
                        });
                        self.next_id += 1;
                    }
                    (AbilityId::Teleport, Some(t)) => {
                        if let Some(p) = self.players.get_mut(&id) {
                            p.location = t;
                        }
                    }
                    (AbilityId::Scourge, _) => {
                        for (other_id, other) in self.players.iter_mut() {
                            if *other_id != id && other.location.distance(origin) <= SCOURGE_RADIUS
                            {
                                other.health = (other.health - config.scourge_damage).max(0.0);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn step_projectiles(&mut self) {
        let dt = self.delta_time;
        let mut remaining = Vec::with_capacity(self.projectiles.len());
        for mut projectile in std::mem::take(&mut self.projectiles) {
            projectile.location = projectile.location
                + Vec2::new(projectile.velocity.x * dt, projectile.velocity.y * dt);
            projectile.frames_left = projectile.frames_left.saturating_sub(1);
            let hit = self.players.iter_mut().find(|(id, p)| {
                **id != projectile.owner
                    && p.health > 0.0
                    && p.location.distance(projectile.location) <= PLAYER_RADIUS
            });
            if let Some((_, player)) = hit {
                player.health = (player.health - projectile.damage).max(0.0);
            } else if projectile.frames_left > 0 {
                remaining.push(projectile);
            }
        }
        self.projectiles = remaining;
    }

    fn to_raw(&self, config: &FakeConfig) -> RawState {
        let mut raw = RawState {
            game_state: RawGameState {
                frame_number: self.frame,
                delta_time: self.delta_time,
                state: self.phase.clone(),
                round: self.round,
            },
            bodies: BTreeMap::new(),
            healths: BTreeMap::new(),
            abilities: BTreeMap::new(),
            units: BTreeMap::new(),
            player_owneds: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            players: BTreeMap::new(),
            shops: BTreeMap::new(),
            arena: RawArena {
                radius: self.arena_radius,
            },
            game_events: RawGameEvents {
                events: self.events.clone(),
            },
        };
        let costs: BTreeMap<String, f64> = config
            .costs
            .iter()
            .map(|(a, c)| (a.as_str().to_string(), *c))
            .collect();
        for (id, p) in &self.players {
            let key = id.to_string();
            raw.bodies.insert(
                key.clone(),
                RawBody {
                    location: p.location,
                    velocity: p.velocity,
                    facing: p.facing,
                    radius: PLAYER_RADIUS,
                },
            );
            raw.healths.insert(
                key.clone(),
                RawHealth {
                    current: p.health,
                    maximum: config.max_health,
                },
            );
            raw.abilities.insert(
                key.clone(),
                p.abilities
                    .iter()
                    .map(|(a, s)| {
                        (
                            a.as_str().to_string(),
                            RawAbility {
                                cooldown: s.cooldown,
                                last_used_frame: s.last_used_frame,
                                cast_time: s.cast_time,
                            },
                        )
                    })
                    .collect(),
            );
            raw.units.insert(
                key.clone(),
                RawUnit {
                    state: p.activity.clone(),
                },
            );
            raw.player_owneds.insert(
                key.clone(),
                RawPlayerOwned {
                    owning_player_id: *id,
                },
            );
            raw.players.insert(key.clone(), RawPlayer { ready: p.ready });
            raw.shops.insert(
                key,
                RawShop {
                    gold: p.gold,
                    costs: costs.clone(),
                },
            );
        }
        for projectile in &self.projectiles {
            let key = projectile.id.to_string();
            raw.bodies.insert(
                key.clone(),
                RawBody {
                    location: projectile.location,
                    velocity: projectile.velocity,
                    facing: projectile.velocity.y.atan2(projectile.velocity.x),
                    radius: 5.0,
                },
            );
            raw.player_owneds.insert(
                key.clone(),
                RawPlayerOwned {
                    owning_player_id: projectile.owner,
                },
            );
            raw.projectiles.insert(
                key,
                RawProjectile {
                    damage: projectile.damage,
                },
            );
        }
        raw
    }
}

// ── Transport ───────────────────────────────────────────────────

/// In-process simulation implementing [`Transport`].
///
/// # Examples
///
/// ```
/// use warlock_link::SimulationLink;
/// use warlock_test_utils::FakeSimulation;
///
/// let fake = FakeSimulation::default();
/// let handle = fake.handle();
/// let mut link = SimulationLink::new(fake);
/// let state = link.start(Some(1), 2).unwrap();
/// assert_eq!(state.player_ids().len(), 2);
/// assert_eq!(handle.count("start"), 1);
/// ```
#[derive(Debug)]
pub struct FakeSimulation {
    config: FakeConfig,
    game: Option<Game>,
    output: VecDeque<u8>,
    queries: usize,
    dead: bool,
    handle: FakeHandle,
}

impl Default for FakeSimulation {
    fn default() -> Self {
        Self::new(FakeConfig::default())
    }
}

impl FakeSimulation {
    pub fn new(config: FakeConfig) -> Self {
        Self {
            config,
            game: None,
            output: VecDeque::new(),
            queries: 0,
            dead: false,
            handle: FakeHandle::default(),
        }
    }

    /// Fake whose `on_query`-th response exhibits `kind`.
    pub fn with_fault(on_query: usize, kind: FaultKind) -> Self {
        Self::new(FakeConfig {
            fault: Some(Fault { on_query, kind }),
            ..FakeConfig::default()
        })
    }

    pub fn handle(&self) -> FakeHandle {
        self.handle.clone()
    }

    fn execute(&mut self, command: Command) -> io::Result<()> {
        match command {
            Command::Start {
                num_players,
                seed,
                delta_time,
                start_gold,
            } => {
                self.game = Some(Game::new(
                    &self.config,
                    num_players,
                    seed.unwrap_or(0),
                    delta_time.unwrap_or(self.config.delta_time),
                    start_gold.unwrap_or(self.config.start_gold),
                ));
            }
            Command::Step { steps } => {
                let game = self.game.as_mut().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "no game started")
                })?;
                for _ in 0..steps {
                    game.step(&self.config, &self.handle);
                }
            }
            Command::SetOrder { entity_id, order } => {
                if let Some(player) = self.game_mut()?.players.get_mut(&entity_id.0) {
                    player.pending_order = order;
                }
            }
            Command::SetReady { entity_id, ready } => {
                if let Some(player) = self.game_mut()?.players.get_mut(&entity_id.0) {
                    player.ready = ready;
                }
            }
            Command::BuyAbility {
                entity_id,
                ability_id,
            } => {
                if let Some(player) = self.game_mut()?.players.get_mut(&entity_id.0) {
                    player.pending_buys.push(ability_id);
                }
            }
            Command::GetComponents => self.respond()?,
        }
        Ok(())
    }

    fn game_mut(&mut self) -> io::Result<&mut Game> {
        self.game
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no game started"))
    }

    fn respond(&mut self) -> io::Result<()> {
        let index = self.queries;
        self.queries += 1;
        let game = self
            .game
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no game started"))?;
        let mut raw = game.to_raw(&self.config);

        let fault = self.config.fault.filter(|f| f.on_query == index);
        let bytes = match fault.map(|f| f.kind) {
            None => serde_json::to_vec(&raw)?,
            Some(FaultKind::Exit) => {
                self.dead = true;
                Vec::new()
            }
            Some(FaultKind::Truncate) => {
                self.dead = true;
                let mut doc = serde_json::to_vec(&raw)?;
                doc.truncate(doc.len() / 2);
                doc
            }
            Some(FaultKind::Garbage) => b"{\"gameState\": oops".to_vec(),
            Some(FaultKind::Oversize) => {
                let padding = "x".repeat(4 << 20);
                format!("{{\"padding\":\"{padding}\"}}").into_bytes()
            }
            Some(FaultKind::SchemaViolation) => {
                b"{\"gameState\":{\"frameNumber\":\"seven\"}}".to_vec()
            }
            Some(FaultKind::FrameRegression) => {
                raw.game_state.frame_number = raw.game_state.frame_number.saturating_sub(1);
                serde_json::to_vec(&raw)?
            }
        };
        self.output.extend(bytes);
        Ok(())
    }
}

impl Transport for FakeSimulation {
    fn send(&mut self, line: &[u8]) -> io::Result<()> {
        if self.dead {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulation exited"));
        }
        let command: Command = serde_json::from_slice(line.trim_ascii_end())?;
        self.handle.lock().commands.push(command.clone());
        self.execute(command)
    }

    fn receiver(&mut self) -> &mut dyn BufRead {
        &mut self.output
    }

    fn exit_status(&mut self) -> Option<String> {
        self.dead.then(|| "exit status: 1".to_string())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        if !self.dead {
            self.dead = true;
            self.handle.lock().shutdowns += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(fake: &mut FakeSimulation, command: &Command) {
        fake.send(command.to_line().unwrap().as_bytes()).unwrap();
    }

    fn query(fake: &mut FakeSimulation) -> RawState {
        send(fake, &Command::GetComponents);
        let bytes: Vec<u8> = fake.output.drain(..).collect();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn start(fake: &mut FakeSimulation, players: u32) {
        send(
            fake,
            &Command::Start {
                num_players: players,
                seed: Some(3),
                delta_time: None,
                start_gold: None,
            },
        );
    }

    #[test]
    fn starts_in_shop_with_players() {
        let mut fake = FakeSimulation::default();
        start(&mut fake, 2);
        let raw = query(&mut fake);
        assert!(matches!(raw.game_state.state, RawPhase::Shop { .. }));
        assert_eq!(raw.players.len(), 2);
        assert!(raw.players.contains_key("1000"));
        assert_eq!(raw.shops["1001"].gold, 10.0);
    }

    #[test]
    fn all_ready_starts_round() {
        let mut fake = FakeSimulation::default();
        start(&mut fake, 2);
        for id in [1000, 1001] {
            send(
                &mut fake,
                &Command::SetReady {
                    entity_id: EntityId(id),
                    ready: true,
                },
            );
        }
        send(&mut fake, &Command::Step { steps: 1 });
        let raw = query(&mut fake);
        assert_eq!(raw.game_state.state, RawPhase::Round { start_frame: 1 });
        assert_eq!(raw.game_state.round, 1);
    }

    #[test]
    fn multi_frame_step_advances_frame_number() {
        let mut fake = FakeSimulation::default();
        let line = Command::Step { steps: 2 }.to_line().unwrap();
        let err = fake.send(line.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        start(&mut fake, 2);
        let before = query(&mut fake).game_state.frame_number;
        send(&mut fake, &Command::Step { steps: 4 });
        assert_eq!(query(&mut fake).game_state.frame_number, before + 4);
    }

    #[test]
    fn response_has_no_trailing_newline() {
        let mut fake = FakeSimulation::default();
        start(&mut fake, 1);
        send(&mut fake, &Command::GetComponents);
        assert_eq!(fake.output.back(), Some(&b'}'));
    }

    #[test]
    fn lethal_damage_ends_round() {
        let mut fake = FakeSimulation::new(FakeConfig {
            shop_time: 0.0,
            damage: vec![ScheduledDamage {
                frame: 3,
                player: 1,
                amount: 100.0,
            }],
            ..FakeConfig::default()
        });
        start(&mut fake, 2);
        send(&mut fake, &Command::Step { steps: 3 });
        let raw = query(&mut fake);
        assert_eq!(
            raw.game_events.events,
            vec![RawGameEvent::RoundOver { winners: vec![1000] }]
        );
        assert!(matches!(raw.game_state.state, RawPhase::Shop { .. }));
        assert_eq!(raw.healths["1001"].current, 100.0);
        assert_eq!(raw.shops["1000"].gold, 20.0);
    }

    #[test]
    fn dead_fake_rejects_writes() {
        let mut fake = FakeSimulation::with_fault(0, FaultKind::Exit);
        start(&mut fake, 1);
        send(&mut fake, &Command::GetComponents);
        assert!(fake.output.is_empty());
        let err = fake.send(b"{\"type\":\"getComponents\"}\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
