//! The league: roster ownership, outcome records and promotion.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use warlock_core::PolicyId;

use crate::agent::{AgentRecord, LeagueAgent, MatchResult};
use crate::config::{LeagueConfig, PromotionConfig};
use crate::error::LeagueError;
use crate::matchmaker::Matchmaker;
use crate::store::PolicyStore;
use crate::sync::{Synchronizer, WorkerAck, WorkerEndpoint};

/// Results drained by [`League::collect_results`], in arrival order.
#[derive(Debug, Default)]
pub struct CollectedResults {
    /// Results credited to their agents.
    pub recorded: Vec<MatchResult>,
    /// Results that could not be credited, with the reason.
    pub rejected: Vec<(MatchResult, LeagueError)>,
}

/// Owns the roster and keeps every rollout worker in step with it.
///
/// All mutation goes through `&mut self`. Every change that alters the
/// roster ends with a sync: weights are pushed, a new [`Matchmaker`] is
/// built and broadcast, and the call returns only after every
/// registered worker has acknowledged it.
pub struct League<S: PolicyStore> {
    store: S,
    roster: IndexMap<PolicyId, LeagueAgent>,
    records: IndexMap<PolicyId, AgentRecord>,
    next_id: u32,
    sync: Synchronizer,
    promotion: PromotionConfig,
}

impl<S: PolicyStore> League<S> {
    /// Create a league with `config.initial_mains` Mains, each paired
    /// with an Exploiter.
    pub fn new(store: S, config: LeagueConfig) -> Result<Self, LeagueError> {
        config.validate()?;
        let mut league = Self {
            store,
            roster: IndexMap::new(),
            records: IndexMap::new(),
            next_id: 0,
            sync: Synchronizer::new(Arc::new(Matchmaker::empty())),
            promotion: config.promotion,
        };
        for _ in 0..config.initial_mains {
            let main = league.create(LeagueAgent::Main)?;
            league.create(LeagueAgent::Exploiter { target: main })?;
        }
        if !league.roster.is_empty() {
            league.sync()?;
        }
        Ok(league)
    }

    // ── Roster changes ───────────────────────────────────────────

    /// Add a Main and an Exploiter targeting it. Returns the Main's ID.
    pub fn add_main(&mut self) -> Result<PolicyId, LeagueError> {
        let main = self.create(LeagueAgent::Main)?;
        self.create(LeagueAgent::Exploiter { target: main })?;
        self.sync()?;
        Ok(main)
    }

    /// Add an Exploiter of the Main `target`.
    pub fn add_exploiter(&mut self, target: PolicyId) -> Result<PolicyId, LeagueError> {
        if self.roster.get(&target) != Some(&LeagueAgent::Main) {
            return Err(LeagueError::InvalidTarget { target });
        }
        let id = self.create(LeagueAgent::Exploiter { target })?;
        self.sync()?;
        Ok(id)
    }

    /// Add a frozen Clone holding a copy of `source`'s current weights.
    ///
    /// Later training of `source` does not affect the Clone.
    pub fn add_clone(&mut self, source: PolicyId) -> Result<PolicyId, LeagueError> {
        let id = self.create_clone(source)?;
        self.sync()?;
        Ok(id)
    }

    /// Clone every trainable agent whose win rate since its last
    /// promotion meets the threshold, then restart its window.
    ///
    /// All promotions share one sync. Returns the new Clone IDs.
    pub fn promote_eligible(&mut self) -> Result<Vec<PolicyId>, LeagueError> {
        let eligible: Vec<PolicyId> = self
            .roster
            .iter()
            .filter(|(_, agent)| agent.is_trainable())
            .map(|(&id, _)| id)
            .filter(|id| {
                self.records.get(id).is_some_and(|r| {
                    r.games_since_promotion >= self.promotion.min_games
                        && r.recent_win_rate() >= self.promotion.min_win_rate
                })
            })
            .collect();
        if eligible.is_empty() {
            return Ok(Vec::new());
        }

        let mut clones = Vec::with_capacity(eligible.len());
        for source in eligible {
            let clone = self.create_clone(source)?;
            if let Some(record) = self.records.get_mut(&source) {
                info!(
                    agent = %source,
                    clone = %clone,
                    win_rate = record.recent_win_rate(),
                    games = record.games_since_promotion,
                    "agent promoted"
                );
                record.reset_promotion_window();
            }
            clones.push(clone);
        }
        self.sync()?;
        Ok(clones)
    }

    /// Push weights and broadcast the current roster to every worker.
    ///
    /// Blocks until each registered worker has acknowledged.
    pub fn sync(&mut self) -> Result<Vec<WorkerAck>, LeagueError> {
        self.store
            .push_weights()
            .map_err(|e| LeagueError::Store(Box::new(e)))?;
        let version = self.version() + 1;
        let matchmaker = Arc::new(Matchmaker::new(version, self.roster.clone())?);
        let acks = self.sync.broadcast(matchmaker);
        info!(
            version,
            agents = self.roster.len(),
            trainable = self.sync.current().trainable().len(),
            workers = acks.len(),
            "league synchronized"
        );
        Ok(acks)
    }

    fn create(&mut self, agent: LeagueAgent) -> Result<PolicyId, LeagueError> {
        let id = self.allocate()?;
        self.admit(id, agent);
        Ok(id)
    }

    /// A Clone joins the roster only once its weights are copied. A
    /// failed snapshot spends the ID and leaves the roster unchanged.
    fn create_clone(&mut self, source: PolicyId) -> Result<PolicyId, LeagueError> {
        match self.roster.get(&source) {
            None => return Err(LeagueError::UnknownPolicy { id: source }),
            Some(LeagueAgent::Clone { .. }) => return Err(LeagueError::FrozenSource { source }),
            Some(_) => {}
        }
        let id = self.allocate()?;
        if let Err(e) = self.store.snapshot_weights(source, id) {
            warn!(agent = %id, source = %source, error = %e, "clone snapshot failed");
            return Err(LeagueError::Store(Box::new(e)));
        }
        self.admit(id, LeagueAgent::Clone { source });
        Ok(id)
    }

    fn allocate(&mut self) -> Result<PolicyId, LeagueError> {
        let id = PolicyId(self.next_id);
        self.store
            .create_policy(id)
            .map_err(|e| LeagueError::Store(Box::new(e)))?;
        self.next_id += 1;
        Ok(id)
    }

    fn admit(&mut self, id: PolicyId, agent: LeagueAgent) {
        self.roster.insert(id, agent);
        self.records.insert(id, AgentRecord::default());
        debug!(agent = %id, role = agent.role(), "agent created");
    }

    // ── Outcomes ─────────────────────────────────────────────────

    /// Credit a finished episode to the agents that played it.
    ///
    /// Fails without touching any record if a policy is unknown.
    pub fn record_outcome(&mut self, result: &MatchResult) -> Result<(), LeagueError> {
        if let Some(&id) = result
            .policies
            .iter()
            .find(|id| !self.records.contains_key(*id))
        {
            return Err(LeagueError::UnknownPolicy { id });
        }
        for (slot, id) in result.policies.iter().enumerate() {
            if let Some(record) = self.records.get_mut(id) {
                record.record(result.winner == Some(slot));
            }
        }
        Ok(())
    }

    /// Record every result workers have reported since the last call.
    ///
    /// A result naming an unknown policy is set aside without stopping
    /// the others from being recorded.
    pub fn collect_results(&mut self) -> CollectedResults {
        let mut collected = CollectedResults::default();
        for result in self.sync.drain_results() {
            match self.record_outcome(&result) {
                Ok(()) => collected.recorded.push(result),
                Err(e) => {
                    warn!(episode = %result.episode, error = %e, "result rejected");
                    collected.rejected.push((result, e));
                }
            }
        }
        collected
    }

    // ── Workers ──────────────────────────────────────────────────

    /// Register a rollout worker; it starts on the current roster.
    pub fn register_worker(&mut self) -> WorkerEndpoint {
        self.sync.register()
    }

    /// Number of registered workers.
    pub fn worker_count(&self) -> usize {
        self.sync.worker_count()
    }

    // ── Accessors ────────────────────────────────────────────────

    /// The roster, in creation order.
    pub fn agents(&self) -> &IndexMap<PolicyId, LeagueAgent> {
        &self.roster
    }

    /// Role of `id`.
    pub fn agent(&self, id: PolicyId) -> Option<LeagueAgent> {
        self.roster.get(&id).copied()
    }

    /// Record of `id`.
    pub fn record(&self, id: PolicyId) -> Option<&AgentRecord> {
        self.records.get(&id)
    }

    /// Trainable agents, in creation order.
    pub fn trainable_ids(&self) -> Vec<PolicyId> {
        self.roster
            .iter()
            .filter(|(_, agent)| agent.is_trainable())
            .map(|(&id, _)| id)
            .collect()
    }

    /// The most recently broadcast matchmaker.
    pub fn matchmaker(&self) -> &Arc<Matchmaker> {
        self.sync.current()
    }

    /// Roster version; bumped by every sync.
    pub fn version(&self) -> u64 {
        self.sync.current().version()
    }

    /// The policy store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the policy store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

impl<S: PolicyStore> std::fmt::Debug for League<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("League")
            .field("roster", &self.roster)
            .field("version", &self.version())
            .field("sync", &self.sync)
            .finish()
    }
}
