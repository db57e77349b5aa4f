//! Roster broadcast to rollout workers.
//!
//! Each worker holds a [`WorkerEndpoint`] with a bounded update channel.
//! [`Synchronizer::broadcast`] sends every worker a [`RosterUpdate`]
//! carrying a shared reply sender, then blocks until each worker has
//! acknowledged or dropped its endpoint. Workers apply updates only
//! between episodes, so no episode ever mixes matchmaker versions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, warn};

use warlock_core::EpisodeId;

use crate::agent::MatchResult;
use crate::error::LeagueError;
use crate::matchmaker::Matchmaker;

/// Identifies a registered worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A new matchmaker, paired with the channel for the acknowledgement.
#[derive(Debug)]
pub struct RosterUpdate {
    /// The matchmaker to install.
    pub matchmaker: Arc<Matchmaker>,
    reply: Sender<WorkerAck>,
}

/// A worker's confirmation that it installed a roster version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerAck {
    /// The acknowledging worker.
    pub worker: WorkerId,
    /// Version now in use by that worker.
    pub version: u64,
}

/// Shared source of unique episode IDs.
#[derive(Clone, Debug, Default)]
pub struct EpisodeCounter(Arc<AtomicU64>);

impl EpisodeCounter {
    /// Counter whose first ID is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self(Arc::new(AtomicU64::new(first)))
    }

    /// Allocate the next episode ID.
    pub fn next_id(&self) -> EpisodeId {
        EpisodeId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

struct WorkerSlot {
    id: WorkerId,
    updates: Sender<RosterUpdate>,
}

/// League side of the broadcast.
pub struct Synchronizer {
    workers: Vec<WorkerSlot>,
    current: Arc<Matchmaker>,
    next_worker: u32,
    results_tx: Sender<MatchResult>,
    results_rx: Receiver<MatchResult>,
    episodes: EpisodeCounter,
}

impl Synchronizer {
    /// Synchronizer whose workers start with `initial`.
    pub fn new(initial: Arc<Matchmaker>) -> Self {
        let (results_tx, results_rx) = crossbeam_channel::unbounded();
        Self {
            workers: Vec::new(),
            current: initial,
            next_worker: 0,
            results_tx,
            results_rx,
            episodes: EpisodeCounter::default(),
        }
    }

    /// Register a worker. It starts with the current matchmaker.
    pub fn register(&mut self) -> WorkerEndpoint {
        let id = WorkerId(self.next_worker);
        self.next_worker += 1;
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.workers.push(WorkerSlot { id, updates: tx });
        debug!(worker = %id, version = self.current.version(), "worker registered");
        WorkerEndpoint {
            id,
            updates: rx,
            current: Arc::clone(&self.current),
            results: self.results_tx.clone(),
            episodes: self.episodes.clone(),
        }
    }

    /// Number of registered workers.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// The most recently broadcast matchmaker.
    pub fn current(&self) -> &Arc<Matchmaker> {
        &self.current
    }

    /// Install `matchmaker` on every worker and wait for all of them.
    ///
    /// Workers whose endpoint has been dropped are deregistered. Returns
    /// the acknowledgements received.
    pub fn broadcast(&mut self, matchmaker: Arc<Matchmaker>) -> Vec<WorkerAck> {
        let version = matchmaker.version();
        self.current = Arc::clone(&matchmaker);

        let (reply_tx, reply_rx) = crossbeam_channel::bounded(self.workers.len().max(1));
        self.workers.retain(|slot| {
            let update = RosterUpdate {
                matchmaker: Arc::clone(&matchmaker),
                reply: reply_tx.clone(),
            };
            let sent = slot.updates.send(update).is_ok();
            if !sent {
                warn!(worker = %slot.id, "worker endpoint dropped, deregistering");
            }
            sent
        });
        drop(reply_tx);

        // Ends once every update (and its reply sender) has been consumed.
        let acks: Vec<WorkerAck> = reply_rx.iter().collect();
        if acks.len() < self.workers.len() {
            self.workers
                .retain(|slot| acks.iter().any(|ack| ack.worker == slot.id));
            warn!(
                version,
                acked = acks.len(),
                "workers left during roster sync"
            );
        }
        debug!(version, workers = acks.len(), "roster synchronized");
        acks
    }

    /// Results reported by workers and not yet collected.
    pub fn drain_results(&self) -> Vec<MatchResult> {
        self.results_rx.try_iter().collect()
    }
}

impl fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("workers", &self.workers.len())
            .field("version", &self.current.version())
            .finish()
    }
}

/// Worker side of the broadcast.
#[derive(Debug)]
pub struct WorkerEndpoint {
    id: WorkerId,
    updates: Receiver<RosterUpdate>,
    current: Arc<Matchmaker>,
    results: Sender<MatchResult>,
    episodes: EpisodeCounter,
}

impl WorkerEndpoint {
    /// This worker's ID.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// The installed matchmaker.
    pub fn matchmaker(&self) -> &Arc<Matchmaker> {
        &self.current
    }

    /// Allocate a league-wide unique episode ID.
    pub fn next_episode(&self) -> EpisodeId {
        self.episodes.next_id()
    }

    /// Install and acknowledge any pending update without blocking.
    ///
    /// Call only between episodes. Returns whether the matchmaker changed.
    pub fn apply_pending(&mut self) -> Result<bool, LeagueError> {
        let mut changed = false;
        loop {
            match self.updates.try_recv() {
                Ok(update) => {
                    self.install(update);
                    changed = true;
                }
                Err(TryRecvError::Empty) => return Ok(changed),
                Err(TryRecvError::Disconnected) => {
                    return Err(LeagueError::Disconnected { worker: self.id })
                }
            }
        }
    }

    /// Block until the next update arrives, then install it.
    pub fn wait_for_update(&mut self) -> Result<u64, LeagueError> {
        let update = self
            .updates
            .recv()
            .map_err(|_| LeagueError::Disconnected { worker: self.id })?;
        Ok(self.install(update))
    }

    fn install(&mut self, update: RosterUpdate) -> u64 {
        let version = update.matchmaker.version();
        self.current = update.matchmaker;
        // The league may have stopped waiting; nothing to do then.
        let _ = update.reply.send(WorkerAck {
            worker: self.id,
            version,
        });
        debug!(worker = %self.id, version, "roster update applied");
        version
    }

    /// Report a finished episode to the league.
    pub fn report(&self, result: MatchResult) -> Result<(), LeagueError> {
        self.results
            .send(result)
            .map_err(|_| LeagueError::Disconnected { worker: self.id })
    }
}
