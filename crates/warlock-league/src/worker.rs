//! Rollout workers: one simulation link, many episodes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use warlock_core::{EpisodeId, PolicyId};
use warlock_episode::{EpisodeController, Policy};
use warlock_link::{ChildTransport, LinkError, SimulationLink, Transport};

use crate::agent::MatchResult;
use crate::error::LeagueError;
use crate::sync::{WorkerEndpoint, WorkerId};

/// Hands out policy instances by ID.
///
/// Implemented by the optimizer side: a checked-out trainable policy
/// typically records experience, a frozen one only acts.
pub trait PolicyProvider {
    /// Policy type handed to the episode controller.
    type Policy: Policy;

    /// Instance of `id` for one episode; `None` if unknown.
    fn checkout(&mut self, id: PolicyId, trainable: bool) -> Option<Self::Policy>;

    /// Return an instance after its episode, finished or not.
    fn checkin(&mut self, id: PolicyId, policy: Self::Policy) {
        let _ = (id, policy);
    }
}

/// Builds a replacement link after the current one failed.
pub type LinkFactory<T> = Box<dyn FnMut() -> Result<SimulationLink<T>, LinkError> + Send>;

/// Consecutive link replacements [`RolloutWorker::run`] attempts before
/// giving up.
pub const MAX_CONSECUTIVE_RELINKS: u32 = 3;

/// Runs episodes on one exclusively owned link.
///
/// Roster updates are applied only at the start of
/// [`run_episode`](Self::run_episode), never mid-episode.
pub struct RolloutWorker<P: PolicyProvider, T: Transport = ChildTransport> {
    link: SimulationLink<T>,
    controller: EpisodeController,
    provider: P,
    endpoint: WorkerEndpoint,
    relink: Option<LinkFactory<T>>,
    episodes_run: u64,
    relinks: u64,
}

impl<P: PolicyProvider, T: Transport> RolloutWorker<P, T> {
    /// Assemble a worker.
    pub fn new(
        link: SimulationLink<T>,
        controller: EpisodeController,
        provider: P,
        endpoint: WorkerEndpoint,
    ) -> Self {
        Self {
            link,
            controller,
            provider,
            endpoint,
            relink: None,
            episodes_run: 0,
            relinks: 0,
        }
    }

    /// Replace the link through `factory` whenever an episode leaves it
    /// poisoned, instead of stopping [`run`](Self::run).
    pub fn with_relink(
        mut self,
        factory: impl FnMut() -> Result<SimulationLink<T>, LinkError> + Send + 'static,
    ) -> Self {
        self.relink = Some(Box::new(factory));
        self
    }

    /// This worker's ID.
    pub fn id(&self) -> WorkerId {
        self.endpoint.id()
    }

    /// Installed roster version.
    pub fn roster_version(&self) -> u64 {
        self.endpoint.matchmaker().version()
    }

    /// Episodes completed so far.
    pub fn episodes_run(&self) -> u64 {
        self.episodes_run
    }

    /// Links replaced after a fatal link error.
    pub fn relinks(&self) -> u64 {
        self.relinks
    }

    /// The simulation link.
    pub fn link(&self) -> &SimulationLink<T> {
        &self.link
    }

    /// The policy provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Mutable access to the policy provider.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Play `episode` and report its result to the league.
    pub fn run_episode(&mut self, episode: EpisodeId) -> Result<MatchResult, LeagueError> {
        if self.endpoint.apply_pending()? {
            debug!(worker = %self.id(), version = self.roster_version(), "new roster installed");
        }
        let matchmaker = Arc::clone(self.endpoint.matchmaker());
        let ids = matchmaker.matchup(episode, self.controller.slots())?;

        let mut policies = Vec::with_capacity(ids.len());
        for &id in &ids {
            match self.provider.checkout(id, matchmaker.is_trainable(id)) {
                Some(policy) => policies.push(policy),
                None => {
                    for (&held, policy) in ids.iter().zip(policies) {
                        self.provider.checkin(held, policy);
                    }
                    return Err(LeagueError::UnknownPolicy { id });
                }
            }
        }

        let outcome = self
            .controller
            .run(&mut self.link, Some(episode.0), &mut policies);
        for (&id, policy) in ids.iter().zip(policies) {
            self.provider.checkin(id, policy);
        }
        let outcome = outcome?;

        let result = MatchResult::from_outcome(episode, matchmaker.version(), ids, &outcome);
        self.endpoint.report(result.clone())?;
        self.episodes_run += 1;
        info!(
            worker = %self.id(),
            episode = %episode,
            policies = ?result.policies,
            winner = ?result.winner,
            steps = result.steps,
            "episode complete"
        );
        Ok(result)
    }

    /// Run episodes until `shutdown` is set, then close the link.
    ///
    /// An episode that poisons the link is discarded; with a
    /// [`with_relink`](Self::with_relink) factory the link is replaced
    /// and the loop continues, up to [`MAX_CONSECUTIVE_RELINKS`] times
    /// in a row. Any other error stops the worker. The link is closed
    /// (and the simulation reaped) on every exit path. Returns the
    /// number of episodes completed by this call.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<u64, LeagueError> {
        info!(worker = %self.id(), "rollout worker started");
        let mut completed = 0;
        let mut consecutive = 0;
        let result = loop {
            if shutdown.load(Ordering::Acquire) {
                break Ok(());
            }
            let episode = self.endpoint.next_episode();
            match self.run_episode(episode) {
                Ok(_) => {
                    completed += 1;
                    consecutive = 0;
                }
                Err(e)
                    if self.relink.is_some()
                        && e.poisons_link()
                        && consecutive < MAX_CONSECUTIVE_RELINKS =>
                {
                    warn!(worker = %self.id(), episode = %episode, error = %e, "episode discarded");
                    if let Err(relink) = self.replace_link() {
                        warn!(worker = %self.id(), error = %relink, "worker stopping");
                        break Err(e);
                    }
                    consecutive += 1;
                }
                Err(e) => {
                    warn!(worker = %self.id(), episode = %episode, error = %e, "worker stopping");
                    break Err(e);
                }
            }
        };
        let closed = self.link.close();
        info!(worker = %self.id(), episodes = completed, "rollout worker stopped");
        result?;
        closed?;
        Ok(completed)
    }

    fn replace_link(&mut self) -> Result<(), LeagueError> {
        let Some(factory) = self.relink.as_mut() else {
            return Err(LeagueError::Link(LinkError::Closed));
        };
        let fresh = factory()?;
        let mut old = std::mem::replace(&mut self.link, fresh);
        if let Err(e) = old.close() {
            debug!(worker = %self.id(), error = %e, "closing failed link");
        }
        self.relinks += 1;
        info!(worker = %self.id(), relinks = self.relinks, "simulation link replaced");
        Ok(())
    }
}

impl<P: PolicyProvider, T: Transport> std::fmt::Debug for RolloutWorker<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RolloutWorker")
            .field("id", &self.id())
            .field("roster_version", &self.roster_version())
            .field("episodes_run", &self.episodes_run)
            .field("relinks", &self.relinks)
            .field("link", &self.link)
            .finish()
    }
}
