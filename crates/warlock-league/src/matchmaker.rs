//! Deterministic matchmaking over an immutable roster snapshot.

use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warlock_core::{EpisodeId, PolicyId};

use crate::agent::LeagueAgent;
use crate::error::LeagueError;

/// Maps `(episode, slot)` to a policy.
///
/// Built by the league on every roster change and shared with workers
/// behind an `Arc`; never mutated afterwards.
///
/// - Slot 0 is a trainable agent drawn uniformly with a ChaCha8 RNG
///   seeded by the episode ID (stream 0).
/// - Every other slot draws an opponent for that agent with the same
///   seed on stream `slot`: a Main faces any Main or Clone, an
///   Exploiter faces its target Main.
#[derive(Clone, Debug)]
pub struct Matchmaker {
    version: u64,
    roster: IndexMap<PolicyId, LeagueAgent>,
    trainable: Vec<PolicyId>,
}

impl Matchmaker {
    /// Snapshot `roster` as version `version`.
    ///
    /// Fails with [`LeagueError::EmptyPool`] when an Exploiter's target
    /// is not a Main in the roster.
    pub fn new(
        version: u64,
        roster: IndexMap<PolicyId, LeagueAgent>,
    ) -> Result<Self, LeagueError> {
        let trainable = roster
            .iter()
            .filter(|(_, agent)| agent.is_trainable())
            .map(|(&id, _)| id)
            .collect();
        let matchmaker = Self {
            version,
            roster,
            trainable,
        };
        matchmaker.validate()?;
        Ok(matchmaker)
    }

    /// An empty roster; every lookup fails.
    pub fn empty() -> Self {
        Self {
            version: 0,
            roster: IndexMap::new(),
            trainable: Vec::new(),
        }
    }

    /// Check that every Exploiter has a non-empty opponent pool.
    pub fn validate(&self) -> Result<(), LeagueError> {
        for (&id, agent) in &self.roster {
            if let LeagueAgent::Exploiter { .. } = agent {
                if self.opponent_pool(id).is_empty() {
                    return Err(LeagueError::EmptyPool { agent: Some(id) });
                }
            }
        }
        Ok(())
    }

    /// Roster version this snapshot was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The roster, in creation order.
    pub fn roster(&self) -> &IndexMap<PolicyId, LeagueAgent> {
        &self.roster
    }

    /// Trainable policies, in creation order.
    pub fn trainable(&self) -> &[PolicyId] {
        &self.trainable
    }

    /// Whether `id` is trained by the optimizer.
    pub fn is_trainable(&self, id: PolicyId) -> bool {
        self.roster.get(&id).is_some_and(LeagueAgent::is_trainable)
    }

    /// Opponents `agent` may be matched against, in creation order.
    pub fn opponent_pool(&self, agent: PolicyId) -> Vec<PolicyId> {
        let Some(role) = self.roster.get(&agent) else {
            return Vec::new();
        };
        self.roster
            .iter()
            .filter(|&(&id, other)| match role {
                LeagueAgent::Main => {
                    matches!(other, LeagueAgent::Main | LeagueAgent::Clone { .. })
                }
                LeagueAgent::Exploiter { target } => {
                    id == *target && matches!(other, LeagueAgent::Main)
                }
                LeagueAgent::Clone { .. } => false,
            })
            .map(|(&id, _)| id)
            .collect()
    }

    /// The trainable agent of `episode`, i.e. the policy of slot 0.
    pub fn learner(&self, episode: EpisodeId) -> Result<PolicyId, LeagueError> {
        let mut rng = ChaCha8Rng::seed_from_u64(episode.0);
        pick(&mut rng, &self.trainable).ok_or(LeagueError::EmptyPool { agent: None })
    }

    /// Policy controlling `slot` in `episode`.
    pub fn policy_for(&self, episode: EpisodeId, slot: usize) -> Result<PolicyId, LeagueError> {
        let learner = self.learner(episode)?;
        if slot == 0 {
            return Ok(learner);
        }
        let pool = self.opponent_pool(learner);
        let mut rng = ChaCha8Rng::seed_from_u64(episode.0);
        rng.set_stream(slot as u64);
        pick(&mut rng, &pool).ok_or(LeagueError::EmptyPool {
            agent: Some(learner),
        })
    }

    /// Policies for slots `0..slots` of `episode`.
    pub fn matchup(
        &self,
        episode: EpisodeId,
        slots: usize,
    ) -> Result<Vec<PolicyId>, LeagueError> {
        (0..slots).map(|slot| self.policy_for(episode, slot)).collect()
    }
}

fn pick(rng: &mut ChaCha8Rng, pool: &[PolicyId]) -> Option<PolicyId> {
    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.random_range(0..pool.len())])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(agents: &[(u32, LeagueAgent)]) -> IndexMap<PolicyId, LeagueAgent> {
        agents.iter().map(|&(id, a)| (PolicyId(id), a)).collect()
    }

    #[test]
    fn empty_roster_has_no_learner() {
        let mm = Matchmaker::empty();
        assert!(matches!(
            mm.policy_for(EpisodeId(1), 0),
            Err(LeagueError::EmptyPool { agent: None })
        ));
    }

    #[test]
    fn dangling_exploiter_rejected() {
        let r = roster(&[
            (0, LeagueAgent::Main),
            (1, LeagueAgent::Exploiter {
                target: PolicyId(7),
            }),
        ]);
        assert!(matches!(
            Matchmaker::new(1, r),
            Err(LeagueError::EmptyPool {
                agent: Some(PolicyId(1))
            })
        ));
    }

    #[test]
    fn pools_by_role() {
        let mm = Matchmaker::new(
            1,
            roster(&[
                (0, LeagueAgent::Main),
                (1, LeagueAgent::Exploiter {
                    target: PolicyId(0),
                }),
                (2, LeagueAgent::Clone {
                    source: PolicyId(0),
                }),
                (3, LeagueAgent::Main),
            ]),
        )
        .unwrap();
        assert_eq!(
            mm.opponent_pool(PolicyId(0)),
            vec![PolicyId(0), PolicyId(2), PolicyId(3)]
        );
        assert_eq!(mm.opponent_pool(PolicyId(1)), vec![PolicyId(0)]);
        assert!(mm.opponent_pool(PolicyId(2)).is_empty());
        assert_eq!(mm.trainable(), &[PolicyId(0), PolicyId(1), PolicyId(3)]);
        assert!(!mm.is_trainable(PolicyId(2)));
    }

    #[test]
    fn slot_zero_matches_learner() {
        let mm = Matchmaker::new(1, roster(&[(0, LeagueAgent::Main), (1, LeagueAgent::Main)]))
            .unwrap();
        for e in 0..50 {
            let ep = EpisodeId(e);
            assert_eq!(mm.policy_for(ep, 0).unwrap(), mm.learner(ep).unwrap());
        }
    }
}
