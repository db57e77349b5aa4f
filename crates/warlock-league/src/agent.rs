//! League roles, per-agent records and match results.

use warlock_core::{EpisodeId, PolicyId};
use warlock_episode::EpisodeOutcome;

/// Role of a policy in the league.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LeagueAgent {
    /// Trainable; plays Mains and Clones.
    Main,
    /// Trainable; plays only the Main it targets.
    Exploiter {
        /// The Main this agent exploits.
        target: PolicyId,
    },
    /// Frozen snapshot; never trained.
    Clone {
        /// The agent whose weights were copied.
        source: PolicyId,
    },
}

impl LeagueAgent {
    /// Whether the optimizer updates this agent.
    pub fn is_trainable(&self) -> bool {
        match self {
            Self::Main | Self::Exploiter { .. } => true,
            Self::Clone { .. } => false,
        }
    }

    /// Short role name for logs.
    pub fn role(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Exploiter { .. } => "exploiter",
            Self::Clone { .. } => "clone",
        }
    }
}

/// Games and wins of one agent.
///
/// `*_since_promotion` counters restart whenever the agent is cloned by
/// [`League::promote_eligible`](crate::League::promote_eligible).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AgentRecord {
    /// Episodes played, counted per slot.
    pub games: u64,
    /// Episodes won outright.
    pub wins: u64,
    /// Episodes played since the last promotion.
    pub games_since_promotion: u64,
    /// Episodes won since the last promotion.
    pub wins_since_promotion: u64,
}

impl AgentRecord {
    /// Record one game.
    pub fn record(&mut self, won: bool) {
        self.games += 1;
        self.games_since_promotion += 1;
        if won {
            self.wins += 1;
            self.wins_since_promotion += 1;
        }
    }

    /// Win rate since the last promotion, 0 before any game.
    pub fn recent_win_rate(&self) -> f64 {
        if self.games_since_promotion == 0 {
            0.0
        } else {
            self.wins_since_promotion as f64 / self.games_since_promotion as f64
        }
    }

    /// Restart the promotion window.
    pub fn reset_promotion_window(&mut self) {
        self.games_since_promotion = 0;
        self.wins_since_promotion = 0;
    }
}

/// Result of one episode, reported by a worker.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    /// The episode played.
    pub episode: EpisodeId,
    /// Roster version the matchup was drawn from.
    pub roster_version: u64,
    /// Policy per slot.
    pub policies: Vec<PolicyId>,
    /// Slot that won the most rounds, if any won strictly more.
    pub winner: Option<usize>,
    /// Reward sum per slot.
    pub returns: Vec<f64>,
    /// Policy decisions taken.
    pub steps: u64,
    /// The episode hit its step limit.
    pub truncated: bool,
}

impl MatchResult {
    /// Summarize an episode outcome.
    pub fn from_outcome(
        episode: EpisodeId,
        roster_version: u64,
        policies: Vec<PolicyId>,
        outcome: &EpisodeOutcome,
    ) -> Self {
        let winner = (0..policies.len()).find(|&slot| outcome.is_winner(slot));
        Self {
            episode,
            roster_version,
            policies,
            winner,
            returns: outcome.returns.clone(),
            steps: outcome.steps,
            truncated: outcome.truncated,
        }
    }
}
