//! The episode loop.

use tracing::{debug, info, trace, warn};

use warlock_codec::{
    decode_order, decode_shop_action, encode_action_mask, encode_observation,
    encode_shop_action_mask, encode_shop_observation, ActionMask, ActionPhase, Observation,
    Perspective, ShopDecision,
};
use warlock_core::{EntityId, GameEvent, SimulationState};
use warlock_link::{SimulationLink, StartOptions, Transport};

use crate::config::EpisodeConfig;
use crate::error::EpisodeError;
use crate::policy::{Policy, PolicySpec};
use crate::reward::{is_terminal, round_results, step_reward, RoundResult};

/// Where an episode is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodePhase {
    /// No `start` issued yet.
    NotStarted,
    /// The simulation is in its shop phase.
    Shopping,
    /// A round is in progress.
    Round,
    /// The episode has terminated.
    Terminal,
}

impl EpisodePhase {
    fn of(state: &SimulationState, terminal: bool) -> Self {
        if terminal {
            Self::Terminal
        } else if state.phase.is_round() {
            Self::Round
        } else {
            Self::Shopping
        }
    }
}

/// Summary of one finished episode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpisodeOutcome {
    /// Policy decisions taken (per slot).
    pub steps: u64,
    /// `RoundOver` events observed.
    pub rounds_played: u32,
    /// Undiscounted reward sum per slot.
    pub returns: Vec<f64>,
    /// Rounds won outright per slot.
    pub wins: Vec<u32>,
    /// The episode reached a terminal state.
    pub terminated: bool,
    /// The episode hit `max_steps` before terminating.
    pub truncated: bool,
    /// Non-no-op actions that decoded to nothing.
    pub advisories: u64,
    /// Simulation frame at the end of the episode.
    pub final_frame: u64,
}

impl EpisodeOutcome {
    /// Whether slot `slot` won more rounds than every other slot.
    pub fn is_winner(&self, slot: usize) -> bool {
        let Some(&mine) = self.wins.get(slot) else {
            return false;
        };
        self.wins
            .iter()
            .enumerate()
            .all(|(i, &w)| i == slot || w < mine)
    }
}

/// Runs episodes with a fixed configuration.
///
/// Stateless between runs: one controller can drive any number of
/// episodes over the same link.
#[derive(Clone, Debug)]
pub struct EpisodeController {
    config: EpisodeConfig,
}

impl EpisodeController {
    /// Validate `config` and build a controller.
    pub fn new(config: EpisodeConfig) -> Result<Self, EpisodeError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Number of policy slots per episode.
    pub fn slots(&self) -> usize {
        self.config.player_count as usize
    }

    /// Check every policy against the codec's shapes.
    pub fn check_policies<P: Policy>(&self, policies: &[P]) -> Result<(), EpisodeError> {
        if policies.len() != self.slots() {
            return Err(EpisodeError::PolicyCount {
                expected: self.slots(),
                actual: policies.len(),
            });
        }
        let expected = PolicySpec::codec();
        for (slot, policy) in policies.iter().enumerate() {
            let declared = policy.spec();
            for phase in [ActionPhase::Round, ActionPhase::Shop] {
                if declared.phase(phase) != expected.phase(phase) {
                    return Err(EpisodeError::ShapeMismatch {
                        slot,
                        phase,
                        expected: expected.phase(phase),
                        actual: declared.phase(phase),
                    });
                }
            }
        }
        Ok(())
    }

    /// Play one episode on `link`, slot `i` controlled by `policies[i]`.
    ///
    /// The link's pending recording is flushed with
    /// [`finish_episode`](SimulationLink::finish_episode) whether the
    /// episode ends normally or with an error. Policies are checked
    /// before anything is sent to the simulation.
    pub fn run<T: Transport, P: Policy>(
        &self,
        link: &mut SimulationLink<T>,
        seed: Option<u64>,
        policies: &mut [P],
    ) -> Result<EpisodeOutcome, EpisodeError> {
        self.check_policies(policies)?;

        let result = self.play(link, seed, policies);
        match (result, link.finish_episode()) {
            (Ok(outcome), Ok(_)) => Ok(outcome),
            (Ok(_), Err(flush)) => Err(flush.into()),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(flush)) => {
                warn!(error = %flush, "replay flush failed after episode error");
                Err(e)
            }
        }
    }

    fn play<T: Transport, P: Policy>(
        &self,
        link: &mut SimulationLink<T>,
        seed: Option<u64>,
        policies: &mut [P],
    ) -> Result<EpisodeOutcome, EpisodeError> {
        let cfg = &self.config;
        let mut options = StartOptions::new(cfg.player_count).logged(cfg.log_episode);
        if let Some(seed) = seed {
            options = options.seed(seed);
        }
        if let Some(dt) = cfg.delta_time {
            options = options.delta_time(dt);
        }
        if let Some(gold) = cfg.start_gold {
            options = options.start_gold(gold);
        }

        let mut phase = EpisodePhase::NotStarted;
        let mut state = link.start_with(options)?;

        let players = state.player_ids();
        if players.len() != self.slots() {
            return Err(EpisodeError::PlayerCount {
                expected: self.slots(),
                actual: players.len(),
            });
        }
        let views = perspectives(&players);
        let mut outcome = EpisodeOutcome {
            returns: vec![0.0; views.len()],
            wins: vec![0; views.len()],
            ..Default::default()
        };

        let mut terminal = is_terminal(&state, cfg.max_rounds, &players);
        transition(&mut phase, EpisodePhase::of(&state, terminal), &state);
        info!(players = players.len(), seed = ?seed, "episode started");

        while !terminal {
            if cfg.max_steps.is_some_and(|max| outcome.steps >= max) {
                outcome.truncated = true;
                break;
            }

            let action_phase = if state.phase.is_round() {
                ActionPhase::Round
            } else {
                ActionPhase::Shop
            };
            for (policy, &view) in policies.iter_mut().zip(&views) {
                let (observation, mask) = encode(&state, view, action_phase)?;
                let action = policy.act(action_phase, &observation, &mask);
                let submitted = match action_phase {
                    ActionPhase::Round => {
                        match decode_order(&state, view, &action, cfg.target_mode) {
                            Some(order) => {
                                link.set_order(view.self_id, Some(order))?;
                                true
                            }
                            None => false,
                        }
                    }
                    ActionPhase::Shop => match decode_shop_action(&state, view, &action) {
                        Some(ShopDecision::Ready) => {
                            link.set_ready(view.self_id, true)?;
                            true
                        }
                        Some(ShopDecision::Buy(ability)) => {
                            link.buy_ability(view.self_id, ability)?;
                            true
                        }
                        None => false,
                    },
                };
                if !submitted && action.category != 0 {
                    outcome.advisories += 1;
                    trace!(
                        entity = %view.self_id,
                        category = action.category,
                        phase = ?action_phase,
                        "action decoded to no-op"
                    );
                }
            }

            let next = link.advance(cfg.frames_per_step)?;
            outcome.steps += 1;
            terminal = is_terminal(&next, cfg.max_rounds, &players);

            for (slot, (policy, &view)) in policies.iter_mut().zip(&views).enumerate() {
                let reward = step_reward(
                    &state,
                    &next,
                    view,
                    cfg.health_reward_scale,
                    cfg.win_reward,
                );
                outcome.returns[slot] += reward;
                outcome.wins[slot] += round_results(&next, view)
                    .filter(|r| *r == RoundResult::Won)
                    .count() as u32;
                policy.observe(reward, terminal);
            }
            outcome.rounds_played += next
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::RoundOver { .. }))
                .count() as u32;

            transition(&mut phase, EpisodePhase::of(&next, terminal), &next);
            state = next;
        }

        outcome.terminated = terminal;
        outcome.final_frame = state.frame;
        info!(
            steps = outcome.steps,
            rounds = outcome.rounds_played,
            terminated = outcome.terminated,
            truncated = outcome.truncated,
            advisories = outcome.advisories,
            "episode finished"
        );
        Ok(outcome)
    }
}

/// Slot `i` plays `players[i]` against `players[(i + 1) % n]`.
fn perspectives(players: &[EntityId]) -> Vec<Perspective> {
    let n = players.len();
    (0..n)
        .map(|i| Perspective::new(players[i], players[(i + 1) % n]))
        .collect()
}

fn encode(
    state: &SimulationState,
    view: Perspective,
    phase: ActionPhase,
) -> Result<(Observation, ActionMask), EpisodeError> {
    Ok(match phase {
        ActionPhase::Round => (
            encode_observation(state, view)?,
            encode_action_mask(state, view.self_id)?,
        ),
        ActionPhase::Shop => (
            encode_shop_observation(state, view)?,
            encode_shop_action_mask(state, view.self_id)?,
        ),
    })
}

fn transition(current: &mut EpisodePhase, next: EpisodePhase, state: &SimulationState) {
    if *current != next {
        debug!(
            from = ?*current,
            to = ?next,
            frame = state.frame,
            round = state.round,
            "episode phase"
        );
        *current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perspectives_pair_each_slot_with_the_next() {
        let ids = [EntityId(1000), EntityId(1001), EntityId(1002)];
        let views = perspectives(&ids);
        assert_eq!(views[0], Perspective::new(EntityId(1000), EntityId(1001)));
        assert_eq!(views[2], Perspective::new(EntityId(1002), EntityId(1000)));
    }

    #[test]
    fn outright_winner_needs_strictly_most_wins() {
        let outcome = EpisodeOutcome {
            wins: vec![2, 1],
            ..Default::default()
        };
        assert!(outcome.is_winner(0));
        assert!(!outcome.is_winner(1));
        let tied = EpisodeOutcome {
            wins: vec![1, 1],
            ..Default::default()
        };
        assert!(!tied.is_winner(0));
        assert!(!tied.is_winner(5));
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let cfg = EpisodeConfig {
            frames_per_step: 0,
            ..Default::default()
        };
        assert!(matches!(
            EpisodeController::new(cfg),
            Err(EpisodeError::Config(_))
        ));
    }
}
