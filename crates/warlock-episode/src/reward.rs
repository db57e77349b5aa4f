//! Per-step reward and termination.
//!
//! Both are pure functions of consecutive states so they can be tested
//! without a simulation.

use warlock_codec::Perspective;
use warlock_core::{EntityId, GameEvent, SimulationState};

/// Outcome of one `RoundOver` event for a pair of players.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundResult {
    /// Self survived, the opponent did not.
    Won,
    /// The opponent survived, self did not.
    Lost,
    /// Both or neither survived.
    Draw,
}

/// Results of every round that ended in `state`'s event batch, seen
/// from `view`.
pub fn round_results(
    state: &SimulationState,
    view: Perspective,
) -> impl Iterator<Item = RoundResult> + '_ {
    state.events.iter().filter_map(move |event| match event {
        GameEvent::RoundOver { winners } => {
            let mine = winners.contains(&view.self_id);
            let theirs = winners.contains(&view.other_id);
            Some(match (mine, theirs) {
                (true, false) => RoundResult::Won,
                (false, true) => RoundResult::Lost,
                _ => RoundResult::Draw,
            })
        }
        GameEvent::AbilityUsed { .. } => None,
    })
}

/// Reward for `view.self_id` over the step `prev → next`.
///
/// Health shaping applies only while both states are in the same round:
/// `((other_prev - other_now) + (self_now - self_prev)) / scale`, where
/// `scale` defaults to self's maximum health. Each round that ended
/// during the step adds `win_reward` if only self survived and subtracts
/// it if only the opponent did.
pub fn step_reward(
    prev: &SimulationState,
    next: &SimulationState,
    view: Perspective,
    health_scale: Option<f64>,
    win_reward: f64,
) -> f64 {
    let mut reward = 0.0;

    if prev.phase.is_round() && next.phase.is_round() && prev.round == next.round {
        let scale = health_scale.unwrap_or_else(|| max_health(next, view.self_id));
        if scale > 0.0 {
            let dealt = prev.health_of(view.other_id) - next.health_of(view.other_id);
            let kept = next.health_of(view.self_id) - prev.health_of(view.self_id);
            reward += (dealt + kept) / scale;
        }
    }

    for result in round_results(next, view) {
        match result {
            RoundResult::Won => reward += win_reward,
            RoundResult::Lost => reward -= win_reward,
            RoundResult::Draw => {}
        }
    }
    reward
}

fn max_health(state: &SimulationState, id: EntityId) -> f64 {
    state
        .entity(id)
        .and_then(|e| e.health)
        .map(|h| h.maximum)
        .unwrap_or(0.0)
}

/// Whether the episode is over after reaching `state`.
///
/// True once `max_rounds` rounds have been played and the simulation is
/// back in the shop, or when any of `players` is at zero health while a
/// round is in progress.
pub fn is_terminal(state: &SimulationState, max_rounds: u32, players: &[EntityId]) -> bool {
    if state.phase.is_shop() {
        return state.round >= max_rounds;
    }
    players.iter().any(|&id| state.health_of(id) <= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use warlock_core::RawState;

    fn state(phase: &str, round: u32, hp: (f64, f64), winners: Option<&[u64]>) -> SimulationState {
        let state = if phase == "round" {
            json!({"type": "round", "startFrame": 0})
        } else {
            json!({"type": "shop", "startFrame": 0, "duration": 30})
        };
        let events = match winners {
            Some(w) => json!([{"type": "roundOver", "winners": w}]),
            None => json!([]),
        };
        let doc = json!({
            "gameState": {"frameNumber": 10, "deltaTime": 0.1, "state": state, "round": round},
            "bodies": {
                "1": {"location": {"e1": 0, "e2": 0}},
                "2": {"location": {"e1": 100, "e2": 0}}
            },
            "healths": {
                "1": {"current": hp.0, "maximum": 100},
                "2": {"current": hp.1, "maximum": 100}
            },
            "units": {"1": {"state": {"type": "idle"}}, "2": {"state": {"type": "idle"}}},
            "playerOwneds": {"1": {"owningPlayerId": 1}, "2": {"owningPlayerId": 2}},
            "arena": {"radius": 640},
            "gameEvents": {"events": events}
        });
        let raw: RawState = serde_json::from_value(doc).unwrap();
        SimulationState::from_raw(&raw).unwrap()
    }

    fn view() -> Perspective {
        Perspective::new(EntityId(1), EntityId(2))
    }

    #[test]
    fn damage_dealt_scenario() {
        let prev = state("round", 1, (100.0, 100.0), None);
        let next = state("round", 1, (100.0, 90.0), None);
        let r = step_reward(&prev, &next, view(), None, 1.0);
        assert!((r - 0.10).abs() < 1e-12, "reward {r}");
        let r = step_reward(&prev, &next, view().flipped(), None, 1.0);
        assert!((r + 0.10).abs() < 1e-12, "reward {r}");
    }

    #[test]
    fn explicit_scale_overrides_max_health() {
        let prev = state("round", 1, (100.0, 100.0), None);
        let next = state("round", 1, (80.0, 90.0), None);
        let r = step_reward(&prev, &next, view(), Some(10.0), 1.0);
        assert!((r - (10.0 - 20.0) / 10.0).abs() < 1e-12);
    }

    #[test]
    fn no_shaping_across_round_boundary_or_in_shop() {
        let prev = state("round", 1, (100.0, 10.0), None);
        let next = state("shop", 1, (100.0, 100.0), Some(&[1]));
        assert_eq!(step_reward(&prev, &next, view(), None, 2.0), 2.0);
        assert_eq!(step_reward(&prev, &next, view().flipped(), None, 2.0), -2.0);

        let a = state("shop", 1, (50.0, 50.0), None);
        let b = state("shop", 1, (20.0, 50.0), None);
        assert_eq!(step_reward(&a, &b, view(), None, 1.0), 0.0);

        let a = state("round", 1, (50.0, 50.0), None);
        let b = state("round", 2, (100.0, 100.0), None);
        assert_eq!(step_reward(&a, &b, view(), None, 1.0), 0.0);
    }

    #[test]
    fn shared_survival_is_a_draw() {
        let prev = state("round", 1, (50.0, 50.0), None);
        let next = state("shop", 1, (100.0, 100.0), Some(&[1, 2]));
        assert_eq!(step_reward(&prev, &next, view(), None, 1.0), 0.0);
        let results: Vec<_> = round_results(&next, view()).collect();
        assert_eq!(results, vec![RoundResult::Draw]);
    }

    #[test]
    fn termination_rules() {
        let players = [EntityId(1), EntityId(2)];
        assert!(is_terminal(&state("shop", 3, (100.0, 100.0), None), 3, &players));
        assert!(!is_terminal(&state("shop", 2, (100.0, 100.0), None), 3, &players));
        assert!(is_terminal(&state("round", 1, (0.0, 100.0), None), 3, &players));
        assert!(!is_terminal(&state("round", 1, (1.0, 100.0), None), 3, &players));
        // Zero health in the shop is not terminal.
        assert!(!is_terminal(&state("shop", 1, (0.0, 100.0), None), 3, &players));
    }

    proptest! {
        #[test]
        fn two_player_rewards_are_zero_sum(
            before in (0.0f64..100.0, 0.0f64..100.0),
            after in (0.0f64..100.0, 0.0f64..100.0),
            winner in proptest::option::of(1u64..=2),
        ) {
            let prev = state("round", 1, before, None);
            let winners = winner.map(|w| vec![w]);
            let phase = if winners.is_some() { "shop" } else { "round" };
            let next = state(phase, 1, after, winners.as_deref());
            let mine = step_reward(&prev, &next, view(), None, 1.0);
            let theirs = step_reward(&prev, &next, view().flipped(), None, 1.0);
            prop_assert!((mine + theirs).abs() < 1e-9, "{mine} vs {theirs}");
        }
    }
}
