//! Full episodes against the in-process fake simulation.

use std::sync::{Arc, Mutex};

use warlock_codec::{Action, ActionPhase, PhaseShape, ROUND_SHAPE};
use warlock_core::AbilityId;
use warlock_episode::{EpisodeConfig, EpisodeController, EpisodeError, Policy, PolicySpec};
use warlock_link::{LinkError, ProcessError, SimulationLink};
use warlock_replay::MemoryReplaySink;
use warlock_test_utils::{
    ConstantPolicy, FakeConfig, FakeSimulation, FaultKind, RecordedStep, RecordingPolicy,
    ScheduledDamage, ScriptedPolicy,
};

fn config(max_rounds: u32) -> EpisodeConfig {
    EpisodeConfig {
        max_rounds,
        frames_per_step: 5,
        ..Default::default()
    }
}

fn damage(frame: u64, player: usize, amount: f64) -> ScheduledDamage {
    ScheduledDamage {
        frame,
        player,
        amount,
    }
}

/// Both players ready at once, so round 1 starts at frame 1. Player 1
/// takes 10 damage at frame 12 and dies at frame 20.
fn one_sided_round() -> FakeSimulation {
    FakeSimulation::new(FakeConfig {
        damage: vec![damage(12, 1, 10.0), damage(20, 1, 100.0)],
        ..Default::default()
    })
}

fn rewards(log: &Arc<Mutex<Vec<RecordedStep>>>) -> Vec<f64> {
    RecordingPolicy::<ConstantPolicy>::steps(log)
        .iter()
        .map(|s| s.reward.unwrap())
        .collect()
}

#[test]
fn rewards_follow_damage_and_round_outcome() {
    let mut link = SimulationLink::new(one_sided_round());
    let controller = EpisodeController::new(config(1)).unwrap();
    let a = RecordingPolicy::new(ConstantPolicy::ready());
    let b = RecordingPolicy::new(ConstantPolicy::ready());
    let (log_a, log_b) = (a.log(), b.log());
    let mut policies = vec![a, b];

    let outcome = controller.run(&mut link, Some(7), &mut policies).unwrap();

    assert!(outcome.terminated);
    assert!(!outcome.truncated);
    assert_eq!(outcome.steps, 4);
    assert_eq!(outcome.rounds_played, 1);
    assert_eq!(outcome.wins, vec![1, 0]);
    assert_eq!(outcome.final_frame, 20);
    assert!(outcome.is_winner(0));

    let ra = rewards(&log_a);
    let rb = rewards(&log_b);
    let expected = [0.0, 0.0, 0.10, 1.0];
    for (got, want) in ra.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "slot 0 rewards {ra:?}");
    }
    for (got, want) in rb.iter().zip(expected) {
        assert!((got + want).abs() < 1e-9, "slot 1 rewards {rb:?}");
    }
    assert!((outcome.returns[0] - 1.10).abs() < 1e-9);
    assert!((outcome.returns[1] + 1.10).abs() < 1e-9);

    let steps = RecordingPolicy::<ConstantPolicy>::steps(&log_a);
    assert_eq!(steps[0].phase, ActionPhase::Shop);
    assert_eq!(steps[1].phase, ActionPhase::Round);
    assert_eq!(steps[1].observation.len(), ROUND_SHAPE.observation_len);
    assert!(steps[3].terminated);
    assert!(steps[..3].iter().all(|s| !s.terminated));
}

#[test]
fn zero_health_mid_round_terminates() {
    // With three players the round continues after one dies.
    let fake = FakeSimulation::new(FakeConfig {
        damage: vec![damage(8, 2, 100.0)],
        ..Default::default()
    });
    let mut link = SimulationLink::new(fake);
    let controller = EpisodeController::new(EpisodeConfig {
        player_count: 3,
        ..config(5)
    })
    .unwrap();
    let mut policies = vec![ConstantPolicy::ready(); 3];

    let outcome = controller.run(&mut link, None, &mut policies).unwrap();
    assert!(outcome.terminated);
    assert_eq!(outcome.rounds_played, 0);
    assert_eq!(outcome.final_frame, 10);
}

#[test]
fn truncation_is_reported_separately() {
    let mut link = SimulationLink::new(FakeSimulation::default());
    let controller = EpisodeController::new(EpisodeConfig {
        max_steps: Some(3),
        ..config(1)
    })
    .unwrap();
    let mut policies = vec![ConstantPolicy::idle(), ConstantPolicy::idle()];

    let outcome = controller.run(&mut link, None, &mut policies).unwrap();
    assert!(outcome.truncated);
    assert!(!outcome.terminated);
    assert_eq!(outcome.steps, 3);
    assert_eq!(outcome.final_frame, 15);
    assert_eq!(outcome.returns, vec![0.0, 0.0]);
}

#[test]
fn shape_mismatch_is_fatal_before_start() {
    let fake = FakeSimulation::default();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake);
    let controller = EpisodeController::new(config(1)).unwrap();
    let wrong = PolicySpec {
        round: PhaseShape {
            observation_len: ROUND_SHAPE.observation_len + 1,
            ..ROUND_SHAPE
        },
        ..PolicySpec::codec()
    };
    let mut policies = vec![
        ConstantPolicy::ready(),
        ConstantPolicy::ready().with_spec(wrong),
    ];

    let err = controller.run(&mut link, None, &mut policies).unwrap_err();
    match err {
        EpisodeError::ShapeMismatch {
            slot,
            phase,
            expected,
            actual,
        } => {
            assert_eq!(slot, 1);
            assert_eq!(phase, ActionPhase::Round);
            assert_eq!(expected, ROUND_SHAPE);
            assert_eq!(actual, wrong.round);
        }
        other => panic!("expected shape mismatch, got {other:?}"),
    }
    assert!(link.is_open());
    assert_eq!(handle.count("start"), 0);
}

#[test]
fn policy_count_must_match_player_count() {
    let mut link = SimulationLink::new(FakeSimulation::default());
    let controller = EpisodeController::new(config(1)).unwrap();
    let mut policies = vec![ConstantPolicy::ready()];
    assert!(matches!(
        controller.run(&mut link, None, &mut policies),
        Err(EpisodeError::PolicyCount {
            expected: 2,
            actual: 1
        })
    ));
}

#[test]
fn boxed_trait_objects_are_policies() {
    let mut link = SimulationLink::new(one_sided_round());
    let controller = EpisodeController::new(config(1)).unwrap();
    let mut policies: Vec<Box<dyn Policy>> = vec![
        Box::new(ConstantPolicy::ready()),
        Box::new(ScriptedPolicy::new([Action::new(1)])),
    ];
    let outcome = controller.run(&mut link, None, &mut policies).unwrap();
    assert_eq!(outcome.wins, vec![1, 0]);
}

#[test]
fn undecodable_actions_count_as_advisories() {
    let fake = one_sided_round();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake);
    let controller = EpisodeController::new(config(1)).unwrap();
    // Category 4 is teleport, which neither player owns.
    let teleport = Action::targeted(4, [0.6, 0.6]);
    let mut policies = vec![
        ConstantPolicy::ready().with_round(teleport),
        ConstantPolicy::ready().with_round(Action::targeted(2, [0.6, 0.5])),
    ];

    let outcome = controller.run(&mut link, None, &mut policies).unwrap();
    assert_eq!(outcome.advisories, 3);
    // Only the move orders reached the simulation, one per round step.
    assert_eq!(handle.count("setOrder"), 3);
}

#[test]
fn shop_purchases_are_submitted() {
    let fake = one_sided_round();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake);
    let controller = EpisodeController::new(config(1)).unwrap();
    // Buy teleport (shop category 2 + 1), then ready up.
    let buyer = ScriptedPolicy::new([Action::new(3)]);
    let mut policies: Vec<Box<dyn Policy>> =
        vec![Box::new(buyer), Box::new(ConstantPolicy::ready())];

    controller.run(&mut link, None, &mut policies).unwrap();
    assert_eq!(handle.count("buyAbility"), 1);
    let state = link.state().unwrap();
    let buyer_id = state.player_ids()[0];
    assert!(state.entity(buyer_id).unwrap().owns(AbilityId::Teleport));
}

#[test]
fn logged_episode_is_flushed_on_finish() {
    let sink = MemoryReplaySink::new();
    let mut link = SimulationLink::new(one_sided_round()).with_replay_sink(sink.clone());
    let controller = EpisodeController::new(EpisodeConfig {
        log_episode: true,
        ..config(1)
    })
    .unwrap();
    let mut policies = vec![ConstantPolicy::ready(), ConstantPolicy::ready()];

    controller.run(&mut link, Some(3), &mut policies).unwrap();
    assert_eq!(sink.len(), 1);
    let recordings = sink.recordings();
    let recording = &recordings[0];
    assert_eq!(recording.seed(), Some(3));
    // Initial state plus one document per frame.
    assert_eq!(recording.len(), 21);
    assert!(!link.is_logging());
}

#[test]
fn logging_without_sink_is_rejected() {
    let mut link = SimulationLink::new(FakeSimulation::default());
    let controller = EpisodeController::new(EpisodeConfig {
        log_episode: true,
        ..config(1)
    })
    .unwrap();
    let mut policies = vec![ConstantPolicy::ready(), ConstantPolicy::ready()];
    assert!(matches!(
        controller.run(&mut link, None, &mut policies),
        Err(EpisodeError::Link(LinkError::ReplayUnavailable))
    ));
}

#[test]
fn process_death_mid_episode_is_fatal() {
    let mut link = SimulationLink::new(FakeSimulation::with_fault(3, FaultKind::Exit));
    let controller = EpisodeController::new(config(1)).unwrap();
    let mut policies = vec![ConstantPolicy::ready(), ConstantPolicy::ready()];

    let err = controller.run(&mut link, None, &mut policies).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        EpisodeError::Link(LinkError::Process(ProcessError::Exited { .. }))
    ));
    assert!(!link.is_open());
}

#[test]
fn controller_reuses_link_across_episodes() {
    let fake = one_sided_round();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake);
    let controller = EpisodeController::new(config(1)).unwrap();
    let mut policies = vec![ConstantPolicy::ready(), ConstantPolicy::ready()];

    let first = controller.run(&mut link, Some(1), &mut policies).unwrap();
    let second = controller.run(&mut link, Some(1), &mut policies).unwrap();
    assert_eq!(first, second);
    assert_eq!(handle.count("start"), 2);
}
