//! Link behavior against the in-process fake simulation.

use std::sync::{Arc, Mutex};

use warlock_core::{EntityId, GameEvent, Order, Vec2};
use warlock_link::{
    LinkError, ProcessError, ProtocolError, SimulationLink, StartOptions, StepMode,
    DEFAULT_MAX_RESPONSE_BYTES,
};
use warlock_replay::{EpisodeRecording, MemoryReplaySink, ReplayError, ReplaySink};
use warlock_test_utils::{FakeConfig, FakeHandle, FakeSimulation, FaultKind, ScheduledDamage};

const P0: EntityId = EntityId(1000);
const P1: EntityId = EntityId(1001);

/// Start a two-player game and ready both players into round 1.
fn in_round(link: &mut SimulationLink<FakeSimulation>) {
    link.start(Some(1), 2).unwrap();
    link.set_ready(P0, true).unwrap();
    link.set_ready(P1, true).unwrap();
    let state = link.advance(1).unwrap();
    assert!(state.phase.is_round());
}

fn fault_on_start(kind: FaultKind) -> LinkError {
    let mut link = SimulationLink::new(FakeSimulation::with_fault(0, kind));
    let err = link.start(None, 2).unwrap_err();
    assert!(err.is_fatal());
    assert!(!link.is_open(), "fatal error must close the link");
    err
}

#[test]
fn last_order_before_step_wins() {
    let fake = FakeSimulation::default();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake);
    in_round(&mut link);

    let first = Order::Move {
        target: Vec2::new(10.0, 0.0),
    };
    let second = Order::Move {
        target: Vec2::new(-10.0, 5.0),
    };
    link.set_order(P0, Some(first)).unwrap();
    link.set_order(P0, Some(second.clone())).unwrap();
    link.advance(1).unwrap();

    assert_eq!(handle.applied_orders(), vec![(2, P0, second)]);
}

#[test]
fn cleared_order_is_not_applied() {
    let fake = FakeSimulation::default();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake);
    in_round(&mut link);

    link.set_order(P1, Some(Order::Stop)).unwrap();
    link.set_order(P1, None).unwrap();
    link.advance(2).unwrap();
    assert!(handle.applied_orders().is_empty());
}

#[test]
fn silent_exit_is_a_process_error() {
    let err = fault_on_start(FaultKind::Exit);
    assert!(
        matches!(
            err,
            LinkError::Process(ProcessError::Exited { status: Some(ref s) }) if s == "exit status: 1"
        ),
        "{err:?}"
    );
}

#[test]
fn partial_document_is_truncation() {
    let err = fault_on_start(FaultKind::Truncate);
    match err {
        LinkError::Process(ProcessError::Truncated { received, status }) => {
            assert!(received > 0);
            assert!(status.is_some());
        }
        other => panic!("expected truncation, got {other:?}"),
    }
}

#[test]
fn garbage_is_malformed_not_exited() {
    let err = fault_on_start(FaultKind::Garbage);
    assert!(
        matches!(err, LinkError::Protocol(ProtocolError::Malformed { .. })),
        "{err:?}"
    );
}

#[test]
fn oversized_response_is_rejected() {
    let err = fault_on_start(FaultKind::Oversize);
    assert!(
        matches!(
            err,
            LinkError::Protocol(ProtocolError::ResponseTooLarge { limit })
                if limit == DEFAULT_MAX_RESPONSE_BYTES
        ),
        "{err:?}"
    );
}

#[test]
fn schema_violation_is_reported() {
    let err = fault_on_start(FaultKind::SchemaViolation);
    assert!(
        matches!(err, LinkError::Protocol(ProtocolError::Schema { .. })),
        "{err:?}"
    );
}

#[test]
fn frame_regression_is_detected() {
    let mut link = SimulationLink::new(FakeSimulation::with_fault(2, FaultKind::FrameRegression));
    link.start(None, 2).unwrap();
    link.advance(1).unwrap();
    let err = link.state().unwrap_err();
    assert!(
        matches!(
            err,
            LinkError::Protocol(ProtocolError::FrameRegression {
                previous: 1,
                current: 0
            })
        ),
        "{err:?}"
    );
}

#[test]
fn poisoned_link_reports_closed() {
    let mut link = SimulationLink::new(FakeSimulation::with_fault(0, FaultKind::Garbage));
    assert!(link.start(None, 2).is_err());
    assert!(matches!(link.state(), Err(LinkError::Closed)));
    assert!(matches!(link.start(None, 2), Err(LinkError::Closed)));
    // Closing an already-failed link is fine.
    link.close().unwrap();
}

#[test]
fn commands_before_start_are_rejected() {
    let fake = FakeSimulation::default();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake);
    let err = link.advance(1).unwrap_err();
    assert!(matches!(err, LinkError::NotStarted));
    assert!(!err.is_fatal());
    assert!(link.is_open());
    assert!(matches!(
        link.set_order(P0, Some(Order::Stop)),
        Err(LinkError::NotStarted)
    ));
    assert!(handle.commands().is_empty());
}

#[test]
fn per_frame_stepping_keeps_every_event() {
    let fake = FakeSimulation::new(FakeConfig {
        damage: vec![ScheduledDamage {
            frame: 3,
            player: 1,
            amount: 100.0,
        }],
        ..Default::default()
    });
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake);
    in_round(&mut link);

    let state = link.advance(5).unwrap();
    assert_eq!(state.frame, 6);
    assert!(state.phase.is_shop());
    assert_eq!(
        state.events.as_slice(),
        &[GameEvent::RoundOver { winners: vec![P0] }]
    );
    // One step per frame: 1 for `in_round`, 5 here.
    assert_eq!(handle.count("step"), 6);
}

#[test]
fn batched_stepping_sends_one_step() {
    let fake = FakeSimulation::default();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake).with_step_mode(StepMode::Batched);
    link.start(None, 2).unwrap();
    let state = link.advance(12).unwrap();
    assert_eq!(state.frame, 12);
    assert_eq!(handle.count("step"), 1);
    assert_eq!(handle.count("getComponents"), 2);
}

#[test]
fn logging_forces_per_frame_stepping() {
    let fake = FakeSimulation::default();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake)
        .with_step_mode(StepMode::Batched)
        .with_replay_sink(MemoryReplaySink::new());
    link.start_with(StartOptions::new(2).logged(true)).unwrap();
    link.advance(4).unwrap();
    assert_eq!(handle.count("step"), 4);
}

#[test]
fn start_flushes_pending_history() {
    let sink = MemoryReplaySink::new();
    let mut link = SimulationLink::new(FakeSimulation::default()).with_replay_sink(sink.clone());

    link.start_with(StartOptions::new(2).seed(5).logged(true)).unwrap();
    link.advance(3).unwrap();
    assert!(sink.is_empty());

    link.start_with(StartOptions::new(2).logged(true)).unwrap();
    assert_eq!(sink.len(), 1);
    let recordings = sink.recordings();
    let first = &recordings[0];
    assert_eq!(first.seed(), Some(5));
    assert_eq!(first.len(), 4);

    assert!(link.finish_episode().unwrap());
    assert!(!link.finish_episode().unwrap());
    assert_eq!(sink.len(), 2);
    assert_ne!(sink.recordings()[0].game_id(), sink.recordings()[1].game_id());
}

/// Notes how many `start` commands the simulation had received at each
/// persist.
struct StartCounter {
    handle: FakeHandle,
    seen: Arc<Mutex<Vec<usize>>>,
}

impl ReplaySink for StartCounter {
    fn persist(&mut self, _: EpisodeRecording) -> Result<(), ReplayError> {
        self.seen.lock().unwrap().push(self.handle.count("start"));
        Ok(())
    }
}

#[test]
fn history_is_persisted_before_next_start_is_sent() {
    let fake = FakeSimulation::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = StartCounter {
        handle: fake.handle(),
        seen: Arc::clone(&seen),
    };
    let mut link = SimulationLink::new(fake).with_replay_sink(sink);

    link.start_with(StartOptions::new(2).logged(true)).unwrap();
    link.advance(2).unwrap();
    link.start_with(StartOptions::new(2).logged(true)).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![1]);

    link.advance(1).unwrap();
    link.finish_episode().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}

#[test]
fn logging_requires_a_sink() {
    let fake = FakeSimulation::default();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake);
    let err = link.start_with(StartOptions::new(2).logged(true)).unwrap_err();
    assert!(matches!(err, LinkError::ReplayUnavailable));
    assert_eq!(handle.count("start"), 0);
}

#[test]
fn close_is_idempotent_and_discards_recording() {
    let sink = MemoryReplaySink::new();
    let fake = FakeSimulation::default();
    let handle = fake.handle();
    let mut link = SimulationLink::new(fake).with_replay_sink(sink.clone());
    link.start_with(StartOptions::new(2).logged(true)).unwrap();

    link.close().unwrap();
    link.close().unwrap();
    drop(link);

    assert_eq!(handle.shutdowns(), 1);
    assert!(sink.is_empty());
}

#[test]
fn drop_shuts_down_transport() {
    let fake = FakeSimulation::default();
    let handle = fake.handle();
    {
        let mut link = SimulationLink::new(fake);
        link.start(None, 2).unwrap();
    }
    assert_eq!(handle.shutdowns(), 1);
}
