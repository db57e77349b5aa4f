//! Deterministic policies for controller and league tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use warlock_codec::{Action, ActionMask, ActionPhase, Observation};
use warlock_episode::{Policy, PolicySpec};

/// Always plays the same action per phase.
#[derive(Clone, Debug)]
pub struct ConstantPolicy {
    pub round: Action,
    pub shop: Action,
    pub spec: PolicySpec,
}

impl ConstantPolicy {
    /// No-op in both phases; the shop only ends when its timer expires.
    pub fn idle() -> Self {
        Self {
            round: Action::NOOP,
            shop: Action::NOOP,
            spec: PolicySpec::codec(),
        }
    }

    /// Marks ready in the shop and idles in rounds.
    pub fn ready() -> Self {
        Self {
            shop: Action::new(1),
            ..Self::idle()
        }
    }

    pub fn with_round(mut self, action: Action) -> Self {
        self.round = action;
        self
    }

    /// Declare different shapes than the codec produces.
    pub fn with_spec(mut self, spec: PolicySpec) -> Self {
        self.spec = spec;
        self
    }
}

impl Policy for ConstantPolicy {
    fn spec(&self) -> PolicySpec {
        self.spec
    }

    fn act(&mut self, phase: ActionPhase, _: &Observation, _: &ActionMask) -> Action {
        match phase {
            ActionPhase::Round => self.round,
            ActionPhase::Shop => self.shop,
        }
    }

    fn observe(&mut self, _: f64, _: bool) {}
}

/// Plays queued actions in order, then falls back to a [`ConstantPolicy`].
#[derive(Clone, Debug)]
pub struct ScriptedPolicy {
    script: VecDeque<Action>,
    fallback: ConstantPolicy,
}

impl ScriptedPolicy {
    pub fn new(script: impl IntoIterator<Item = Action>) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback: ConstantPolicy::ready(),
        }
    }

    pub fn then(mut self, fallback: ConstantPolicy) -> Self {
        self.fallback = fallback;
        self
    }
}

impl Policy for ScriptedPolicy {
    fn spec(&self) -> PolicySpec {
        self.fallback.spec
    }

    fn act(&mut self, phase: ActionPhase, obs: &Observation, mask: &ActionMask) -> Action {
        match self.script.pop_front() {
            Some(action) => action,
            None => self.fallback.act(phase, obs, mask),
        }
    }

    fn observe(&mut self, _: f64, _: bool) {}
}

/// One `act`/`observe` pair seen by a [`RecordingPolicy`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedStep {
    pub phase: ActionPhase,
    pub observation: Vec<f32>,
    pub mask: Vec<u8>,
    pub action: Action,
    pub reward: Option<f64>,
    pub terminated: bool,
}

/// Wraps a policy and records every call.
///
/// The log is shared, so keep a [`RecordingPolicy::log`] handle before
/// moving the policy into a controller.
#[derive(Debug)]
pub struct RecordingPolicy<P> {
    inner: P,
    log: Arc<Mutex<Vec<RecordedStep>>>,
}

impl<P: Policy> RecordingPolicy<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            log: Arc::default(),
        }
    }

    pub fn log(&self) -> Arc<Mutex<Vec<RecordedStep>>> {
        Arc::clone(&self.log)
    }

    /// Snapshot of a shared log.
    pub fn steps(log: &Arc<Mutex<Vec<RecordedStep>>>) -> Vec<RecordedStep> {
        log.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl<P: Policy> Policy for RecordingPolicy<P> {
    fn spec(&self) -> PolicySpec {
        self.inner.spec()
    }

    fn act(&mut self, phase: ActionPhase, obs: &Observation, mask: &ActionMask) -> Action {
        let action = self.inner.act(phase, obs, mask);
        self.log
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(RecordedStep {
                phase,
                observation: obs.as_slice().to_vec(),
                mask: mask.as_slice().to_vec(),
                action,
                reward: None,
                terminated: false,
            });
        action
    }

    fn observe(&mut self, reward: f64, terminated: bool) {
        if let Some(last) = self
            .log
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .last_mut()
        {
            last.reward = Some(reward);
            last.terminated = terminated;
        }
        self.inner.observe(reward, terminated);
    }
}
