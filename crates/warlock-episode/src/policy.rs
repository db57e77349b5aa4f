//! The policy interface consumed by the controller.

use warlock_codec::{Action, ActionMask, ActionPhase, Observation, PhaseShape, ROUND_SHAPE, SHOP_SHAPE};

/// Tensor shapes a policy was built for.
///
/// Must equal [`PolicySpec::codec()`] exactly; any difference is a fatal
/// configuration error at episode start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PolicySpec {
    /// Round-phase shape.
    pub round: PhaseShape,
    /// Shop-phase shape.
    pub shop: PhaseShape,
}

impl PolicySpec {
    /// The shapes the codec produces.
    pub const fn codec() -> Self {
        Self {
            round: ROUND_SHAPE,
            shop: SHOP_SHAPE,
        }
    }

    /// Shape for one phase.
    pub fn phase(&self, phase: ActionPhase) -> PhaseShape {
        match phase {
            ActionPhase::Round => self.round,
            ActionPhase::Shop => self.shop,
        }
    }
}

/// A decision-maker controlling one slot for one episode.
///
/// The controller calls [`act`](Self::act) once per step and then
/// [`observe`](Self::observe) once with that step's reward.
pub trait Policy: Send {
    /// Shapes this policy expects.
    fn spec(&self) -> PolicySpec;

    /// Choose an action. The mask is advisory: illegal choices decode
    /// to a no-op.
    fn act(&mut self, phase: ActionPhase, observation: &Observation, mask: &ActionMask)
        -> Action;

    /// Receive the reward of the last action.
    fn observe(&mut self, reward: f64, terminated: bool);
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn spec(&self) -> PolicySpec {
        (**self).spec()
    }

    fn act(
        &mut self,
        phase: ActionPhase,
        observation: &Observation,
        mask: &ActionMask,
    ) -> Action {
        (**self).act(phase, observation, mask)
    }

    fn observe(&mut self, reward: f64, terminated: bool) {
        (**self).observe(reward, terminated)
    }
}
