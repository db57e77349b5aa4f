//! Observation, action-mask and order codec for Warlock agents.
//!
//! Pure functions from a [`SimulationState`](warlock_core::SimulationState)
//! and a [`Perspective`] to fixed-length tensors, and from a policy
//! [`Action`] back to a simulation [`Order`](warlock_core::Order).
//!
//! Every observation value lies in `[0, 1]`; out-of-range inputs are
//! clamped, never wrapped. Identical inputs give bit-identical outputs.
//!
//! Two phases have separate layouts:
//!
//! | Phase | Observation | Mask | Categories |
//! |-------|-------------|------|------------|
//! | Round | [`ROUND_OBS_LEN`] | [`ROUND_ACTIONS`] | no-op, stop, move, use ability × 6 |
//! | Shop  | [`SHOP_OBS_LEN`]  | [`SHOP_ACTIONS`]  | no-op, ready, buy ability × 6 |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod error;
pub mod layout;
pub mod mask;
pub mod observation;

pub use action::{decode_order, decode_shop_action, Action, ShopDecision, TargetMode};
pub use error::CodecError;
pub use layout::{
    ActionPhase, Perspective, PhaseShape, GOLD_SCALE, MAX_ROUNDS_SCALE, OBSERVED_ABILITIES,
    PAD_VALUE, PROJECTILE_FEATURES, PROJECTILE_SLOTS, ROUND_ACTIONS, ROUND_OBS_LEN, ROUND_SHAPE,
    SHOP_ACTIONS, SHOP_OBS_LEN, SHOP_SHAPE, WORLD_SCALE,
};
pub use mask::{encode_action_mask, encode_shop_action_mask, ActionMask};
pub use observation::{
    cooldown_fraction, denormalize_position, encode_observation, encode_shop_observation,
    normalize_position, Observation,
};
