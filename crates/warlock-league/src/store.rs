//! The optimizer-side policy store.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use warlock_core::PolicyId;

/// Where policy weights live.
///
/// Implemented by the external optimizer. The league only ever creates
/// policies, copies weights between them and asks for trainable weights
/// to be propagated to rollout workers.
pub trait PolicyStore {
    /// Error type of the store.
    type Error: Error + Send + Sync + 'static;

    /// Create a fresh policy under `id`.
    fn create_policy(&mut self, id: PolicyId) -> Result<(), Self::Error>;

    /// Overwrite `to`'s weights with a copy of `from`'s.
    fn snapshot_weights(&mut self, from: PolicyId, to: PolicyId) -> Result<(), Self::Error>;

    /// Propagate current trainable weights to rollout workers.
    fn push_weights(&mut self) -> Result<(), Self::Error>;
}

/// Errors of [`MemoryPolicyStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The ID already exists.
    Duplicate(PolicyId),
    /// The ID does not exist.
    Unknown(PolicyId),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(id) => write!(f, "policy {id} already exists"),
            Self::Unknown(id) => write!(f, "policy {id} does not exist"),
        }
    }
}

impl Error for StoreError {}

/// In-memory store of flat weight vectors.
///
/// New policies start from `initial` weights; `pushes` counts
/// [`push_weights`](PolicyStore::push_weights) calls.
#[derive(Clone, Debug, Default)]
pub struct MemoryPolicyStore {
    initial: Vec<f32>,
    weights: BTreeMap<PolicyId, Vec<f32>>,
    pushes: u64,
}

impl MemoryPolicyStore {
    /// Store whose new policies start from `initial`.
    pub fn new(initial: Vec<f32>) -> Self {
        Self {
            initial,
            ..Self::default()
        }
    }

    /// Weights of `id`.
    pub fn weights(&self, id: PolicyId) -> Option<&[f32]> {
        self.weights.get(&id).map(Vec::as_slice)
    }

    /// Replace the weights of an existing policy.
    pub fn set_weights(&mut self, id: PolicyId, weights: Vec<f32>) -> Result<(), StoreError> {
        let slot = self.weights.get_mut(&id).ok_or(StoreError::Unknown(id))?;
        *slot = weights;
        Ok(())
    }

    /// Number of policies.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the store holds no policies.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Number of weight pushes so far.
    pub fn pushes(&self) -> u64 {
        self.pushes
    }
}

impl PolicyStore for MemoryPolicyStore {
    type Error = StoreError;

    fn create_policy(&mut self, id: PolicyId) -> Result<(), StoreError> {
        if self.weights.contains_key(&id) {
            return Err(StoreError::Duplicate(id));
        }
        self.weights.insert(id, self.initial.clone());
        Ok(())
    }

    fn snapshot_weights(&mut self, from: PolicyId, to: PolicyId) -> Result<(), StoreError> {
        let copy = self.weights.get(&from).ok_or(StoreError::Unknown(from))?.clone();
        self.set_weights(to, copy)
    }

    fn push_weights(&mut self) -> Result<(), StoreError> {
        self.pushes += 1;
        Ok(())
    }
}
