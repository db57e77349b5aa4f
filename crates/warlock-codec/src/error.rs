//! Error types for the codec.

use std::error::Error;
use std::fmt;

use warlock_core::EntityId;

/// Errors raised while encoding a state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// A perspective entity is not present in the state.
    MissingEntity {
        /// The absent entity.
        entity: EntityId,
    },
    /// A perspective entity has no shop record.
    MissingShop {
        /// The player without a shop.
        entity: EntityId,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEntity { entity } => write!(f, "entity {entity} not in state"),
            Self::MissingShop { entity } => write!(f, "player {entity} has no shop"),
        }
    }
}

impl Error for CodecError {}
