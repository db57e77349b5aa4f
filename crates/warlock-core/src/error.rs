//! Schema errors raised while decoding simulation state documents.
//!
//! A document that parses as JSON but does not fit the fixed state
//! record is shape drift. It is reported here and surfaced by the link
//! as a protocol error; it is never papered over with defaults.

use std::error::Error;
use std::fmt;

use crate::ability::UnknownAbility;

/// A state document did not match the expected schema.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaError {
    /// A component map key was not a numeric entity ID.
    InvalidEntityKey {
        /// Component map the key was found in.
        component: &'static str,
        /// The offending key.
        key: String,
    },
    /// An ability name outside the catalog.
    UnknownAbility(UnknownAbility),
    /// A health component had a non-finite or negative maximum.
    InvalidHealth {
        /// Entity carrying the health component.
        entity: u64,
        /// The reported maximum.
        maximum: f64,
    },
    /// `deltaTime` was not finite and positive.
    InvalidDeltaTime {
        /// The reported value.
        value: f64,
    },
    /// A numeric field was NaN or infinite.
    NonFinite {
        /// Dotted path of the field.
        field: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEntityKey { component, key } => {
                write!(f, "invalid entity key '{key}' in '{component}'")
            }
            Self::UnknownAbility(e) => write!(f, "{e}"),
            Self::InvalidHealth { entity, maximum } => {
                write!(f, "entity {entity} has invalid maximum health {maximum}")
            }
            Self::InvalidDeltaTime { value } => {
                write!(f, "deltaTime must be finite and positive, got {value}")
            }
            Self::NonFinite { field } => write!(f, "non-finite value in '{field}'"),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownAbility(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UnknownAbility> for SchemaError {
    fn from(e: UnknownAbility) -> Self {
        Self::UnknownAbility(e)
    }
}
