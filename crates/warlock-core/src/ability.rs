//! Ability catalog.
//!
//! The simulation identifies abilities by lowercase string names. The
//! catalog is closed: any name not listed here is schema drift and
//! fails decoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every ability the simulation can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbilityId {
    /// Basic projectile.
    Shoot,
    /// Instant blink to a point.
    Teleport,
    /// Projectile that swaps places with whatever it hits.
    Swap,
    /// Projectile that steers toward the nearest enemy.
    Homing,
    /// Self-damaging area burst.
    Scourge,
    /// Reflective barrier around the caster.
    Shield,
    /// Projectile that returns to the caster.
    Boomerang,
    /// Instant line attack.
    Lightning,
    /// Projectile that splits on impact.
    Cluster,
    /// Pulling well.
    Gravity,
    /// Tether between caster and target.
    Link,
}

/// What an ability needs as a target when cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbilityTarget {
    /// Cast on self, no target point.
    None,
    /// Cast at a world point.
    Point,
}

impl AbilityId {
    /// All abilities in catalog order.
    pub const ALL: [AbilityId; 11] = [
        AbilityId::Shoot,
        AbilityId::Teleport,
        AbilityId::Swap,
        AbilityId::Homing,
        AbilityId::Scourge,
        AbilityId::Shield,
        AbilityId::Boomerang,
        AbilityId::Lightning,
        AbilityId::Cluster,
        AbilityId::Gravity,
        AbilityId::Link,
    ];

    /// Wire name of the ability.
    pub fn as_str(self) -> &'static str {
        match self {
            AbilityId::Shoot => "shoot",
            AbilityId::Teleport => "teleport",
            AbilityId::Swap => "swap",
            AbilityId::Homing => "homing",
            AbilityId::Scourge => "scourge",
            AbilityId::Shield => "shield",
            AbilityId::Boomerang => "boomerang",
            AbilityId::Lightning => "lightning",
            AbilityId::Cluster => "cluster",
            AbilityId::Gravity => "gravity",
            AbilityId::Link => "link",
        }
    }

    /// Target kind of the ability.
    pub fn target(self) -> AbilityTarget {
        match self {
            AbilityId::Scourge | AbilityId::Shield => AbilityTarget::None,
            _ => AbilityTarget::Point,
        }
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an ability name outside the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownAbility(pub String);

impl fmt::Display for UnknownAbility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown ability '{}'", self.0)
    }
}

impl std::error::Error for UnknownAbility {}

impl FromStr for AbilityId {
    type Err = UnknownAbility;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AbilityId::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAbility(s.to_string()))
    }
}
