//! League configuration.

use std::error::Error;
use std::fmt;

/// When a trainable agent earns a frozen snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PromotionConfig {
    /// Games since the last promotion before an agent is considered.
    /// Default: 20.
    pub min_games: u64,
    /// Win rate over that window required for promotion. Default: 0.7.
    pub min_win_rate: f64,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            min_games: 20,
            min_win_rate: 0.7,
        }
    }
}

/// League construction parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct LeagueConfig {
    /// Mains (each with its Exploiter) created by
    /// [`League::new`](crate::League::new). Default: 1.
    pub initial_mains: u32,
    /// Promotion thresholds.
    pub promotion: PromotionConfig,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            initial_mains: 1,
            promotion: PromotionConfig::default(),
        }
    }
}

impl LeagueConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.promotion.min_games == 0 {
            return Err(ConfigError::ZeroPromotionGames);
        }
        let rate = self.promotion.min_win_rate;
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(ConfigError::InvalidWinRate { value: rate });
        }
        Ok(())
    }
}

/// Errors detected by [`LeagueConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `promotion.min_games` is zero.
    ZeroPromotionGames,
    /// `promotion.min_win_rate` is outside `(0, 1]`.
    InvalidWinRate {
        /// The invalid value.
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPromotionGames => write!(f, "promotion.min_games must be at least 1"),
            Self::InvalidWinRate { value } => {
                write!(f, "promotion.min_win_rate must be in (0, 1], got {value}")
            }
        }
    }
}

impl Error for ConfigError {}
