//! Episode configuration and validation.

use std::error::Error;
use std::fmt;

use warlock_codec::TargetMode;

/// Parameters of every episode run by one controller.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeConfig {
    /// Players (and policy slots) per game. Default: 2.
    pub player_count: u32,
    /// Rounds after which the episode ends. Default: 5.
    pub max_rounds: u32,
    /// Simulation frames advanced per policy decision. Default: 6.
    pub frames_per_step: u32,
    /// Divisor of health deltas in the shaping reward. `None` uses the
    /// acting player's maximum health. Default: `None`.
    pub health_reward_scale: Option<f64>,
    /// Reward for winning a round (negated for losing). Default: 1.0.
    pub win_reward: f64,
    /// How action targets are mapped to the world. Default: absolute.
    pub target_mode: TargetMode,
    /// Truncate after this many steps. Default: `Some(5_000)`.
    pub max_steps: Option<u64>,
    /// Record the episode for replay. Default: false.
    pub log_episode: bool,
    /// Seconds per frame passed to `start`; simulation default when `None`.
    pub delta_time: Option<f64>,
    /// Gold in the first shop; simulation default when `None`.
    pub start_gold: Option<f64>,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            player_count: 2,
            max_rounds: 5,
            frames_per_step: 6,
            health_reward_scale: None,
            win_reward: 1.0,
            target_mode: TargetMode::Absolute,
            max_steps: Some(5_000),
            log_episode: false,
            delta_time: None,
            start_gold: None,
        }
    }
}

impl EpisodeConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_count < 2 {
            return Err(ConfigError::TooFewPlayers {
                configured: self.player_count,
            });
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if self.frames_per_step == 0 {
            return Err(ConfigError::ZeroFramesPerStep);
        }
        if let Some(scale) = self.health_reward_scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ConfigError::InvalidRewardScale { value: scale });
            }
        }
        if !self.win_reward.is_finite() {
            return Err(ConfigError::InvalidWinReward {
                value: self.win_reward,
            });
        }
        if self.max_steps == Some(0) {
            return Err(ConfigError::ZeroMaxSteps);
        }
        if let Some(dt) = self.delta_time {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(ConfigError::InvalidDeltaTime { value: dt });
            }
        }
        Ok(())
    }
}

/// Errors detected by [`EpisodeConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Fewer than two players; every slot needs an opponent.
    TooFewPlayers {
        /// The configured count.
        configured: u32,
    },
    /// `max_rounds` is zero.
    ZeroRounds,
    /// `frames_per_step` is zero.
    ZeroFramesPerStep,
    /// `health_reward_scale` is not a positive finite number.
    InvalidRewardScale {
        /// The invalid value.
        value: f64,
    },
    /// `win_reward` is NaN or infinite.
    InvalidWinReward {
        /// The invalid value.
        value: f64,
    },
    /// `max_steps` is `Some(0)`.
    ZeroMaxSteps,
    /// `delta_time` is not a positive finite number.
    InvalidDeltaTime {
        /// The invalid value.
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPlayers { configured } => {
                write!(f, "player_count {configured} is below minimum of 2")
            }
            Self::ZeroRounds => write!(f, "max_rounds must be at least 1"),
            Self::ZeroFramesPerStep => write!(f, "frames_per_step must be at least 1"),
            Self::InvalidRewardScale { value } => {
                write!(f, "health_reward_scale must be positive and finite, got {value}")
            }
            Self::InvalidWinReward { value } => {
                write!(f, "win_reward must be finite, got {value}")
            }
            Self::ZeroMaxSteps => write!(f, "max_steps must be at least 1"),
            Self::InvalidDeltaTime { value } => {
                write!(f, "delta_time must be positive and finite, got {value}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(EpisodeConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_degenerate_values() {
        let cases = [
            (
                EpisodeConfig {
                    player_count: 1,
                    ..Default::default()
                },
                ConfigError::TooFewPlayers { configured: 1 },
            ),
            (
                EpisodeConfig {
                    frames_per_step: 0,
                    ..Default::default()
                },
                ConfigError::ZeroFramesPerStep,
            ),
            (
                EpisodeConfig {
                    max_steps: Some(0),
                    ..Default::default()
                },
                ConfigError::ZeroMaxSteps,
            ),
            (
                EpisodeConfig {
                    health_reward_scale: Some(0.0),
                    ..Default::default()
                },
                ConfigError::InvalidRewardScale { value: 0.0 },
            ),
        ];
        for (cfg, expected) in cases {
            assert_eq!(cfg.validate(), Err(expected));
        }
    }

    #[test]
    fn nan_win_reward_rejected() {
        let cfg = EpisodeConfig {
            win_reward: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidWinReward { .. })
        ));
    }
}
