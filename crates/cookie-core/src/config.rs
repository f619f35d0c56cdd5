//! Tunable economy parameters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("cookie_range lower bound {0} exceeds upper bound {1}")]
    InvertedRange(u64, u64),
    #[error("{0} must be within [0, 1], got {1}")]
    FractionOutOfRange(&'static str, Decimal),
    #[error("{0} must be > 0")]
    NonPositive(&'static str),
}

/// Economy configuration. Every field has a default so partial YAML works.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Seconds between idle accrual and leaderboard refreshes.
    pub update_rate_secs: u64,
    /// Global cooldown between successful clicks, in seconds.
    pub cookie_cooldown_secs: u64,
    /// Inclusive range of the random base amount per click.
    pub cookie_range: (u64, u64),
    /// Fractional digits in scaled big-number labels.
    pub bignum_places: u32,
    /// Fraction of the leader's cookies taken by a successful swindle.
    pub swindle_amount: Decimal,
    /// Fraction of the leader's cookies given away when the leader swindles themselves.
    pub backfire_amount: Decimal,
    /// Rows shown on the leaderboard.
    pub leaderboard_size: usize,
    /// Seed for reproducible runs; entropy when absent.
    pub rng_seed: Option<u64>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            update_rate_secs: 10,
            cookie_cooldown_secs: 60,
            cookie_range: (1, 1),
            bignum_places: 3,
            swindle_amount: Decimal::new(5, 1),
            backfire_amount: Decimal::new(5, 1),
            leaderboard_size: 25,
            rng_seed: None,
        }
    }
}

impl EconomyConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cookie_cooldown_secs)
    }

    pub fn update_rate(&self) -> Duration {
        Duration::from_secs(self.update_rate_secs)
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (lo, hi) = self.cookie_range;
        if lo > hi {
            return Err(ConfigError::InvertedRange(lo, hi));
        }
        for (name, v) in [
            ("swindle_amount", self.swindle_amount),
            ("backfire_amount", self.backfire_amount),
        ] {
            if v < Decimal::ZERO || v > Decimal::ONE {
                return Err(ConfigError::FractionOutOfRange(name, v));
            }
        }
        if self.cookie_cooldown_secs == 0 {
            return Err(ConfigError::NonPositive("cookie_cooldown_secs"));
        }
        if self.update_rate_secs == 0 {
            return Err(ConfigError::NonPositive("update_rate_secs"));
        }
        if self.leaderboard_size == 0 {
            return Err(ConfigError::NonPositive("leaderboard_size"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EconomyConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.cooldown(), Duration::from_secs(60));
        assert_eq!(cfg.cookie_range, (1, 1));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: EconomyConfig =
            serde_json::from_str(r#"{"cookie_range": [1, 100], "swindle_amount": "0.25"}"#).unwrap();
        assert_eq!(cfg.cookie_range, (1, 100));
        assert_eq!(cfg.swindle_amount, Decimal::new(25, 2));
        assert_eq!(cfg.bignum_places, 3);
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = EconomyConfig {
            cookie_range: (5, 1),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvertedRange(5, 1)));
        let cfg = EconomyConfig {
            backfire_amount: Decimal::new(15, 1),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::FractionOutOfRange("backfire_amount", _))
        ));
        let cfg = EconomyConfig {
            cookie_cooldown_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositive("cookie_cooldown_secs"))
        );
    }
}
