//! Spread calculation configuration.
//!
//! A single immutable value passed into the engine entry point. Defaults
//! match the historical calculation runs (251 trading days, 13 months
//! forward, all three spread kinds enabled).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("max_months_forward must be positive")]
    NonPositiveHorizon,

    #[error("trading_days_per_year must be positive (got {0})")]
    NonPositiveTradingDays(f64),
}

/// Configuration for term-structure and spread calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadConfig {
    /// Annualization factor for percentage spreads.
    #[serde(default = "default_trading_days")]
    pub trading_days_per_year: f64,

    /// Maximum number of contract months ranked per day.
    #[serde(default = "default_max_months")]
    pub max_months_forward: usize,

    /// Minimum days to expiry for a contract to be ranked.
    #[serde(default)]
    pub min_days_to_expiry: i64,

    /// Minimum daily volume for a contract to be ranked (0 disables the
    /// filter; only applied when a volume table is supplied).
    #[serde(default)]
    pub min_volume: f64,

    /// Calculate dollar spreads.
    #[serde(default = "default_true")]
    pub calculate_dollar_spreads: bool,

    /// Calculate percentage spreads.
    #[serde(default = "default_true")]
    pub calculate_percent_spreads: bool,

    /// Calculate annualized percentage spreads.
    #[serde(default = "default_true")]
    pub calculate_annual_spreads: bool,
}

fn default_trading_days() -> f64 {
    251.0
}

fn default_max_months() -> usize {
    13
}

fn default_true() -> bool {
    true
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            trading_days_per_year: default_trading_days(),
            max_months_forward: default_max_months(),
            min_days_to_expiry: 0,
            min_volume: 0.0,
            calculate_dollar_spreads: true,
            calculate_percent_spreads: true,
            calculate_annual_spreads: true,
        }
    }
}

impl SpreadConfig {
    /// Reject structurally invalid settings before any per-day work runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_months_forward == 0 {
            return Err(ConfigError::NonPositiveHorizon);
        }
        if !(self.trading_days_per_year > 0.0) {
            return Err(ConfigError::NonPositiveTradingDays(
                self.trading_days_per_year,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SpreadConfig::default();
        assert_eq!(config.trading_days_per_year, 251.0);
        assert_eq!(config.max_months_forward, 13);
        assert_eq!(config.min_days_to_expiry, 0);
        assert!(config.calculate_dollar_spreads);
        assert!(config.calculate_percent_spreads);
        assert!(config.calculate_annual_spreads);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_horizon() {
        let config = SpreadConfig {
            max_months_forward: 0,
            ..SpreadConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveHorizon)
        ));
    }

    #[test]
    fn test_rejects_non_positive_trading_days() {
        for bad in [0.0, -251.0, f64::NAN] {
            let config = SpreadConfig {
                trading_days_per_year: bad,
                ..SpreadConfig::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: SpreadConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_months_forward, 13);
        assert!(config.calculate_annual_spreads);

        let config: SpreadConfig =
            serde_json::from_str(r#"{"max_months_forward": 6, "calculate_annual_spreads": false}"#)
                .unwrap();
        assert_eq!(config.max_months_forward, 6);
        assert!(!config.calculate_annual_spreads);
        assert_eq!(config.trading_days_per_year, 251.0);
    }
}
