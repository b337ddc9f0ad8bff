//! Scan configuration.

use chrono::Duration;
use serde::Deserialize;

fn default_min_transfer_seconds() -> i64 {
    180
}

fn default_horizon_seconds() -> i64 {
    86_400
}

/// Longest horizon a scan accepts: one week.
pub const MAX_HORIZON_SECONDS: i64 = 7 * 86_400;

/// A configuration value out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("minimum transfer time must not be negative, got {0} s")]
    NegativeMinTransfer(i64),

    #[error("horizon must be between 1 and {max} s, got {0} s", max = MAX_HORIZON_SECONDS)]
    HorizonOutOfRange(i64),
}

/// Configuration parameters shared by both scans.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ScanConfigFields")]
pub struct ScanConfig {
    /// Minimum time between reaching a stop and boarding a different vehicle
    /// there (seconds). Staying on the same vehicle needs no margin.
    pub min_transfer_seconds: i64,

    /// How far after the query departure to keep scanning (seconds).
    /// Connections departing later than this are never considered.
    pub horizon_seconds: i64,
}

#[derive(Deserialize)]
struct ScanConfigFields {
    #[serde(default = "default_min_transfer_seconds")]
    min_transfer_seconds: i64,
    #[serde(default = "default_horizon_seconds")]
    horizon_seconds: i64,
}

impl TryFrom<ScanConfigFields> for ScanConfig {
    type Error = ConfigError;

    fn try_from(fields: ScanConfigFields) -> Result<Self, Self::Error> {
        Self::new(fields.min_transfer_seconds, fields.horizon_seconds)
    }
}

impl ScanConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(min_transfer_seconds: i64, horizon_seconds: i64) -> Result<Self, ConfigError> {
        let config = Self {
            min_transfer_seconds,
            horizon_seconds,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration. Missing fields take their defaults;
    /// out-of-range values are rejected.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the fields, which are public and may have been changed since
    /// construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_transfer_seconds < 0 {
            return Err(ConfigError::NegativeMinTransfer(self.min_transfer_seconds));
        }
        if !(1..=MAX_HORIZON_SECONDS).contains(&self.horizon_seconds) {
            return Err(ConfigError::HorizonOutOfRange(self.horizon_seconds));
        }
        Ok(())
    }

    /// Returns the minimum transfer time as a Duration.
    pub fn min_transfer(&self) -> Duration {
        Duration::seconds(self.min_transfer_seconds)
    }

    /// Returns the search horizon as a Duration.
    pub fn horizon(&self) -> Duration {
        Duration::seconds(self.horizon_seconds)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_transfer_seconds: default_min_transfer_seconds(),
            horizon_seconds: default_horizon_seconds(), // one day
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ScanConfig::default();

        assert_eq!(config.min_transfer_seconds, 180);
        assert_eq!(config.horizon_seconds, 86_400);
    }

    #[test]
    fn duration_methods() {
        let config = ScanConfig::default();

        assert_eq!(config.min_transfer(), Duration::minutes(3));
        assert_eq!(config.horizon(), Duration::hours(24));
    }

    #[test]
    fn custom_config() {
        let config = ScanConfig::new(60, 7_200).unwrap();

        assert_eq!(config.min_transfer_seconds, 60);
        assert_eq!(config.horizon_seconds, 7_200);
    }

    #[test]
    fn json_fills_missing_fields() {
        let config = ScanConfig::from_json(r#"{"horizon_seconds": 3600}"#).unwrap();
        assert_eq!(config, ScanConfig::new(180, 3_600).unwrap());

        let config = ScanConfig::from_json("{}").unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn json_rejects_wrong_types() {
        assert!(ScanConfig::from_json(r#"{"min_transfer_seconds": "3m"}"#).is_err());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(
            ScanConfig::new(-1, 3_600),
            Err(ConfigError::NegativeMinTransfer(-1))
        );
        assert_eq!(ScanConfig::new(0, 0), Err(ConfigError::HorizonOutOfRange(0)));
        assert_eq!(
            ScanConfig::new(0, i64::MAX),
            Err(ConfigError::HorizonOutOfRange(i64::MAX))
        );
        assert!(ScanConfig::new(0, MAX_HORIZON_SECONDS).is_ok());
    }

    #[test]
    fn json_is_validated() {
        assert!(ScanConfig::from_json(r#"{"horizon_seconds": 9223372036854775807}"#).is_err());
        assert!(ScanConfig::from_json(r#"{"min_transfer_seconds": -60}"#).is_err());
    }
}
