use serde::{Deserialize, Serialize};

use crate::error::{DialbackError, Result};
use crate::utils::get_env_with_prefix;

/// Configuration for code verification and challenge generation
///
/// Passed explicitly into [`crate::PhoneVerifier`]; there is no ambient
/// global configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerifyConfig {
    /// Number of digits in a one-time code (default: 6)
    #[serde(default = "default_digits")]
    pub digits: u32,
    /// How many 30-second steps in the past a code stays valid (default: 5)
    #[serde(default = "default_drift_steps")]
    pub drift_steps: u64,
    /// Multiplier for the throttle backoff spacing (default: 1)
    #[serde(default = "default_throttle_factor")]
    pub throttle_factor: u32,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            digits: default_digits(),
            drift_steps: default_drift_steps(),
            throttle_factor: default_throttle_factor(),
        }
    }
}

fn default_digits() -> u32 {
    6
}

fn default_drift_steps() -> u64 {
    5
}

fn default_throttle_factor() -> u32 {
    1
}

impl VerifyConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a digit count outside 1..=9 or a
    /// zero throttle factor.
    pub fn validate(&self) -> Result<()> {
        if self.digits == 0 || self.digits > 9 {
            return Err(DialbackError::config(format!(
                "Code digits must be between 1 and 9, got {}",
                self.digits
            )));
        }
        if self.throttle_factor == 0 {
            return Err(DialbackError::config("Throttle factor must be positive"));
        }
        Ok(())
    }
}

/// Builder for [`VerifyConfig`] with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct VerifyConfigBuilder {
    config: VerifyConfig,
}

impl VerifyConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: VerifyConfig::default(),
        }
    }

    /// Set the number of digits in a one-time code
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.config.digits = digits;
        self
    }

    /// Set the backward drift window in 30-second steps
    pub fn with_drift_steps(mut self, steps: u64) -> Self {
        self.config.drift_steps = steps;
        self
    }

    /// Set the throttle backoff multiplier
    pub fn with_throttle_factor(mut self, factor: u32) -> Self {
        self.config.throttle_factor = factor;
        self
    }

    /// Load overrides from environment variables
    ///
    /// Reads `DIALBACK_TOTP_DIGITS`, `DIALBACK_DRIFT_STEPS`, and
    /// `DIALBACK_THROTTLE_FACTOR` (unprefixed names also accepted).
    /// Unparseable values are ignored.
    pub fn from_env(mut self) -> Self {
        if let Some(digits) = get_env_with_prefix("TOTP_DIGITS").and_then(|v| v.parse().ok()) {
            self.config.digits = digits;
        }
        if let Some(steps) = get_env_with_prefix("DRIFT_STEPS").and_then(|v| v.parse().ok()) {
            self.config.drift_steps = steps;
        }
        if let Some(factor) = get_env_with_prefix("THROTTLE_FACTOR").and_then(|v| v.parse().ok()) {
            self.config.throttle_factor = factor;
        }
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if validation fails.
    pub fn build(self) -> Result<VerifyConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for VerifyConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VerifyConfig::default();
        assert_eq!(config.digits, 6);
        assert_eq!(config.drift_steps, 5);
        assert_eq!(config.throttle_factor, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = VerifyConfigBuilder::new()
            .with_digits(8)
            .with_drift_steps(2)
            .with_throttle_factor(10)
            .build()
            .unwrap();

        assert_eq!(config.digits, 8);
        assert_eq!(config.drift_steps, 2);
        assert_eq!(config.throttle_factor, 10);
    }

    #[test]
    fn test_invalid_digits_rejected() {
        assert!(VerifyConfigBuilder::new().with_digits(0).build().is_err());
        assert!(VerifyConfigBuilder::new().with_digits(10).build().is_err());
    }

    #[test]
    fn test_zero_throttle_factor_rejected() {
        assert!(
            VerifyConfigBuilder::new()
                .with_throttle_factor(0)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("DIALBACK_THROTTLE_FACTOR", "7");
        let config = VerifyConfigBuilder::new().from_env().build().unwrap();
        assert_eq!(config.throttle_factor, 7);
        std::env::remove_var("DIALBACK_THROTTLE_FACTOR");
    }
}
