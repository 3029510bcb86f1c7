//! Validation of merged configuration values.

use cadence_utils::error::ConfigError;

use super::Config;

/// Longest grace period accepted, in seconds (one hour).
const MAX_GRACE_PERIOD_SECS: f64 = 3600.0;

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(secs) = self.interrupt.grace_period_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: "grace_period_secs".to_string(),
                    value: "must be greater than 0".to_string(),
                });
            }
            if secs > MAX_GRACE_PERIOD_SECS {
                return Err(ConfigError::InvalidValue {
                    key: "grace_period_secs".to_string(),
                    value: "exceeds maximum limit of 3600 seconds".to_string(),
                });
            }
        }

        if let Some(manager) = &self.tasks.package_manager
            && manager.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                key: "package_manager".to_string(),
                value: "must not be empty".to_string(),
            });
        }

        if let Some(output) = &self.clean.output_path
            && output.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                key: "output_path".to_string(),
                value: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
