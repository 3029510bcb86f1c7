//! Programmatic configuration builder.

use std::time::Duration;

use cadence_utils::error::ConfigError;

use super::model::ATTRIBUTED_KEYS;
use super::{Config, ConfigSource};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding the orchestrator or in tests, where the
    /// user's config files must not leak in.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cadence_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .grace_period(Duration::from_secs(5))
    ///     .package_manager("yarn")
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.package_manager(), "yarn");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// All values set via the builder are attributed to
/// [`ConfigSource::Programmatic`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    verbose: Option<bool>,
    grace_period: Option<Duration>,
    instrumentation: Option<bool>,
    instrumentation_dir: Option<String>,
    package_manager: Option<String>,
    output_path: Option<String>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Cap on interrupt cleanup time. Not calling this waits indefinitely.
    #[must_use]
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = Some(grace);
        self
    }

    #[must_use]
    pub fn instrumentation(mut self, enabled: bool) -> Self {
        self.instrumentation = Some(enabled);
        self
    }

    #[must_use]
    pub fn instrumentation_dir(mut self, dir: impl Into<String>) -> Self {
        self.instrumentation_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn package_manager(mut self, manager: impl Into<String>) -> Self {
        self.package_manager = Some(manager.into());
        self
    }

    #[must_use]
    pub fn output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = Config {
            source_attribution: ATTRIBUTED_KEYS
                .iter()
                .map(|key| (key.to_string(), ConfigSource::Default))
                .collect(),
            ..Config::default()
        };
        let source = ConfigSource::Programmatic;

        if let Some(verbose) = self.verbose {
            config.defaults.verbose = Some(verbose);
            config.attribute("verbose", source);
        }
        if let Some(grace) = self.grace_period {
            config.interrupt.grace_period_secs = Some(grace.as_secs_f64());
            config.attribute("grace_period_secs", source);
        }
        if let Some(enabled) = self.instrumentation {
            config.instrumentation.enabled = Some(enabled);
            config.attribute("instrumentation_enabled", source);
        }
        if let Some(dir) = self.instrumentation_dir {
            config.instrumentation.output_dir = Some(dir);
            config.attribute("instrumentation_output_dir", source);
        }
        if let Some(manager) = self.package_manager {
            config.tasks.package_manager = Some(manager);
            config.attribute("package_manager", source);
        }
        if let Some(path) = self.output_path {
            config.clean.output_path = Some(path);
            config.attribute("output_path", source);
        }

        config.validate()?;
        Ok(config)
    }
}
