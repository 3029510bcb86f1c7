//! Config file discovery and precedence merging
//!
//! Searches upward from the working directory for `.cadence/config.toml`,
//! stopping at the first repository root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cadence_utils::error::ConfigError;
use tracing::debug;

use super::model::{ATTRIBUTED_KEYS, TomlConfig};
use super::{CliArgs, Config, ConfigSource};

/// Markers that end the upward search for a config file.
const REPOSITORY_MARKERS: &[&str] = &[".git", ".hg", ".svn"];

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|e| {
            ConfigError::InvalidFile(format!("failed to get current directory: {e}"))
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// The path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Config {
            source_attribution: ATTRIBUTED_KEYS
                .iter()
                .map(|key| (key.to_string(), ConfigSource::Default))
                .collect::<HashMap<_, _>>(),
            ..Config::default()
        };

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    });
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            let file = Self::load_config_file(path)?;
            config.apply_file(file);
            debug!(path = %path.display(), "Loaded config file");
        }
        config.config_path = config_path;

        config.apply_cli(cli_args);
        config.validate()?;
        Ok(config)
    }

    /// Search upward from `start_dir` for `.cadence/config.toml`
    ///
    /// Stops at the first directory carrying a repository marker, or at the
    /// filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let candidate = dir.join(".cadence").join("config.toml");
            if candidate.is_file() {
                return Some(candidate);
            }
            if REPOSITORY_MARKERS
                .iter()
                .any(|marker| dir.join(marker).exists())
            {
                break;
            }
            current = dir.parent();
        }

        None
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidFile(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))
    }

    fn apply_file(&mut self, file: TomlConfig) {
        let source = ConfigSource::Config;

        if let Some(defaults) = file.defaults
            && defaults.verbose.is_some()
        {
            self.defaults.verbose = defaults.verbose;
            self.attribute("verbose", source);
        }
        if let Some(interrupt) = file.interrupt
            && interrupt.grace_period_secs.is_some()
        {
            self.interrupt.grace_period_secs = interrupt.grace_period_secs;
            self.attribute("grace_period_secs", source);
        }
        if let Some(instrumentation) = file.instrumentation {
            if instrumentation.enabled.is_some() {
                self.instrumentation.enabled = instrumentation.enabled;
                self.attribute("instrumentation_enabled", source);
            }
            if instrumentation.output_dir.is_some() {
                self.instrumentation.output_dir = instrumentation.output_dir;
                self.attribute("instrumentation_output_dir", source);
            }
        }
        if let Some(tasks) = file.tasks
            && tasks.package_manager.is_some()
        {
            self.tasks.package_manager = tasks.package_manager;
            self.attribute("package_manager", source);
        }
        if let Some(clean) = file.clean
            && clean.output_path.is_some()
        {
            self.clean.output_path = clean.output_path;
            self.attribute("output_path", source);
        }
    }

    fn apply_cli(&mut self, args: &CliArgs) {
        let source = ConfigSource::Cli;

        if args.verbose.is_some() {
            self.defaults.verbose = args.verbose;
            self.attribute("verbose", source);
        }
        if args.grace_period_secs.is_some() {
            self.interrupt.grace_period_secs = args.grace_period_secs;
            self.attribute("grace_period_secs", source);
        }
        if args.instrumentation.is_some() {
            self.instrumentation.enabled = args.instrumentation;
            self.attribute("instrumentation_enabled", source);
        }
        if args.package_manager.is_some() {
            self.tasks.package_manager.clone_from(&args.package_manager);
            self.attribute("package_manager", source);
        }
        if args.output_path.is_some() {
            self.clean.output_path.clone_from(&args.output_path);
            self.attribute("output_path", source);
        }
    }

    pub(crate) fn attribute(&mut self, key: &str, source: ConfigSource) {
        self.source_attribution.insert(key.to_string(), source);
    }
}
