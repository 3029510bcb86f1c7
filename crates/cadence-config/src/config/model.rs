//! Configuration model and its TOML file representation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Configuration for cadence runs.
///
/// Use [`Config::discover()`] for CLI behavior (file discovery plus CLI
/// overrides) or [`Config::builder()`] for deterministic programmatic
/// construction.
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// verbose = false
///
/// [interrupt]
/// grace_period_secs = 30
///
/// [instrumentation]
/// enabled = true
/// output_dir = ".cadence/instrumentation"
///
/// [tasks]
/// package_manager = "npm"
///
/// [clean]
/// output_path = "dist"
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub defaults: Defaults,
    pub interrupt: InterruptConfig,
    pub instrumentation: InstrumentationConfig,
    pub tasks: TasksConfig,
    pub clean: CleanConfig,
    /// The file the values were loaded from, if any.
    pub config_path: Option<PathBuf>,
    /// Source attribution for each setting.
    pub source_attribution: HashMap<String, ConfigSource>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Defaults {
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InterruptConfig {
    /// Seconds an interrupted command may spend cleaning up. Unset waits forever.
    pub grace_period_secs: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InstrumentationConfig {
    /// Write a JSON report per run.
    pub enabled: Option<bool>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TasksConfig {
    pub package_manager: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CleanConfig {
    pub output_path: Option<String>,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from a configuration file.
    Config,
    /// Value provided through [`crate::ConfigBuilder`].
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub defaults: Option<Defaults>,
    pub interrupt: Option<InterruptConfig>,
    pub instrumentation: Option<InstrumentationConfig>,
    pub tasks: Option<TasksConfig>,
    pub clean: Option<CleanConfig>,
}

/// Keys tracked in [`Config::source_attribution`].
pub(crate) const ATTRIBUTED_KEYS: &[&str] = &[
    "verbose",
    "grace_period_secs",
    "instrumentation_enabled",
    "instrumentation_output_dir",
    "package_manager",
    "output_path",
];
