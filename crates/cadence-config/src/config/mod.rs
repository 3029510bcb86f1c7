//! Configuration management for cadence
//!
//! Supports TOML configuration files with `[defaults]`, `[interrupt]`,
//! `[instrumentation]`, `[tasks]` and `[clean]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;

use std::time::Duration;

use camino::Utf8PathBuf;

/// Package manager used when nothing else is configured.
pub const DEFAULT_PACKAGE_MANAGER: &str = "npm";

/// Build output directory removed by `clean` when nothing else is configured.
pub const DEFAULT_OUTPUT_PATH: &str = "dist";

/// Directory that receives instrumentation reports when nothing else is configured.
pub const DEFAULT_INSTRUMENTATION_DIR: &str = ".";

impl Config {
    /// Whether verbose output was requested.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    /// How long an interrupted command may spend in its cleanup hook.
    ///
    /// `None` means wait for the hook to settle, however long it takes.
    #[must_use]
    pub fn grace_period(&self) -> Option<Duration> {
        self.interrupt
            .grace_period_secs
            .map(Duration::from_secs_f64)
    }

    #[must_use]
    pub fn instrumentation_enabled(&self) -> bool {
        self.instrumentation.enabled.unwrap_or(false)
    }

    #[must_use]
    pub fn instrumentation_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(
            self.instrumentation
                .output_dir
                .as_deref()
                .unwrap_or(DEFAULT_INSTRUMENTATION_DIR),
        )
    }

    #[must_use]
    pub fn package_manager(&self) -> &str {
        self.tasks
            .package_manager
            .as_deref()
            .unwrap_or(DEFAULT_PACKAGE_MANAGER)
    }

    /// Output directory removed by `clean`, relative to the project root.
    #[must_use]
    pub fn output_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.clean.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_utils::test_support::ProjectFixture;

    fn discover_in(fixture: &ProjectFixture, args: &CliArgs) -> Config {
        Config::discover_from(fixture.path(), args).unwrap()
    }

    #[test]
    fn test_defaults_without_file() {
        let fixture = ProjectFixture::new().with_dirs(&[".git"]);
        let config = discover_in(&fixture, &CliArgs::default());

        assert!(!config.verbose());
        assert_eq!(config.grace_period(), None);
        assert!(!config.instrumentation_enabled());
        assert_eq!(config.package_manager(), "npm");
        assert_eq!(config.output_path(), Utf8PathBuf::from("dist"));
        assert!(config.config_path.is_none());
        assert_eq!(config.source_of("package_manager"), ConfigSource::Default);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let fixture = ProjectFixture::new().with_dirs(&[".git"]).with_file(
            ".cadence/config.toml",
            r#"
[defaults]
verbose = true

[interrupt]
grace_period_secs = 2.5

[instrumentation]
enabled = true
output_dir = "reports"

[tasks]
package_manager = "yarn"

[clean]
output_path = "build"
"#,
        );
        let config = discover_in(&fixture, &CliArgs::default());

        assert!(config.verbose());
        assert_eq!(config.grace_period(), Some(Duration::from_millis(2500)));
        assert!(config.instrumentation_enabled());
        assert_eq!(config.instrumentation_dir(), Utf8PathBuf::from("reports"));
        assert_eq!(config.package_manager(), "yarn");
        assert_eq!(config.output_path(), Utf8PathBuf::from("build"));
        assert_eq!(config.source_of("package_manager"), ConfigSource::Config);
    }

    #[test]
    fn test_cli_overrides_file() {
        let fixture = ProjectFixture::new().with_dirs(&[".git"]).with_file(
            ".cadence/config.toml",
            "[interrupt]\ngrace_period_secs = 10\n[tasks]\npackage_manager = \"yarn\"\n",
        );
        let args = CliArgs {
            grace_period_secs: Some(1.0),
            verbose: Some(true),
            ..CliArgs::default()
        };
        let config = discover_in(&fixture, &args);

        assert_eq!(config.grace_period(), Some(Duration::from_secs(1)));
        assert_eq!(config.source_of("grace_period_secs"), ConfigSource::Cli);
        assert_eq!(config.source_of("verbose"), ConfigSource::Cli);
        assert_eq!(config.package_manager(), "yarn");
    }

    #[test]
    fn test_discovery_walks_upward() {
        let fixture = ProjectFixture::new()
            .with_dirs(&[".git", "app/components"])
            .with_file(".cadence/config.toml", "[clean]\noutput_path = \"out\"\n");

        let config =
            Config::discover_from(&fixture.join("app/components"), &CliArgs::default()).unwrap();

        assert_eq!(config.output_path(), Utf8PathBuf::from("out"));
        assert!(config.config_path.is_some());
    }

    #[test]
    fn test_discovery_stops_at_repository_root() {
        let fixture = ProjectFixture::new()
            .with_file(".cadence/config.toml", "[clean]\noutput_path = \"outer\"\n")
            .with_dirs(&["inner/.git"]);

        let config = Config::discover_from(&fixture.join("inner"), &CliArgs::default()).unwrap();

        assert_eq!(config.output_path(), Utf8PathBuf::from("dist"));
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let fixture = ProjectFixture::new();
        let args = CliArgs {
            config_path: Some(fixture.join("nope.toml")),
            ..CliArgs::default()
        };

        let err = Config::discover_from(fixture.path(), &args).unwrap_err();
        assert!(matches!(
            err,
            cadence_utils::error::ConfigError::NotFound { .. }
        ));
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let fixture = ProjectFixture::new()
            .with_dirs(&[".git"])
            .with_file(".cadence/config.toml", "[interrupt\ngrace_period_secs = ");

        let err = Config::discover_from(fixture.path(), &CliArgs::default()).unwrap_err();
        assert!(matches!(
            err,
            cadence_utils::error::ConfigError::InvalidFile(_)
        ));
    }
}
