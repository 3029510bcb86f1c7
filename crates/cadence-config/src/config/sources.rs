//! Per-key source attribution.

use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn source_label(source: ConfigSource) -> &'static str {
    match source {
        ConfigSource::Cli => "cli",
        ConfigSource::Config => "config",
        ConfigSource::Programmatic => "programmatic",
        ConfigSource::Default => "default",
    }
}

impl Config {
    /// Where `key` got its value. Unknown keys report `Default`.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }

    /// Effective configuration as `key -> (value, source)`, sorted by key
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut entries = BTreeMap::new();
        let mut add = |key: &str, value: String| {
            entries.insert(
                key.to_string(),
                (value, source_label(self.source_of(key)).to_string()),
            );
        };

        add("verbose", self.verbose().to_string());
        add(
            "grace_period_secs",
            self.interrupt
                .grace_period_secs
                .map_or_else(|| "none".to_string(), |secs| secs.to_string()),
        );
        add(
            "instrumentation_enabled",
            self.instrumentation_enabled().to_string(),
        );
        add(
            "instrumentation_output_dir",
            self.instrumentation_dir().to_string(),
        );
        add("package_manager", self.package_manager().to_string());
        add("output_path", self.output_path().to_string());

        entries
    }
}
