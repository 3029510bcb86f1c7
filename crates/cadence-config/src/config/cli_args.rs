use std::path::PathBuf;

/// Values supplied on the command line.
///
/// Every field is optional; `None` defers to the config file and then the
/// built-in default.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file, bypassing discovery.
    pub config_path: Option<PathBuf>,
    pub verbose: Option<bool>,
    pub grace_period_secs: Option<f64>,
    pub instrumentation: Option<bool>,
    pub package_manager: Option<String>,
    pub output_path: Option<String>,
}
