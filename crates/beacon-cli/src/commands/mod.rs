pub mod config;
pub mod send;
pub mod status;

use std::path::Path;

use beacon_core::ReporterConfig;

/// Configuration as the reporter would see it: file (or defaults) plus
/// environment overrides.
pub(crate) fn effective_config(path: &Path) -> ReporterConfig {
    let mut config = ReporterConfig::load_or_default(path);
    config.apply_env_overrides();
    config
}
