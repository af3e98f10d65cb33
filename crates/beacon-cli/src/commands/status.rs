//! Status command - Show how a reporter would behave right now
//!
//! Reports the config file in use, the collector endpoint, whether an auth
//! token is configured and whether the opt-out variable is set.

use std::path::Path;

use anyhow::Result;
use beacon_core::{DoNotTrack, OptOutSignal};
use clap::Args;

use super::effective_config;
use crate::output::{OutputFormat, Status};

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = format.formatter();

        let config = effective_config(config_path);
        let opted_out = DoNotTrack::new(config.opt_out_env.clone()).is_active();
        let errors = config.validate();

        let (status, message) = if opted_out {
            (
                Status::Warning,
                format!("Telemetry is disabled ({} is set)", config.opt_out_env),
            )
        } else if errors.is_empty() {
            (Status::Ok, "Telemetry is enabled".to_string())
        } else {
            (
                Status::Error,
                "Configuration is invalid; run 'beacon config validate'".to_string(),
            )
        };

        formatter.result(
            status,
            &message,
            serde_json::json!({
                "config_path": config_path.display().to_string(),
                "config_file_exists": config_path.exists(),
                "base_url": config.base_url,
                "auth_token_set": !config.auth_token.is_empty(),
                "opt_out_env": config.opt_out_env,
                "opted_out": opted_out,
                "max_concurrent_reports": config.max_concurrent_reports,
                "delivery_timeout_secs": config.delivery_timeout_secs,
                "valid": errors.is_empty(),
            }),
        );

        let endpoint = if config.base_url.is_empty() {
            "(not configured)"
        } else {
            config.base_url.as_str()
        };
        formatter.field("Config file", &config_path.display().to_string());
        formatter.field("Collector", endpoint);
        formatter.field(
            "Auth token",
            if config.auth_token.is_empty() { "not set" } else { "set" },
        );
        formatter.field(
            "Concurrency",
            &format!(
                "{} deliveries, {}s timeout each",
                config.max_concurrent_reports, config.delivery_timeout_secs
            ),
        );

        Ok(())
    }
}
