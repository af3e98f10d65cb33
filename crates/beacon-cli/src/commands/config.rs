//! Config command - View and validate Beacon configuration
//!
//! Provides the `beacon config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors

use std::path::Path;

use anyhow::{Context, Result};
use beacon_core::ReporterConfig;
use clap::Subcommand;
use tracing::info;

use super::effective_config;
use crate::output::{OutputFormat, Status};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(config_path, format),
            ConfigCommand::Validate => execute_validate(config_path, format),
        }
    }
}

/// Show the effective configuration; the auth token is never printed.
fn execute_show(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = format.formatter();
    let config = redacted(effective_config(config_path));

    info!(config_path = %config_path.display(), "Showing configuration");

    let json =
        serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
    let yaml =
        serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;

    formatter.result(
        Status::Ok,
        &format!("Configuration ({})", config_path.display()),
        serde_json::json!({
            "config_path": config_path.display().to_string(),
            "config": json,
        }),
    );
    formatter.line("");
    for line in yaml.lines() {
        formatter.line(line);
    }

    Ok(())
}

fn execute_validate(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = format.formatter();

    // Load explicitly: a broken file must be reported, not replaced by defaults
    let mut config = match ReporterConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            let message = if config_path.exists() {
                format!("Failed to parse configuration: {}", e)
            } else {
                "Configuration file not found".to_string()
            };

            formatter.result(
                Status::Error,
                &message,
                serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": [message],
                }),
            );
            formatter.field("File", &config_path.display().to_string());
            return Ok(());
        }
    };
    config.apply_env_overrides();

    info!(config_path = %config_path.display(), "Validating configuration");

    let errors = config.validate();
    let (status, message) = if errors.is_empty() {
        (Status::Ok, "Configuration is valid".to_string())
    } else {
        (
            Status::Error,
            format!(
                "Configuration has {} error{}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ),
        )
    };

    let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    formatter.result(
        status,
        &message,
        serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_strings,
        }),
    );
    formatter.field("File", &config_path.display().to_string());
    for error in &errors {
        formatter.field(&error.field, &error.message);
    }

    Ok(())
}

fn redacted(mut config: ReporterConfig) -> ReporterConfig {
    if !config.auth_token.is_empty() {
        config.auth_token = "********".to_string();
    }
    config
}
