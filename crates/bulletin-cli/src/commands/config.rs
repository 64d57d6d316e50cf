//! Config command - View and check the BulletinPro configuration
//!
//! Provides the `bulletin config` CLI command which:
//! 1. Shows the effective configuration (file, defaults, and environment
//!    overrides merged) as YAML or JSON, with the API key masked
//! 2. Validates the configuration file and reports errors

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use bulletin_core::config::Config;

use super::CliContext;

const MASK: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Validate => self.execute_validate(ctx),
        }
    }

    fn execute_show(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.format.formatter();
        let config = masked(&ctx.config);

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    fn execute_validate(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.format.formatter();
        let config_path = &ctx.config_path;

        // A missing file is fine (defaults apply); a malformed one is not
        if config_path.exists() {
            if let Err(e) = Config::load(config_path) {
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [format!("Failed to parse configuration: {}", e)],
                    }));
                } else {
                    formatter.error(&format!("Failed to parse configuration: {}", e));
                    formatter.field("File", &config_path.display().to_string());
                }
                anyhow::bail!("Configuration file is not valid YAML");
            }
        }

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = ctx.config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "file_exists": config_path.exists(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            if config_path.exists() {
                formatter.field("File", &config_path.display().to_string());
            } else {
                formatter.info(&format!(
                    "No file at {}; defaults and environment apply",
                    config_path.display()
                ));
            }
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.field("File", &config_path.display().to_string());
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if !errors.is_empty() {
            anyhow::bail!("Configuration has {} error(s)", errors.len());
        }
        Ok(())
    }
}

/// Copy of `config` safe to print
fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    if config.remote.api_key.is_some() {
        config.remote.api_key = Some(MASK.to_string());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use bulletin_core::config::ConfigBuilder;

    fn context(config: Config, config_path: std::path::PathBuf) -> CliContext {
        CliContext {
            config_path,
            config,
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn test_masked_hides_api_key() {
        let config = ConfigBuilder::new().remote_api_key("secret-key").build();
        let shown = masked(&config);
        assert_eq!(shown.remote.api_key.as_deref(), Some(MASK));
        assert_eq!(shown.remote.url, config.remote.url);

        let yaml = serde_yaml::to_string(&shown).unwrap();
        assert!(!yaml.contains("secret-key"));
    }

    #[test]
    fn test_masked_keeps_absent_key() {
        let shown = masked(&Config::default());
        assert!(shown.remote.api_key.is_none());
    }

    #[tokio::test]
    async fn test_validate_missing_file_with_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(Config::default(), dir.path().join("absent.yaml"));
        assert!(ConfigCommand::Validate.execute(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_reports_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigBuilder::new().sync_interval_secs(0).build();
        let ctx = context(config, dir.path().join("absent.yaml"));
        assert!(ConfigCommand::Validate.execute(&ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_validate_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "remote: [not, a, mapping").unwrap();
        let ctx = context(Config::default(), path);
        assert!(ConfigCommand::Validate.execute(&ctx).await.is_err());
    }
}
