//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::ForwarderConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    url: String,
    sink: String,
    dynamic_hosts: bool,
    label_key_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    url: config.client.url.clone(),
                    sink: format!("{:?}", config.client.sink),
                    dynamic_hosts: config.has_dynamic_hosts(),
                    label_key_count: config.plugin.label_keys.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &ForwarderConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.has_dynamic_hosts() && config.controller.dynamic_host_prefix.is_empty() {
        warnings.push(
            "controller.dynamic_host_prefix is empty - cluster URLs are the bare cluster name"
                .to_string(),
        );
    }

    if config.plugin.label_map.is_some() && !config.plugin.label_keys.is_empty() {
        warnings.push(
            "plugin.label_map is set - plugin.label_keys only controls key removal".to_string(),
        );
    }

    if config.plugin.auto_kubernetes_labels && config.plugin.label_map.is_none() {
        warnings.push(
            "auto_kubernetes_labels without plugin.label_map - plugin.label_keys replace the kubernetes labels"
                .to_string(),
        );
    }

    if config.plugin.auto_kubernetes_labels
        && !config
            .plugin
            .kubernetes_metadata
            .fallback_to_tag_when_metadata_is_missing
    {
        warnings.push(
            "auto_kubernetes_labels without tag fallback - records lacking metadata get no kubernetes labels"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  URL: {}", summary.url);
            println!("  Sink: {}", summary.sink);
            println!("  Dynamic hosts: {}", summary.dynamic_hosts);
            println!("  Label keys: {}", summary.label_key_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
