//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{DeliveryMode, SourceConfig, StreamerConfig, MIN_TICK_INTERVAL_MS};
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
    tick_interval_ms: u64,
    delivery: String,
    source: String,
    report_auxiliary: bool,
    max_connections: Option<usize>,
    metrics_port: Option<u16>,
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
                summary: Some(summarize(&config)),
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

fn summarize(config: &StreamerConfig) -> ConfigSummary {
    let delivery = match config.delivery_mode() {
        DeliveryMode::Console => "console".to_string(),
        DeliveryMode::Tcp { port } => format!("tcp {}:{}", config.bind_host, port),
    };
    let source = match &config.source {
        SourceConfig::Synthetic { devices, .. } => format!("synthetic ({devices} devices)"),
        SourceConfig::Replay { path, .. } => format!("replay {}", path.display()),
    };

    ConfigSummary {
        tick_interval_ms: config.effective_tick_interval().as_millis() as u64,
        delivery,
        source,
        report_auxiliary: config.report_auxiliary,
        max_connections: config.max_connections,
        metrics_port: config.metrics_port,
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &StreamerConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.tick_interval_ms < MIN_TICK_INTERVAL_MS {
        warnings.push(format!(
            "tick_interval_ms = {} is below the minimum, {} ms will be used",
            config.tick_interval_ms, MIN_TICK_INTERVAL_MS
        ));
    }

    if let DeliveryMode::Tcp { .. } = config.delivery_mode() {
        if config.max_connections.is_none() {
            warnings.push("max_connections is not set - client count is unbounded".to_string());
        }
    } else if config.max_connections.is_some() {
        warnings.push("max_connections has no effect with console delivery".to_string());
    }

    if let SourceConfig::Replay { path, .. } = &config.source {
        if !path.exists() {
            warnings.push(format!("replay file {} does not exist yet", path.display()));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Interval: {} ms", summary.tick_interval_ms);
            println!("  Delivery: {}", summary.delivery);
            println!("  Source: {}", summary.source);
            println!("  Auxiliary devices: {}", summary.report_auxiliary);
            if let Some(max) = summary.max_connections {
                println!("  Max connections: {}", max);
            }
            if let Some(port) = summary.metrics_port {
                println!("  Metrics port: {}", port);
            }
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
