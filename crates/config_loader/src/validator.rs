//! Config validation
//!
//! Rules:
//! - field-level rules declared on `StreamerConfig` (validator derive)
//! - replay path non-empty
//! - synthetic device count <= MAX_SYNTHETIC_DEVICES, period > 0
//! - metrics port differs from the delivery port

use contracts::{ContractError, SourceConfig, StreamerConfig};
use ::validator::Validate;

/// Upper bound on simulated auxiliary devices
pub const MAX_SYNTHETIC_DEVICES: usize = 64;

/// Validate a StreamerConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &StreamerConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_source(&config.source)?;
    validate_ports(config)?;
    Ok(())
}

/// Field-level rules
fn validate_fields(config: &StreamerConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "config".to_string());
        ContractError::config_validation(field, errors.to_string())
    })
}

/// Source-specific rules
fn validate_source(source: &SourceConfig) -> Result<(), ContractError> {
    match source {
        SourceConfig::Synthetic { devices, period_ms } => {
            if *devices > MAX_SYNTHETIC_DEVICES {
                return Err(ContractError::config_validation(
                    "source.devices",
                    format!("at most {MAX_SYNTHETIC_DEVICES} devices, got {devices}"),
                ));
            }
            if *period_ms == 0 {
                return Err(ContractError::config_validation(
                    "source.period_ms",
                    "period_ms must be > 0",
                ));
            }
        }
        SourceConfig::Replay { path, .. } => {
            if path.as_os_str().is_empty() {
                return Err(ContractError::config_validation(
                    "source.path",
                    "replay path cannot be empty",
                ));
            }
        }
    }
    Ok(())
}

/// Port rules
fn validate_ports(config: &StreamerConfig) -> Result<(), ContractError> {
    if let Some(metrics_port) = config.metrics_port {
        if config.port != 0 && metrics_port == config.port {
            return Err(ContractError::config_validation(
                "metrics_port",
                format!("metrics_port ({metrics_port}) collides with delivery port"),
            ));
        }
    }
    Ok(())
}
