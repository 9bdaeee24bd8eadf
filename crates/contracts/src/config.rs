//! StreamerConfig - Config Loader output
//!
//! Resolved runtime settings: tick cadence, delivery mode, source selection.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lower bound for the sampling interval (milliseconds)
pub const MIN_TICK_INTERVAL_MS: u64 = 1;

/// Default sampling interval (milliseconds)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

/// Complete streamer configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StreamerConfig {
    /// Sampling interval in milliseconds, floor-clamped to [`MIN_TICK_INTERVAL_MS`]
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// TCP port; 0 selects console delivery
    #[serde(default)]
    pub port: u16,

    /// Listen address for TCP delivery
    #[serde(default = "default_bind_host")]
    #[validate(length(min = 1))]
    pub bind_host: String,

    /// Append auxiliary device records to every line
    #[serde(default)]
    pub report_auxiliary: bool,

    /// Maximum simultaneous TCP clients (None = unbounded)
    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_connections: Option<usize>,

    /// Prometheus exporter port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Frame source selection
    #[serde(default)]
    pub source: SourceConfig,
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            port: 0,
            bind_host: default_bind_host(),
            report_auxiliary: false,
            max_connections: None,
            metrics_port: None,
            source: SourceConfig::default(),
        }
    }
}

impl StreamerConfig {
    /// Sampling interval after applying the lower bound
    pub fn effective_tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS))
    }

    /// Delivery mode resolved from `port`
    pub fn delivery_mode(&self) -> DeliveryMode {
        match self.port {
            0 => DeliveryMode::Console,
            port => DeliveryMode::Tcp { port },
        }
    }
}

/// Where frames are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Standard output
    Console,
    /// Every client connected to a TCP listener
    Tcp { port: u16 },
}

/// Frame source selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Generated poses
    Synthetic {
        /// Number of simulated auxiliary controllers
        #[serde(default = "default_synthetic_devices")]
        devices: usize,

        /// Period of the simulated head motion (milliseconds)
        #[serde(default = "default_synthetic_period_ms")]
        period_ms: u64,
    },

    /// Previously recorded wire lines
    Replay {
        /// Recording file, one frame per line
        path: PathBuf,

        /// Restart from the first frame when exhausted
        #[serde(default = "default_loop_playback")]
        loop_playback: bool,
    },
}

fn default_synthetic_devices() -> usize {
    2
}

fn default_synthetic_period_ms() -> u64 {
    4000
}

fn default_loop_playback() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Synthetic {
            devices: default_synthetic_devices(),
            period_ms: default_synthetic_period_ms(),
        }
    }
}

impl SourceConfig {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Synthetic { .. } => "synthetic",
            Self::Replay { .. } => "replay",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_interval_floor() {
        let config = StreamerConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            config.effective_tick_interval(),
            Duration::from_millis(MIN_TICK_INTERVAL_MS)
        );

        let config = StreamerConfig {
            tick_interval_ms: 25,
            ..Default::default()
        };
        assert_eq!(config.effective_tick_interval(), Duration::from_millis(25));
    }

    #[test]
    fn test_delivery_mode_from_port() {
        let mut config = StreamerConfig::default();
        assert_eq!(config.delivery_mode(), DeliveryMode::Console);

        config.port = 7000;
        assert_eq!(config.delivery_mode(), DeliveryMode::Tcp { port: 7000 });
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let config: StreamerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
        assert_eq!(config.bind_host, "0.0.0.0");
        assert!(!config.report_auxiliary);
        assert!(matches!(
            config.source,
            SourceConfig::Synthetic { devices: 2, .. }
        ));
    }

    #[test]
    fn test_replay_source_json() {
        let config: StreamerConfig = serde_json::from_str(
            r#"{"source": {"kind": "replay", "path": "session.log"}}"#,
        )
        .unwrap();
        match config.source {
            SourceConfig::Replay {
                path,
                loop_playback,
            } => {
                assert_eq!(path, PathBuf::from("session.log"));
                assert!(loop_playback);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_connection_cap() {
        let config = StreamerConfig {
            max_connections: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
