//! # Frame Source
//!
//! Concrete `FrameSource` implementations.
//!
//! Responsibilities:
//! - Open the configured source (fatal at startup on failure)
//! - Synthetic pose generation for development without tracking hardware
//! - Playback of recorded streams

pub mod replay;
pub mod synthetic;

use std::time::Duration;

use contracts::{ContractError, FrameSource, SourceConfig};
use tracing::{info, instrument};

pub use replay::{ReplayConfig, ReplaySource};
pub use synthetic::{SyntheticConfig, SyntheticSource};

/// Open the source selected by configuration
///
/// # Errors
/// `ContractError::SourceInit` if the source cannot be initialized.
#[instrument(name = "frame_source_open", skip(config), fields(kind = config.kind()))]
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>, ContractError> {
    let source: Box<dyn FrameSource> = match config {
        SourceConfig::Synthetic { devices, period_ms } => {
            Box::new(SyntheticSource::new(SyntheticConfig {
                devices: *devices,
                period: Duration::from_millis(*period_ms),
                ..Default::default()
            }))
        }
        SourceConfig::Replay {
            path,
            loop_playback,
        } => Box::new(ReplaySource::load(&ReplayConfig {
            path: path.clone(),
            loop_playback: *loop_playback,
        })?),
    };

    info!(source = source.name(), "Frame source initialized");
    Ok(source)
}
