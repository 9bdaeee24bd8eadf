//! Synthetic frame source
//!
//! Implements `FrameSource`, generating a plausible tracking stream without
//! tracking hardware. Used for testing and development.

use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use contracts::{AuxiliaryDevice, DeviceClass, Frame, FrameSource, Matrix34};
use tracing::{debug, trace};

/// Synthetic source configuration
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Number of simulated controllers
    pub devices: usize,
    /// Period of one full head orbit
    pub period: Duration,
    /// Orbit radius (meters)
    pub radius: f32,
    /// Head height (meters)
    pub height: f32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            devices: 2,
            period: Duration::from_secs(4),
            radius: 0.5,
            height: 1.7,
        }
    }
}

/// Synthetic source
///
/// The head pose orbits the origin facing the center; controllers hang off
/// the head at fixed offsets and cycle through button masks every
/// [`BUTTON_CYCLE_TICKS`] pulls.
pub struct SyntheticSource {
    name: String,
    config: SyntheticConfig,
    started: Instant,
    ticks: u64,
    last_timestamp: u64,
}

/// Pulls between button mask changes
pub const BUTTON_CYCLE_TICKS: u64 = 50;

impl SyntheticSource {
    /// Create new synthetic source
    pub fn new(config: SyntheticConfig) -> Self {
        debug!(
            devices = config.devices,
            period_ms = config.period.as_millis() as u64,
            "synthetic source opened"
        );
        Self {
            name: "synthetic".to_string(),
            config,
            started: Instant::now(),
            ticks: 0,
            last_timestamp: 0,
        }
    }

    /// Create synthetic source with default configuration
    pub fn with_defaults() -> Self {
        Self::new(SyntheticConfig::default())
    }

    /// Wall-clock nanoseconds, forced strictly increasing across pulls
    fn next_timestamp(&mut self) -> u64 {
        let now = chrono::Utc::now()
            .timestamp_nanos_opt()
            .map(|ns| ns.max(0) as u64)
            .unwrap_or_default();
        let timestamp = now.max(self.last_timestamp + 1);
        self.last_timestamp = timestamp;
        timestamp
    }

    fn orbit_phase(&self) -> f32 {
        let period = self.config.period.as_secs_f32().max(f32::EPSILON);
        (self.started.elapsed().as_secs_f32() / period).fract() * TAU
    }

    /// Yaw rotation about +Y with translation
    fn pose(yaw: f32, translation: [f32; 3]) -> Matrix34 {
        let (sin, cos) = yaw.sin_cos();
        Matrix34 {
            m: [
                [cos, 0.0, sin, translation[0]],
                [0.0, 1.0, 0.0, translation[1]],
                [-sin, 0.0, cos, translation[2]],
            ],
        }
    }

    fn generate_devices(&self, phase: f32, head: [f32; 3]) -> Vec<AuxiliaryDevice> {
        let step = self.ticks / BUTTON_CYCLE_TICKS;
        (0..self.config.devices)
            .map(|index| {
                let side = if index % 2 == 0 { -0.25 } else { 0.25 };
                let drop = 0.4 + 0.05 * (index / 2) as f32;
                let pressed_mask = 1u64 << ((step + index as u64) % 8);
                AuxiliaryDevice {
                    class: DeviceClass::Controller,
                    device_type: "synthetic_controller".to_string(),
                    serial: format!("SYN-{index:04}"),
                    pressed_mask,
                    touched_mask: pressed_mask | (pressed_mask << 1),
                    transform: Self::pose(phase, [head[0] + side, head[1] - drop, head[2]]),
                }
            })
            .collect()
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn pull(&mut self) -> Frame {
        self.ticks += 1;
        let timestamp = self.next_timestamp();
        let phase = self.orbit_phase();

        let head = [
            self.config.radius * phase.cos(),
            self.config.height,
            self.config.radius * phase.sin(),
        ];
        let devices = self.generate_devices(phase, head);

        trace!(ticks = self.ticks, timestamp, "synthetic frame generated");

        Frame::new(timestamp, Self::pose(phase + TAU / 4.0, head)).with_devices(devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_strictly_increase() {
        let mut source = SyntheticSource::with_defaults();
        let mut last = 0;
        for _ in 0..1000 {
            let frame = source.pull();
            assert!(frame.timestamp > last);
            last = frame.timestamp;
        }
    }

    #[test]
    fn test_device_count_and_identifiers() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            devices: 3,
            ..Default::default()
        });
        let frame = source.pull();

        assert_eq!(frame.devices.len(), 3);
        assert_eq!(
            frame.devices[2].identifier(),
            "controller#synthetic_controller#SYN-0002"
        );
        assert!(frame
            .devices
            .iter()
            .all(|d| d.pressed_mask.count_ones() == 1));
    }

    #[test]
    fn test_head_height_constant() {
        let config = SyntheticConfig {
            devices: 0,
            ..Default::default()
        };
        let height = config.height;
        let mut source = SyntheticSource::new(config);
        let frame = source.pull();

        assert!(frame.devices.is_empty());
        assert!((frame.primary.translation()[1] - height).abs() < 1e-6);
    }

    #[test]
    fn test_button_masks_cycle() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            devices: 1,
            ..Default::default()
        });
        let first = source.pull().devices[0].pressed_mask;
        for _ in 0..BUTTON_CYCLE_TICKS {
            source.pull();
        }
        let later = source.pull().devices[0].pressed_mask;
        assert_ne!(first, later);
    }
}
