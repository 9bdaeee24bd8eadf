//! Frame - FrameSource output
//!
//! One immutable timestamped tracking sample.

use serde::{Deserialize, Serialize};

/// Number of floats in a 3x4 row-major transform.
pub const MATRIX34_LEN: usize = 12;

/// 3x4 row-major rigid transform (rotation | translation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix34 {
    pub m: [[f32; 4]; 3],
}

impl Matrix34 {
    /// Identity rotation, zero translation
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    /// Build from a flat row-major array
    pub fn from_row_major(values: [f32; MATRIX34_LEN]) -> Self {
        let mut m = [[0.0f32; 4]; 3];
        for (i, value) in values.into_iter().enumerate() {
            m[i / 4][i % 4] = value;
        }
        Self { m }
    }

    /// Iterate elements in row-major order
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.m.iter().flat_map(|row| row.iter().copied())
    }

    /// Translation column
    pub fn translation(&self) -> [f32; 3] {
        [self.m[0][3], self.m[1][3], self.m[2][3]]
    }
}

impl Default for Matrix34 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Tracked device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    #[default]
    Invalid,
    Hmd,
    Controller,
    Tracker,
    Reference,
    Display,
}

impl DeviceClass {
    /// Tag used in the wire identifier
    pub fn tag(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Hmd => "hmd",
            Self::Controller => "controller",
            Self::Tracker => "tracker",
            Self::Reference => "reference",
            Self::Display => "display",
        }
    }

    /// Inverse of [`DeviceClass::tag`]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "invalid" => Some(Self::Invalid),
            "hmd" => Some(Self::Hmd),
            "controller" => Some(Self::Controller),
            "tracker" => Some(Self::Tracker),
            "reference" => Some(Self::Reference),
            "display" => Some(Self::Display),
            _ => None,
        }
    }
}

/// Auxiliary device record (controllers, trackers, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryDevice {
    /// Device class
    pub class: DeviceClass,

    /// Model / type string reported by the runtime
    pub device_type: String,

    /// Serial number
    pub serial: String,

    /// Pressed button bitmask
    pub pressed_mask: u64,

    /// Touched button bitmask
    pub touched_mask: u64,

    /// Device-to-world transform
    pub transform: Matrix34,
}

impl AuxiliaryDevice {
    /// `<classTag>#<type>#<serial>` identifier
    pub fn identifier(&self) -> String {
        format!(
            "{}#{}#{}",
            self.class.tag(),
            sanitize_field(&self.device_type),
            sanitize_field(&self.serial)
        )
    }
}

/// Replace characters that would break the identifier framing
fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '#' | '[' | ']' | '\n') { '_' } else { c })
        .collect()
}

/// Tracking frame
///
/// Produced once per tick; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Wall-clock timestamp, nanoseconds since the Unix epoch
    pub timestamp: u64,

    /// Primary (head-mounted display) transform
    pub primary: Matrix34,

    /// Auxiliary devices, in runtime index order
    #[serde(default)]
    pub devices: Vec<AuxiliaryDevice>,
}

impl Frame {
    /// Frame with no auxiliary devices
    pub fn new(timestamp: u64, primary: Matrix34) -> Self {
        Self {
            timestamp,
            primary,
            devices: Vec::new(),
        }
    }

    /// Attach auxiliary device records
    pub fn with_devices(mut self, devices: Vec<AuxiliaryDevice>) -> Self {
        self.devices = devices;
        self
    }
}
