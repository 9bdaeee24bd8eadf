//! Replay source - plays back a recorded wire stream
//!
//! Reads a file of lines captured from a running streamer (console output
//! or a TCP client) and serves them again, one frame per pull.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use contracts::{wire, ContractError, Frame, FrameSource};
use tracing::{debug, info};

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Recording file
    pub path: PathBuf,

    /// Restart from the first frame when exhausted
    pub loop_playback: bool,
}

/// Replay source
pub struct ReplaySource {
    name: String,
    frames: Vec<Frame>,
    cursor: usize,
    loop_playback: bool,
}

impl ReplaySource {
    /// Load every frame from the recording
    ///
    /// # Errors
    /// `ContractError::SourceInit` when the file cannot be read, contains no
    /// frames, or holds a line that does not decode.
    pub fn load(config: &ReplayConfig) -> Result<Self, ContractError> {
        let name = format!("replay:{}", config.path.display());
        let frames = Self::read_frames(&config.path)
            .map_err(|e| ContractError::source_init(&name, e.to_string()))?;

        if frames.is_empty() {
            return Err(ContractError::source_init(&name, "recording holds no frames"));
        }

        info!(
            path = %config.path.display(),
            frames = frames.len(),
            loop_playback = config.loop_playback,
            "Loaded replay recording"
        );

        Ok(Self {
            name,
            frames,
            cursor: 0,
            loop_playback: config.loop_playback,
        })
    }

    fn read_frames(path: &Path) -> Result<Vec<Frame>, ContractError> {
        let reader = BufReader::new(File::open(path)?);
        let mut frames = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let frame = wire::decode_line(&line).map_err(|e| {
                ContractError::Other(format!("line {}: {e}", index + 1))
            })?;
            frames.push(frame);
        }

        Ok(frames)
    }

    /// Number of recorded frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the recording is empty (never true for a loaded source)
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn pull(&mut self) -> Frame {
        let frame = self.frames[self.cursor].clone();

        if self.cursor + 1 < self.frames.len() {
            self.cursor += 1;
        } else if self.loop_playback {
            debug!(source = %self.name, "Looping replay");
            self.cursor = 0;
        }

        frame
    }
}
