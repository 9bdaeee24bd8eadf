//! Pipeline statistics.

use std::time::Duration;

use dispatcher::SinkReport;
use ingestion::ProducerStats;

/// What ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// Empty line or end of standard input
    StopLine,
    /// Ctrl+C or SIGTERM
    Signal,
    /// The sink returned on its own (e.g. standard output closed)
    SinkFinished,
}

impl std::fmt::Display for StopCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::StopLine => "stop line on standard input",
            Self::Signal => "signal",
            Self::SinkFinished => "sink finished",
        };
        f.write_str(text)
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// What ended the run
    pub cause: StopCause,

    /// Total duration of the run
    pub duration: Duration,

    /// Producer statistics (None if the producer task failed)
    pub producer: Option<ProducerStats>,

    /// Sink state at exit
    pub sink: SinkReport,
}

impl PipelineStats {
    /// Frames published by the producer
    pub fn frames_published(&self) -> u64 {
        self.producer
            .as_ref()
            .map(|p| p.frames_published)
            .unwrap_or_default()
    }

    /// Render the summary shown at exit
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Pose Streamer Statistics ===\n");
        out.push_str(&format!("Stopped by: {}\n", self.cause));
        out.push_str(&format!("Duration: {:.2}s\n", self.duration.as_secs_f64()));
        match &self.producer {
            Some(producer) => out.push_str(&format!("Producer: {producer}\n")),
            None => out.push_str("Producer: failed\n"),
        }
        out.push_str(&format!("Sink '{}': {}\n", self.sink.name, self.sink.metrics));
        out
    }

    /// Print the summary to standard error
    ///
    /// Standard output may be the console sink's data stream.
    pub fn print_summary(&self) {
        eprintln!("\n{}", self.summary());
    }
}
