//! Producer - fixed-cadence sampling loop
//!
//! Pulls one frame per tick, encodes it and publishes it into the shared
//! buffer. Publishing never waits for consumers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{wire, FrameSource, StreamerConfig, MIN_TICK_INTERVAL_MS};
use dispatcher::{SharedFrameBuffer, StopSignal};
use observability::{RunningStats, StatsSummary};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

/// Producer settings
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Time between pulls
    pub tick_interval: Duration,
    /// Include auxiliary device records in every line
    pub report_auxiliary: bool,
}

impl From<&StreamerConfig> for ProducerConfig {
    fn from(config: &StreamerConfig) -> Self {
        Self {
            tick_interval: config.effective_tick_interval(),
            report_auxiliary: config.report_auxiliary,
        }
    }
}

/// Summary of one producer run
#[derive(Debug, Clone, Default)]
pub struct ProducerStats {
    /// Frames published
    pub frames_published: u64,
    /// Wall time spent in the loop
    pub duration: Duration,
    /// Measured time between consecutive publishes (ms)
    pub interval_ms: StatsSummary,
}

impl ProducerStats {
    /// Average publish rate
    pub fn fps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.frames_published as f64 / secs
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for ProducerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames in {:.2}s ({:.1} fps), interval ms: {}",
            self.frames_published,
            self.duration.as_secs_f64(),
            self.fps(),
            self.interval_ms
        )
    }
}

/// Sampling loop over a frame source
pub struct Producer<S> {
    source: S,
    buffer: Arc<SharedFrameBuffer>,
    config: ProducerConfig,
}

impl<S: FrameSource> Producer<S> {
    /// Create a producer publishing into `buffer`
    ///
    /// Intervals below `MIN_TICK_INTERVAL_MS` are raised to it.
    pub fn new(source: S, buffer: Arc<SharedFrameBuffer>, mut config: ProducerConfig) -> Self {
        config.tick_interval = config
            .tick_interval
            .max(Duration::from_millis(MIN_TICK_INTERVAL_MS));
        Self {
            source,
            buffer,
            config,
        }
    }

    /// Run until `stop` is cancelled
    ///
    /// The first frame is published immediately. Stop is checked before every
    /// pull, so no frame is published after it has been observed.
    #[instrument(
        name = "producer_run",
        skip(self, stop),
        fields(
            source = %self.source.name(),
            interval_ms = self.config.tick_interval.as_millis() as u64
        )
    )]
    pub async fn run(mut self, stop: StopSignal) -> ProducerStats {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let started = Instant::now();
        let mut last_publish: Option<Instant> = None;
        let mut intervals = RunningStats::default();
        let mut published: u64 = 0;

        info!(
            source = %self.source.name(),
            report_auxiliary = self.config.report_auxiliary,
            "Producer started"
        );

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let frame = self.source.pull();
            let line = wire::encode_frame(&frame, self.config.report_auxiliary);
            self.buffer.publish(line);
            published += 1;
            observability::record_frame_published(published);

            let now = Instant::now();
            if let Some(previous) = last_publish.replace(now) {
                let interval_ms = now.duration_since(previous).as_secs_f64() * 1000.0;
                intervals.push(interval_ms);
                observability::record_tick_interval_ms(interval_ms);
            }

            if published.is_multiple_of(1000) {
                debug!(frames = published, "Producer progress");
            }
        }

        let stats = ProducerStats {
            frames_published: published,
            duration: started.elapsed(),
            interval_ms: intervals.summary(),
        };
        info!(
            frames = stats.frames_published,
            fps = %format_args!("{:.1}", stats.fps()),
            "Producer stopped"
        );

        stats
    }
}
