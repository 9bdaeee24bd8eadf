//! Pipeline orchestrator - wires source, buffer, producer and sink.
//!
//! Startup order: frame source (fatal on failure), sink (a network sink
//! binds here), stop trigger, then the sink and producer tasks. A sink that
//! fails to bind ends the run through the same shutdown sequence as any
//! other stop trigger, and the run then reports the bind error.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::StreamerConfig;
use dispatcher::{DispatcherError, SharedFrameBuffer, Sink, SinkHandle, StopSignal};
use ingestion::{Producer, ProducerConfig, ShutdownController};
use tracing::{error, info, warn};

use super::{PipelineStats, StopCause};

/// Main pipeline orchestrator
pub struct Pipeline {
    config: StreamerConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: StreamerConfig) -> Self {
        Self { config }
    }

    /// Run until a stop trigger fires, then shut down
    pub async fn run(self) -> Result<PipelineStats> {
        let started = Instant::now();
        let config = &self.config;

        // Initialize Metrics (optional)
        if let Some(port) = config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        let source = frame_source::open_source(&config.source)
            .context("Failed to initialize frame source")?;

        let buffer = SharedFrameBuffer::new();
        let (sink, sink_error) = start_sink(config).await;

        let stop = StopSignal::new();
        ingestion::spawn_stdin_trigger(stop.clone())
            .context("Failed to watch standard input")?;

        let sink = SinkHandle::spawn(sink, Arc::clone(&buffer));
        let producer = tokio::spawn(
            Producer::new(source, Arc::clone(&buffer), ProducerConfig::from(config))
                .run(stop.clone()),
        );

        info!(
            sink = %sink.name(),
            interval_ms = config.effective_tick_interval().as_millis() as u64,
            "Streaming; enter an empty line to stop"
        );

        let sink_finished = sink.finished();
        let cause = tokio::select! {
            _ = stop.cancelled() => StopCause::StopLine,
            _ = sink_finished.cancelled() => StopCause::SinkFinished,
            _ = shutdown_signal() => StopCause::Signal,
        };
        info!(%cause, "Stopping pipeline");

        let report = ShutdownController::new(buffer, stop)
            .shutdown(producer, sink)
            .await;

        if let Some(e) = sink_error {
            return Err(e).context("Failed to start sink");
        }

        Ok(PipelineStats {
            cause,
            duration: started.elapsed(),
            producer: report.producer,
            sink: report.sink,
        })
    }
}

/// Create the configured sink
///
/// On failure the error is kept and an unavailable sink takes its place, so
/// the run still goes through the regular shutdown sequence.
async fn start_sink(config: &StreamerConfig) -> (Sink, Option<DispatcherError>) {
    match dispatcher::create_sink(config).await {
        Ok(sink) => (sink, None),
        Err(e) => {
            error!(error = %e, "Sink failed to start, shutting down");
            (Sink::unavailable("network"), Some(e))
        }
    }
}

/// Ctrl+C and SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
