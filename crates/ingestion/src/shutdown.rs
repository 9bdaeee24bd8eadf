//! ShutdownController - cooperative stop protocol
//!
//! Order matters:
//! 1. the producer loop exits
//! 2. the sink's stop flag is set (a network sink also closes its listener)
//! 3. the buffer is cleared and every parked reader is woken
//! 4. the sink task is joined
//!
//! Step 3 must follow step 2: a reader woken before the flag is visible
//! would go back to waiting with nobody left to wake it.

use std::sync::Arc;

use dispatcher::{SharedFrameBuffer, SinkHandle, SinkReport, StopSignal};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::producer::ProducerStats;

/// Outcome of a full shutdown
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// Producer statistics; `None` if its task failed
    pub producer: Option<ProducerStats>,
    /// Sink state at exit
    pub sink: SinkReport,
}

/// Drives the stop sequence exactly once
pub struct ShutdownController {
    buffer: Arc<SharedFrameBuffer>,
    producer_stop: StopSignal,
}

impl ShutdownController {
    /// Create a controller for the producer stopped by `producer_stop`
    pub fn new(buffer: Arc<SharedFrameBuffer>, producer_stop: StopSignal) -> Self {
        Self {
            buffer,
            producer_stop,
        }
    }

    /// Stop the producer and the sink, then wait for both
    ///
    /// Consumes the controller, so the buffer is cleared once.
    #[instrument(name = "shutdown_run", skip_all, fields(sink = %sink.name()))]
    pub async fn shutdown(
        self,
        producer: JoinHandle<ProducerStats>,
        sink: SinkHandle,
    ) -> ShutdownReport {
        info!("Shutdown started");

        self.producer_stop.cancel();
        let producer = match producer.await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!(error = ?e, "Producer task failed");
                None
            }
        };

        sink.request_stop();
        self.buffer.clear_and_wake();

        let sink = sink.join().await;
        info!(sink = %sink.name, "Shutdown complete");

        ShutdownReport { producer, sink }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::{Producer, ProducerConfig};
    use contracts::{Frame, FrameSource, Matrix34};
    use dispatcher::{ConsoleSink, SinkExit, Snapshot};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};

    struct FixedSource;

    impl FrameSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn pull(&mut self) -> Frame {
            Frame::new(42, Matrix34::IDENTITY)
        }
    }

    #[tokio::test]
    async fn test_full_shutdown_releases_sink() {
        let buffer = SharedFrameBuffer::new();
        let (out, inp) = tokio::io::duplex(1 << 16);
        let sink = SinkHandle::spawn(ConsoleSink::new("console", out), Arc::clone(&buffer));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let stop = StopSignal::new();
        let producer = tokio::spawn(
            Producer::new(
                FixedSource,
                Arc::clone(&buffer),
                ProducerConfig {
                    tick_interval: Duration::from_millis(2),
                    report_auxiliary: false,
                },
            )
            .run(stop.clone()),
        );

        let mut lines = BufReader::new(inp).lines();
        lines.next_line().await.unwrap().unwrap();

        stop.cancel();
        let controller = ShutdownController::new(Arc::clone(&buffer), stop);
        let report = tokio::time::timeout(
            Duration::from_secs(2),
            controller.shutdown(producer, sink),
        )
        .await
        .expect("shutdown hung");

        // Buffer is left holding the sentinel
        assert_eq!(buffer.reader().try_copy(), Some(Snapshot::Empty));
        assert_eq!(report.sink.exit, Some(SinkExit::Stopped));
        let producer = report.producer.unwrap();
        assert!(producer.frames_published >= 1);
        assert!(report.sink.metrics.delivered_count >= 1);
    }

    #[tokio::test]
    async fn test_shutdown_with_idle_sink() {
        let buffer = SharedFrameBuffer::new();
        let (out, _inp) = tokio::io::duplex(64);
        let sink = SinkHandle::spawn(ConsoleSink::new("console", out), Arc::clone(&buffer));

        let stop = StopSignal::new();
        let producer = tokio::spawn(async { ProducerStats::default() });

        let report = tokio::time::timeout(
            Duration::from_secs(2),
            ShutdownController::new(Arc::clone(&buffer), stop).shutdown(producer, sink),
        )
        .await
        .expect("shutdown hung");

        assert_eq!(report.sink.exit, Some(SinkExit::Stopped));
        assert_eq!(report.sink.metrics.delivered_count, 0);
    }
}
