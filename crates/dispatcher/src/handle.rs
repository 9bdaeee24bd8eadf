//! SinkHandle - manages a running sink task

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use crate::buffer::SharedFrameBuffer;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{FrameSink, SinkContext, SinkExit};

/// Final state of a joined sink
#[derive(Debug, Clone)]
pub struct SinkReport {
    /// Sink name
    pub name: String,
    /// Why it returned; `None` if the task panicked or was cancelled
    pub exit: Option<SinkExit>,
    /// Counters at exit
    pub metrics: MetricsSnapshot,
}

/// Handle to a running sink
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Stop flag observed by the sink and all of its writers
    stop: CancellationToken,
    /// Cancelled when the sink's top-level loop returns
    finished: CancellationToken,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Sink task handle
    task: JoinHandle<SinkExit>,
}

impl SinkHandle {
    /// Spawn the sink's top-level loop
    pub fn spawn<S: FrameSink + 'static>(sink: S, buffer: Arc<SharedFrameBuffer>) -> Self {
        let name = sink.name().to_string();
        let stop = CancellationToken::new();
        let finished = CancellationToken::new();
        let metrics = Arc::new(SinkMetrics::new());

        let ctx = SinkContext {
            buffer,
            stop: stop.clone(),
            metrics: Arc::clone(&metrics),
        };
        let done = finished.clone();
        let task = tokio::spawn(async move {
            let _done = done.drop_guard();
            sink.run(ctx).await
        });

        debug!(sink = %name, "Sink started");

        Self {
            name,
            stop,
            finished,
            metrics,
            task,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Token cancelled once the sink's loop has returned on its own or otherwise
    pub fn finished(&self) -> CancellationToken {
        self.finished.clone()
    }

    /// Whether stop has been requested
    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Set the stop flag
    ///
    /// For a network sink this also closes the listener. Loops parked on the
    /// buffer only observe it after the next wake.
    pub fn request_stop(&self) {
        debug!(sink = %self.name, "Stop requested");
        self.stop.cancel();
    }

    /// Wait for the sink task to finish
    #[instrument(name = "sink_handle_join", skip(self), fields(sink = %self.name))]
    pub async fn join(self) -> SinkReport {
        let exit = match self.task.await {
            Ok(exit) => Some(exit),
            Err(e) => {
                error!(sink = %self.name, error = ?e, "Sink task failed");
                None
            }
        };
        debug!(sink = %self.name, ?exit, "SinkHandle join complete");

        SinkReport {
            name: self.name,
            exit,
            metrics: self.metrics.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::ConsoleSink;
    use bytes::Bytes;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn test_sink_handle_stop_then_clear() {
        let buffer = SharedFrameBuffer::new();
        let (out, inp) = tokio::io::duplex(1024);
        let handle = SinkHandle::spawn(ConsoleSink::new("console", out), Arc::clone(&buffer));
        let mut lines = BufReader::new(inp).lines();
        tokio::time::sleep(Duration::from_millis(20)).await;

        for n in 0..3u8 {
            buffer.publish(Bytes::from(format!("{n:02x}\n")));
            lines.next_line().await.unwrap().unwrap();
        }

        handle.request_stop();
        assert!(handle.is_stop_requested());
        buffer.clear_and_wake();

        let finished = handle.finished();
        let report = handle.join().await;
        assert!(finished.is_cancelled());
        assert_eq!(report.name, "console");
        assert_eq!(report.exit, Some(SinkExit::Stopped));
        assert_eq!(report.metrics.delivered_count, 3);
    }

    #[tokio::test]
    async fn test_finished_fires_when_sink_ends_on_its_own() {
        let buffer = SharedFrameBuffer::new();
        let (out, inp) = tokio::io::duplex(64);
        drop(inp);
        let handle = SinkHandle::spawn(ConsoleSink::new("console", out), Arc::clone(&buffer));
        tokio::time::sleep(Duration::from_millis(20)).await;

        buffer.publish(Bytes::from_static(b"ff\n"));
        tokio::time::timeout(Duration::from_secs(1), handle.finished().cancelled())
            .await
            .unwrap();

        let report = handle.join().await;
        assert_eq!(report.exit, Some(SinkExit::OutputClosed));
        assert_eq!(report.metrics.failure_count, 1);
    }
}
