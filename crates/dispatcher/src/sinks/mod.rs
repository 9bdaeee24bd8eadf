//! Sink implementations
//!
//! Contains ConsoleSink and NetworkSink, plus the delivery loop they share.

mod console;
mod network;

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::buffer::{FrameReader, SharedFrameBuffer, Snapshot};
use crate::metrics::SinkMetrics;

pub use self::console::ConsoleSink;
pub use self::network::{NetworkSink, NetworkSinkConfig, DEFAULT_DRAIN_GRACE};

/// Everything a running sink shares with the rest of the pipeline
#[derive(Debug, Clone)]
pub struct SinkContext {
    /// Buffer the producer publishes into
    pub buffer: Arc<SharedFrameBuffer>,
    /// Set once by `SinkHandle::request_stop`
    pub stop: CancellationToken,
    /// Counters for this sink
    pub metrics: Arc<SinkMetrics>,
}

/// Why a sink's top-level loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkExit {
    /// Stop was requested
    Stopped,
    /// The output endpoint stopped accepting writes
    OutputClosed,
    /// The output endpoint never opened
    Unavailable,
}

/// Frame output strategy
///
/// `run` is the sink's top-level loop. It returns once stop has been
/// requested and the buffer has been cleared, or when its output fails.
#[trait_variant::make(FrameSink: Send)]
pub trait LocalFrameSink {
    /// Sink name
    fn name(&self) -> &str;

    /// Deliver frames until stopped
    async fn run(self, ctx: SinkContext) -> SinkExit;
}

/// Copy every frame the reader observes into `writer`
///
/// Stop is checked once per wake. An empty snapshot is never written; after
/// one the loop waits for stop or for the next publish.
pub(crate) async fn deliver<W>(
    writer: &mut W,
    mut reader: FrameReader,
    stop: &CancellationToken,
    metrics: &SinkMetrics,
    sink_name: &str,
) -> SinkExit
where
    W: AsyncWrite + Unpin,
{
    loop {
        if stop.is_cancelled() {
            return SinkExit::Stopped;
        }

        let (line, skipped) = match reader.await_and_copy().await {
            Snapshot::Frame { line, skipped, .. } => (line, skipped),
            Snapshot::Empty => {
                trace!(sink = %sink_name, "Woken with empty buffer");
                // Sentinel stays until the next publish
                tokio::select! {
                    _ = stop.cancelled() => {}
                    _ = reader.changed() => {}
                }
                continue;
            }
        };

        if skipped > 0 {
            metrics.add_skipped_count(skipped);
            observability::record_frames_skipped(sink_name, skipped);
        }

        let written = async {
            writer.write_all(&line).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            metrics.inc_failure_count();
            observability::record_write_failure(sink_name);
            debug!(sink = %sink_name, error = %e, "Write failed, output closed");
            return SinkExit::OutputClosed;
        }

        metrics.inc_delivered_count();
        observability::record_frame_delivered(sink_name);
    }
}
