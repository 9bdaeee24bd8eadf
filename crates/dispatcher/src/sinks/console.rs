//! ConsoleSink - writes frame lines to standard output

use tokio::io::{AsyncWrite, Stdout};
use tracing::{info, instrument};

use super::{deliver, FrameSink, SinkContext, SinkExit};

/// Sink that writes every observed frame line to a byte stream
///
/// Standard output in production; any `AsyncWrite` in tests. Each line is
/// flushed as soon as it is written.
pub struct ConsoleSink<W = Stdout> {
    name: String,
    writer: W,
}

impl ConsoleSink<Stdout> {
    /// ConsoleSink bound to the process's standard output
    pub fn stdout() -> Self {
        Self::new("console", tokio::io::stdout())
    }
}

impl<W> ConsoleSink<W> {
    /// Create a ConsoleSink over `writer`
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }
}

impl<W> FrameSink for ConsoleSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "console_sink_run", skip(self, ctx), fields(sink = %self.name))]
    async fn run(self, ctx: SinkContext) -> SinkExit {
        let Self { name, mut writer } = self;
        let reader = ctx.buffer.reader();

        info!(sink = %name, "Console delivery started");
        let exit = deliver(&mut writer, reader, &ctx.stop, &ctx.metrics, &name).await;
        info!(sink = %name, ?exit, "Console delivery finished");

        exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SharedFrameBuffer;
    use crate::metrics::SinkMetrics;
    use bytes::Bytes;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio_util::sync::CancellationToken;

    fn context(buffer: &Arc<SharedFrameBuffer>) -> SinkContext {
        SinkContext {
            buffer: Arc::clone(buffer),
            stop: CancellationToken::new(),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    #[tokio::test]
    async fn test_console_sink_writes_lines() {
        let buffer = SharedFrameBuffer::new();
        let ctx = context(&buffer);
        let (out, inp) = tokio::io::duplex(4096);
        let task = tokio::spawn(ConsoleSink::new("console", out).run(ctx.clone()));
        let mut lines = BufReader::new(inp).lines();
        tokio::time::sleep(Duration::from_millis(20)).await;

        buffer.publish(Bytes::from_static(b"00aa\n"));
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "00aa");

        buffer.publish(Bytes::from_static(b"00bb\n"));
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "00bb");

        ctx.stop.cancel();
        buffer.clear_and_wake();
        assert_eq!(task.await.unwrap(), SinkExit::Stopped);
        assert_eq!(ctx.metrics.delivered_count(), 2);

        // Nothing is written for the sentinel
        assert!(lines.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_console_sink_stops_on_closed_output() {
        let buffer = SharedFrameBuffer::new();
        let ctx = context(&buffer);
        let (out, inp) = tokio::io::duplex(64);
        drop(inp);

        let task = tokio::spawn(ConsoleSink::new("console", out).run(ctx.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        buffer.publish(Bytes::from_static(b"00aa\n"));

        let exit = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(exit, SinkExit::OutputClosed);
        assert_eq!(ctx.metrics.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_request_stop_alone_does_not_release() {
        let buffer = SharedFrameBuffer::new();
        let ctx = context(&buffer);
        let (out, _inp) = tokio::io::duplex(64);
        let task = tokio::spawn(ConsoleSink::new("console", out).run(ctx.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;

        ctx.stop.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        buffer.clear_and_wake();
        let exit = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(exit, SinkExit::Stopped);
    }

    #[tokio::test]
    async fn test_publish_after_clear_resumes_delivery() {
        let buffer = SharedFrameBuffer::new();
        let ctx = context(&buffer);
        let (out, inp) = tokio::io::duplex(4096);
        let task = tokio::spawn(ConsoleSink::new("console", out).run(ctx.clone()));
        let mut lines = BufReader::new(inp).lines();
        tokio::time::sleep(Duration::from_millis(20)).await;

        buffer.clear_and_wake();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        buffer.publish(Bytes::from_static(b"00cc\n"));
        let line = tokio::time::timeout(Duration::from_secs(1), lines.next_line())
            .await
            .expect("delivery did not resume")
            .unwrap()
            .unwrap();
        assert_eq!(line, "00cc");

        ctx.stop.cancel();
        buffer.clear_and_wake();
        assert_eq!(task.await.unwrap(), SinkExit::Stopped);
        assert_eq!(ctx.metrics.delivered_count(), 1);
    }
}
