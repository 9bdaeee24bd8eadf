//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 控制台投递时序 (生产者 + ConsoleSink)
//! - TCP 多客户端广播、断开隔离
//! - 协作式关闭 (停止行 → requestStop → clearAndWake → join)

#[cfg(test)]
mod support {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{wire, Frame, StreamerConfig};
    use dispatcher::{network_config, NetworkSink, SharedFrameBuffer, SinkHandle, StopSignal};
    use frame_source::{SyntheticConfig, SyntheticSource};
    use ingestion::{Producer, ProducerConfig, ProducerStats};
    use tokio::task::JoinHandle;

    pub const WAKE_TIMEOUT: Duration = Duration::from_secs(2);

    pub fn decode(line: &str) -> Frame {
        wire::decode_line(line).expect("received line must decode")
    }

    pub fn synthetic_producer(
        buffer: &Arc<SharedFrameBuffer>,
        interval: Duration,
        report_auxiliary: bool,
        stop: &StopSignal,
    ) -> JoinHandle<ProducerStats> {
        let source = SyntheticSource::new(SyntheticConfig::default());
        let config = ProducerConfig {
            tick_interval: interval,
            report_auxiliary,
        };
        tokio::spawn(Producer::new(source, Arc::clone(buffer), config).run(stop.clone()))
    }

    /// Network sink on an ephemeral loopback port
    pub async fn loopback_network(
        buffer: &Arc<SharedFrameBuffer>,
    ) -> (SinkHandle, std::net::SocketAddr) {
        let config = StreamerConfig {
            bind_host: "127.0.0.1".to_string(),
            ..Default::default()
        };
        let sink = NetworkSink::bind("network", network_config(&config, 0))
            .await
            .unwrap();
        let addr = sink.local_addr().unwrap();
        (SinkHandle::spawn(sink, Arc::clone(buffer)), addr)
    }

    /// Give the accept loop time to register new clients
    pub async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[cfg(test)]
mod console_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use dispatcher::{ConsoleSink, SharedFrameBuffer, SinkExit, SinkHandle, StopSignal};
    use ingestion::ShutdownController;
    use tokio::io::{AsyncBufReadExt, BufReader};

    use crate::support::*;

    /// Producer at 10 ms + ConsoleSink for 55 ms: at least 4 distinct frames,
    /// timestamps strictly increasing.
    #[tokio::test]
    async fn test_console_delivery_cadence() {
        let buffer = SharedFrameBuffer::new();
        let (out, inp) = tokio::io::duplex(1 << 20);
        let sink = SinkHandle::spawn(ConsoleSink::new("console", out), Arc::clone(&buffer));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let stop = StopSignal::new();
        let producer = synthetic_producer(&buffer, Duration::from_millis(10), false, &stop);
        tokio::time::sleep(Duration::from_millis(55)).await;

        let report = ShutdownController::new(Arc::clone(&buffer), stop)
            .shutdown(producer, sink)
            .await;
        assert_eq!(report.sink.exit, Some(SinkExit::Stopped));

        // The sink owned the writer; it is dropped now, so reading ends at EOF
        let mut lines = BufReader::new(inp).lines();
        let mut timestamps = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            timestamps.push(decode(&line).timestamp);
        }

        assert!(
            timestamps.len() >= 4,
            "expected at least 4 frames, got {}",
            timestamps.len()
        );
        assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            report.sink.metrics.delivered_count,
            timestamps.len() as u64
        );
    }

    #[tokio::test]
    async fn test_console_lines_carry_auxiliary_devices() {
        let buffer = SharedFrameBuffer::new();
        let (out, inp) = tokio::io::duplex(1 << 16);
        let sink = SinkHandle::spawn(ConsoleSink::new("console", out), Arc::clone(&buffer));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let stop = StopSignal::new();
        let producer = synthetic_producer(&buffer, Duration::from_millis(5), true, &stop);

        let mut lines = BufReader::new(inp).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let frame = decode(&line);
        assert_eq!(frame.devices.len(), 2);
        assert!(frame.devices[0].identifier().starts_with("controller#"));

        ShutdownController::new(Arc::clone(&buffer), stop)
            .shutdown(producer, sink)
            .await;
    }
}

#[cfg(test)]
mod network_tests {
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{wire, Frame, Matrix34, StreamerConfig};
    use dispatcher::{DispatcherError, SharedFrameBuffer, SinkExit, StopSignal};
    use ingestion::{wait_for_stop_line, ShutdownController, StopReason};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
    use tokio::net::TcpStream;
    use tokio::time::timeout;

    use crate::support::*;

    async fn read_line(client: &mut BufReader<TcpStream>) -> String {
        let mut line = String::new();
        timeout(WAKE_TIMEOUT, client.read_line(&mut line))
            .await
            .expect("no line delivered")
            .unwrap();
        line
    }

    async fn connect(addr: std::net::SocketAddr) -> BufReader<TcpStream> {
        BufReader::new(TcpStream::connect(addr).await.unwrap())
    }

    fn frame(timestamp: u64) -> Frame {
        Frame::new(timestamp, Matrix34::IDENTITY)
    }

    /// Two clients, one publish: both get the same single line.
    #[tokio::test]
    async fn test_two_clients_receive_identical_line() {
        let buffer = SharedFrameBuffer::new();
        let (sink, addr) = loopback_network(&buffer).await;

        let mut a = connect(addr).await;
        let mut b = connect(addr).await;
        settle().await;

        let f1 = frame(1_700_000_000_000_000_001);
        let encoded = wire::encode_frame(&f1, false);
        buffer.publish(encoded.clone());

        let line_a = read_line(&mut a).await;
        let line_b = read_line(&mut b).await;
        assert_eq!(line_a.as_bytes(), &encoded[..]);
        assert_eq!(line_a, line_b);
        assert!(line_a.ends_with('\n'));
        assert_eq!(line_a.matches('\n').count(), 1);
        assert_eq!(decode(&line_a).timestamp, f1.timestamp);

        sink.request_stop();
        buffer.clear_and_wake();
        sink.join().await;
    }

    /// A client that disconnects does not disturb the listener or other clients.
    #[tokio::test]
    async fn test_disconnected_client_is_isolated() {
        let buffer = SharedFrameBuffer::new();
        let (sink, addr) = loopback_network(&buffer).await;

        let dropped = connect(addr).await;
        let mut kept = connect(addr).await;
        settle().await;
        drop(dropped);

        // Enough publishes for the dead connection's writes to start failing
        for n in 1..=20u64 {
            buffer.publish(wire::encode_frame(&frame(n), false));
            assert_eq!(decode(&read_line(&mut kept).await).timestamp, n);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(sink.metrics().failure_count() >= 1);

        // Listener still accepts
        let mut late = connect(addr).await;
        settle().await;
        buffer.publish(wire::encode_frame(&frame(21), false));
        assert_eq!(decode(&read_line(&mut late).await).timestamp, 21);
        assert_eq!(decode(&read_line(&mut kept).await).timestamp, 21);

        sink.request_stop();
        buffer.clear_and_wake();
        let report = sink.join().await;
        assert_eq!(report.metrics.accepted_count, 3);
        assert_eq!(report.metrics.active_connections, 0);
    }

    /// Stop line with a client connected: the client sees EOF and the
    /// listener is gone.
    #[tokio::test]
    async fn test_stop_line_closes_clients_and_listener() {
        let buffer = SharedFrameBuffer::new();
        let (sink, addr) = loopback_network(&buffer).await;
        let mut client = connect(addr).await;
        settle().await;

        let stop = StopSignal::new();
        let producer = synthetic_producer(&buffer, Duration::from_millis(10), false, &stop);
        read_line(&mut client).await;

        let reason = wait_for_stop_line(Cursor::new("\n")).unwrap();
        assert_eq!(reason, StopReason::EmptyLine);
        stop.cancel();

        let report = timeout(
            WAKE_TIMEOUT,
            ShutdownController::new(Arc::clone(&buffer), stop).shutdown(producer, sink),
        )
        .await
        .expect("shutdown hung");
        assert_eq!(report.sink.exit, Some(SinkExit::Stopped));
        assert!(report.producer.unwrap().frames_published >= 1);

        let mut rest = Vec::new();
        timeout(WAKE_TIMEOUT, client.read_to_end(&mut rest))
            .await
            .expect("client not closed")
            .unwrap();
        // Whatever was in flight arrives as whole lines
        assert!(rest.is_empty() || rest.ends_with(b"\n"));

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = StreamerConfig {
            bind_host: "127.0.0.1".to_string(),
            port: taken.local_addr().unwrap().port(),
            ..Default::default()
        };

        let result = dispatcher::create_sink(&config).await;
        assert!(matches!(result, Err(DispatcherError::ListenerBind { .. })));
    }
}

#[cfg(test)]
mod replay_tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{wire, Frame, FrameSource, Matrix34, SourceConfig};
    use dispatcher::{ConsoleSink, SharedFrameBuffer, SinkHandle, StopSignal};
    use ingestion::{Producer, ProducerConfig, ShutdownController};
    use tokio::io::{AsyncBufReadExt, BufReader};

    use crate::support::decode;

    /// A recorded stream played back through the producer and console sink
    #[tokio::test]
    async fn test_recorded_stream_replays_through_pipeline() {
        let mut recording = tempfile::NamedTempFile::new().unwrap();
        for t in 1..=3u64 {
            recording
                .write_all(&wire::encode_frame(&Frame::new(t, Matrix34::IDENTITY), true))
                .unwrap();
        }
        recording.flush().unwrap();

        let source = frame_source::open_source(&SourceConfig::Replay {
            path: recording.path().to_path_buf(),
            loop_playback: false,
        })
        .unwrap();
        assert!(source.name().starts_with("replay:"));

        let buffer = SharedFrameBuffer::new();
        let (out, inp) = tokio::io::duplex(1 << 16);
        let sink = SinkHandle::spawn(ConsoleSink::new("console", out), Arc::clone(&buffer));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let stop = StopSignal::new();
        let producer = tokio::spawn(
            Producer::new(
                source,
                Arc::clone(&buffer),
                ProducerConfig {
                    tick_interval: Duration::from_millis(20),
                    report_auxiliary: true,
                },
            )
            .run(stop.clone()),
        );

        let mut lines = BufReader::new(inp).lines();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(decode(&lines.next_line().await.unwrap().unwrap()).timestamp);
        }
        // Without looping the last frame repeats
        assert_eq!(seen, vec![1, 2, 3, 3]);

        ShutdownController::new(Arc::clone(&buffer), stop)
            .shutdown(producer, sink)
            .await;
    }
}
