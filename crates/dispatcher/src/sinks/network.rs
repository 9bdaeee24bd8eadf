//! NetworkSink - TCP broadcast to every connected client
//!
//! One accept loop; one writer task per accepted connection. A client that
//! goes away only ends its own writer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{deliver, FrameSink, SinkContext, SinkExit};
use crate::buffer::FrameReader;
use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;
use crate::pool::ConnectionPool;

/// How long shutdown waits for connection writers before aborting them
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Pause after a failed accept (e.g. out of file descriptors)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Configuration for NetworkSink
#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    /// Listen address
    pub bind_host: String,
    /// Listen port (0 picks an ephemeral port)
    pub port: u16,
    /// Connection cap (`None` = unbounded)
    pub max_connections: Option<usize>,
    /// Shutdown grace period for connection writers
    pub drain_grace: Duration,
}

impl NetworkSinkConfig {
    /// Config with defaults for everything but the address
    pub fn new(bind_host: impl Into<String>, port: u16) -> Self {
        Self {
            bind_host: bind_host.into(),
            port,
            max_connections: None,
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }
}

/// Sink that streams frame lines to every connected TCP client
pub struct NetworkSink {
    name: String,
    config: NetworkSinkConfig,
    listener: TcpListener,
}

impl NetworkSink {
    /// Bind the listening endpoint
    ///
    /// # Errors
    /// `DispatcherError::ListenerBind` if the address cannot be bound.
    #[instrument(
        name = "network_sink_bind",
        skip(name, config),
        fields(host = %config.bind_host, port = config.port)
    )]
    pub async fn bind(
        name: impl Into<String>,
        config: NetworkSinkConfig,
    ) -> Result<Self, DispatcherError> {
        let name = name.into();
        let listener = TcpListener::bind((config.bind_host.as_str(), config.port))
            .await
            .map_err(|e| {
                DispatcherError::listener_bind(format!("{}:{}", config.bind_host, config.port), e)
            })?;

        info!(
            sink = %name,
            addr = %listener.local_addr()?,
            max_connections = ?config.max_connections,
            "Listening for clients"
        );

        Ok(Self {
            name,
            config,
            listener,
        })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl FrameSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "network_sink_run", skip(self, ctx), fields(sink = %self.name))]
    async fn run(self, ctx: SinkContext) -> SinkExit {
        let Self {
            name,
            config,
            listener,
        } = self;
        let mut pool = ConnectionPool::new(config.max_connections);

        loop {
            let accepted = tokio::select! {
                _ = ctx.stop.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => admit(&name, &mut pool, stream, peer, &ctx),
                Err(_) if ctx.stop.is_cancelled() => break,
                Err(e) => {
                    warn!(sink = %name, error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }

        drop(listener);
        debug!(sink = %name, connections = pool.len(), "Listener closed");

        pool.drain(config.drain_grace).await;
        info!(sink = %name, "Network delivery finished");

        SinkExit::Stopped
    }
}

/// Start a writer for a newly accepted connection, or refuse it when full
fn admit(
    name: &str,
    pool: &mut ConnectionPool,
    stream: TcpStream,
    peer: SocketAddr,
    ctx: &SinkContext,
) {
    if !pool.has_capacity() {
        ctx.metrics.inc_rejected_count();
        observability::record_connection_rejected();
        warn!(sink = %name, %peer, active = pool.len(), "Connection limit reached, rejecting client");
        return;
    }

    if let Err(e) = stream.set_nodelay(true) {
        debug!(sink = %name, %peer, error = %e, "Failed to disable Nagle");
    }

    ctx.metrics.inc_accepted_count();
    let active = ActiveConnection::open(Arc::clone(&ctx.metrics));
    info!(
        sink = %name,
        %peer,
        active = ctx.metrics.active_connections(),
        "Client connected"
    );

    pool.spawn(serve_client(
        stream,
        peer,
        ctx.buffer.reader(),
        ctx.stop.clone(),
        active,
        name.to_string(),
    ));
}

/// Counts one live connection until dropped, including when its writer is aborted
struct ActiveConnection {
    metrics: Arc<SinkMetrics>,
}

impl ActiveConnection {
    fn open(metrics: Arc<SinkMetrics>) -> Self {
        let active = metrics.inc_active_connections();
        observability::record_connection_accepted(active);
        Self { metrics }
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        let active = self.metrics.dec_active_connections();
        observability::record_connection_closed(active);
    }
}

/// Per-connection writer task
#[instrument(
    name = "network_client_writer",
    skip(stream, reader, stop, active, sink_name),
    fields(sink = %sink_name)
)]
async fn serve_client(
    mut stream: TcpStream,
    peer: SocketAddr,
    reader: FrameReader,
    stop: CancellationToken,
    active: ActiveConnection,
    sink_name: String,
) {
    match deliver(&mut stream, reader, &stop, &active.metrics, &sink_name).await {
        SinkExit::OutputClosed | SinkExit::Unavailable => {
            info!(sink = %sink_name, %peer, "Client disconnected")
        }
        SinkExit::Stopped => match stream.shutdown().await {
            Ok(()) => debug!(sink = %sink_name, %peer, "Client closed on shutdown"),
            Err(e) => {
                debug!(sink = %sink_name, %peer, error = %e, "Failed to shut down client stream")
            }
        },
    }
}
