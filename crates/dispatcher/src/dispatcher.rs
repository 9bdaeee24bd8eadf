//! Sink selection - one delivery strategy per run, chosen from configuration

use tracing::{info, instrument, warn};

use contracts::{DeliveryMode, StreamerConfig};

use crate::error::DispatcherError;
use crate::sinks::{
    ConsoleSink, FrameSink, NetworkSink, NetworkSinkConfig, SinkContext, SinkExit,
    DEFAULT_DRAIN_GRACE,
};

/// The configured delivery strategy
pub enum Sink {
    /// Frame lines on standard output
    Console(ConsoleSink),
    /// Frame lines to every TCP client
    Network(NetworkSink),
    /// Stand-in for a sink whose endpoint could not be opened
    ///
    /// Its loop returns at once, so the pipeline shuts down as if the sink
    /// had completed.
    Unavailable {
        /// Name of the sink that failed to start
        name: String,
    },
}

impl Sink {
    /// Placeholder for a sink that failed to start
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self::Unavailable { name: name.into() }
    }
}

impl FrameSink for Sink {
    fn name(&self) -> &str {
        match self {
            Self::Console(sink) => sink.name(),
            Self::Network(sink) => sink.name(),
            Self::Unavailable { name } => name,
        }
    }

    async fn run(self, ctx: SinkContext) -> SinkExit {
        match self {
            Self::Console(sink) => sink.run(ctx).await,
            Self::Network(sink) => sink.run(ctx).await,
            Self::Unavailable { name } => {
                warn!(sink = %name, "Sink unavailable, nothing will be delivered");
                SinkExit::Unavailable
            }
        }
    }
}

/// Network sink settings derived from the streamer configuration
pub fn network_config(config: &StreamerConfig, port: u16) -> NetworkSinkConfig {
    NetworkSinkConfig {
        bind_host: config.bind_host.clone(),
        port,
        max_connections: config.max_connections,
        drain_grace: DEFAULT_DRAIN_GRACE,
    }
}

/// Create the sink selected by `config`
///
/// A network sink binds its listener here.
///
/// # Errors
/// `DispatcherError::ListenerBind` if the listener cannot be bound.
#[instrument(name = "dispatcher_create_sink", skip(config))]
pub async fn create_sink(config: &StreamerConfig) -> Result<Sink, DispatcherError> {
    let sink = match config.delivery_mode() {
        DeliveryMode::Console => Sink::Console(ConsoleSink::stdout()),
        DeliveryMode::Tcp { port } => {
            Sink::Network(NetworkSink::bind("network", network_config(config, port)).await?)
        }
    };

    info!(sink = sink.name(), "Sink created");
    Ok(sink)
}
