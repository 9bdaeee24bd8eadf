//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Listening endpoint could not be bound
    #[error("failed to bind listener on {addr}: {source}")]
    ListenerBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a listener bind error
    pub fn listener_bind(addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::ListenerBind {
            addr: addr.into(),
            source,
        }
    }
}
