//! Layered error definitions
//!
//! Categorized by source: config / source / wire

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Frame Source Errors =====
    /// Frame source could not be initialized (fatal at startup)
    #[error("frame source '{source_name}' failed to initialize: {message}")]
    SourceInit {
        source_name: String,
        message: String,
    },

    // ===== Wire Errors =====
    /// Malformed wire line
    #[error("wire decode error at column {offset}: {message}")]
    WireDecode { offset: usize, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create frame source init error
    pub fn source_init(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceInit {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create wire decode error
    pub fn wire_decode(offset: usize, message: impl Into<String>) -> Self {
        Self::WireDecode {
            offset,
            message: message.into(),
        }
    }
}
