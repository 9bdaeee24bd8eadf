//! # Ingestion
//!
//! Frame production and run control.
//!
//! Responsibilities:
//! - Sample the frame source at a fixed cadence and publish into the shared buffer
//! - Watch standard input for the stop line
//! - Run the cooperative shutdown sequence
//!
//! ## Usage Example
//!
//! ```ignore
//! let stop = StopSignal::new();
//! let producer = tokio::spawn(Producer::new(source, buffer.clone(), config).run(stop.clone()));
//! spawn_stdin_trigger(stop.clone())?;
//! stop.cancelled().await;
//! let report = ShutdownController::new(buffer, stop).shutdown(producer, sink).await;
//! ```

mod error;
mod producer;
mod shutdown;
mod trigger;

// Re-exports
pub use error::{IngestionError, Result};
pub use producer::{Producer, ProducerConfig, ProducerStats};
pub use shutdown::{ShutdownController, ShutdownReport};
pub use trigger::{spawn_stdin_trigger, wait_for_stop_line, StopReason};
