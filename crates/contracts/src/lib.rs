//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Frames carry wall-clock timestamps (nanoseconds since the Unix epoch, u64)
//! - Delivery order is publish order; sequence numbers live in the dispatcher

mod config;
mod error;
mod frame;
mod frame_source;
pub mod wire;

pub use config::*;
pub use error::*;
pub use frame::*;
pub use frame_source::FrameSource;
