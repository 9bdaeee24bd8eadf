//! # Dispatcher
//!
//! 帧分发模块。
//!
//! 负责：
//! - 单槽最新值缓冲 (`SharedFrameBuffer`)，生产者覆盖写，消费者等待下一帧
//! - 控制台 / TCP 两种投递方式，运行时只选其一
//! - 每个连接独立写任务，慢或断开的客户端不影响其他客户端

pub mod buffer;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
mod pool;
pub mod sinks;

pub use buffer::{FrameReader, SharedFrameBuffer, Snapshot};
pub use dispatcher::{create_sink, network_config, Sink};
pub use error::DispatcherError;
pub use handle::{SinkHandle, SinkReport};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{
    ConsoleSink, FrameSink, NetworkSink, NetworkSinkConfig, SinkContext, SinkExit,
    DEFAULT_DRAIN_GRACE,
};
/// Process-wide stop flag shared by every loop
pub use tokio_util::sync::CancellationToken as StopSignal;
