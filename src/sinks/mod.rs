//! Sink implementations

pub mod async_sink;
pub mod rotating_file;
pub mod stream;

pub use async_sink::{AsyncSink, DEFAULT_SHUTDOWN_TIMEOUT};
pub use rotating_file::{RotatingFileSink, RotationPolicy, RotationStrategy, SinkState};
pub use stream::{ConsoleSink, SharedBuffer, StreamSink};

pub use crate::core::Sink;
