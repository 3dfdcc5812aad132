//! `log` crate records routed through the facade

#![cfg(feature = "log-bridge")]

use rust_sink_logger::prelude::*;
use rust_sink_logger::sinks::SharedBuffer;
use std::sync::Arc;

#[test]
fn test_log_macros_reach_configured_sinks() {
    Logger::reset();
    let out = SharedBuffer::new();
    let err = SharedBuffer::new();
    Logger::set_output_streams(out.clone(), err.clone());
    Logger::set_formatter(Some(Arc::new(TextFormatter::new(TimestampStyle::None))));

    let db_out = SharedBuffer::new();
    Logger::registry().set_config(
        "db",
        LoggerConfig::builder()
            .level(Level::Trace)
            .stream_sink(db_out.clone())
            .formatter(TextFormatter::new(TimestampStyle::None))
            .build()
            .expect("Failed to build config"),
    );

    rust_sink_logger::bridge::init().expect("Failed to install log bridge");
    assert!(rust_sink_logger::bridge::init().is_err());

    log::warn!("disk almost full");
    log::debug!("filtered at the default threshold");
    log::error!("write failed");
    log::trace!(target: "db", "statement prepared");

    assert_eq!(out.lines().len(), 1);
    assert!(out.lines()[0].starts_with("[WARNING] disk almost full (log_bridge.rs:"));
    assert!(err.lines()[0].starts_with("[ERROR] write failed"));
    assert!(db_out.lines()[0].starts_with("[TRACE] statement prepared"));

    log::logger().flush();
    Logger::reset();
}
