//! Basic logger usage example
//!
//! Demonstrates the static facade, levels, categories and the macros.
//!
//! Run with: cargo run --example basic_usage

use rust_sink_logger::prelude::*;
use rust_sink_logger::{info, warning};

fn main() -> Result<()> {
    println!("=== Rust Sink Logger - Basic Usage Example ===\n");

    // Log messages at different levels
    println!("1. Logging at different levels:");
    Logger::set_level(Level::Trace);
    Logger::trace("This is a trace message");
    Logger::debug("This is a debug message");
    Logger::info("This is an info message");
    Logger::warning("This is a warning message");
    Logger::error("This is an error message");
    Logger::fatal("This is a fatal message");

    println!("\n2. Logging with a higher threshold:");
    Logger::set_level(Level::Info);
    println!("   Level set to INFO - trace and debug won't show:");
    Logger::trace("Trace message (hidden)");
    Logger::debug("Debug message (hidden)");
    Logger::info("Info message (visible)");

    println!("\n3. Structured logging:");
    Logger::log_fmt(Level::Info, "User {} logged in from {}", &[&"alice", &"10.0.0.7"]);
    Logger::log_with_context(
        Level::Info,
        "Request processed",
        LogContext::new()
            .with_field("status", 200)
            .with_field("latency_ms", 12.5),
    );
    info!("Listening on port {}", 8080);
    warning!("Cache nearly full"; "used" => 970, "capacity" => 1000);

    println!("\n4. Per-category configuration:");
    Logger::registry().set_config(
        "db",
        LoggerConfig::builder()
            .level(Level::Debug)
            .console_sink(std::io::stdout(), std::io::stderr())
            .formatter(TextFormatter::default().with_prefix("[db]"))
            .build()?,
    );
    let db = Logger::get("db");
    db.debug("Connection pool warmed (visible for db)");
    Logger::get("http").debug("Hidden: http uses the default threshold");

    println!("\n5. JSON output:");
    Logger::set_formatter(Some(std::sync::Arc::new(JsonFormatter::default())));
    Logger::info("Now rendered as JSON");

    Logger::reset();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
