//! File logging example
//!
//! Demonstrates rotating file sinks through the facade, explicit configs
//! and declarative settings.
//!
//! Run with: cargo run --example file_logging

use rust_sink_logger::prelude::*;
use std::fs;
use std::path::Path;
use std::time::Duration;

fn list_logs(dir: &Path) -> std::io::Result<()> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    for name in names {
        let size = fs::metadata(dir.join(&name))?.len();
        println!("   {} ({} bytes)", name, size);
    }
    Ok(())
}

fn main() -> Result<()> {
    println!("=== Rust Sink Logger - File Logging Example ===\n");

    let dir = std::env::temp_dir().join("rust_sink_logger_demo");
    fs::create_dir_all(&dir)?;

    println!("1. Size-based rotation through the facade:");
    Logger::set_file_logging(
        dir.join("app.log"),
        RotationPolicy::new().with_max_size(1024).with_max_backups(3),
    );
    for i in 0..100 {
        Logger::info(format!("Rotating message {}", i));
    }
    Logger::clear_file_logging();
    list_logs(&dir)?;

    println!("\n2. Hybrid rotation behind an async queue:");
    let config = LoggerConfig::builder()
        .level(Level::Debug)
        .async_file_sink(
            dir.join("worker.log"),
            RotationPolicy::new()
                .with_strategy(RotationStrategy::hybrid(4096, Duration::from_secs(3600)))
                .with_max_backups(2),
            256,
            DropPolicy::Block(Duration::from_millis(50)),
        )
        .formatter(JsonFormatter::default())
        .build()?;
    for i in 0..200 {
        config.submit(&LogRecord::new(Level::Debug, format!("Job {} finished", i)));
    }
    config.shutdown_async();

    println!("\n3. Declarative settings:");
    let settings = LoggerSettings::from_json(&format!(
        r#"{{
            "level": "info",
            "prefix": "[svc]",
            "sinks": [
                {{ "type": "console" }},
                {{ "type": "file", "path": {}, "max_size": 2048, "retention": 1 }}
            ]
        }}"#,
        serde_json::Value::from(dir.join("settings.log").to_string_lossy().into_owned())
    ))?;
    Logger::configure(settings.build()?);
    Logger::info("Configured from settings");
    Logger::reset();

    println!("\nFiles in {}:", dir.display());
    list_logs(&dir)?;

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
