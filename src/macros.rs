//! Logging macros
//!
//! The macros log through the process-wide [`Logger`](crate::Logger), record
//! the calling `file!()` and `line!()`, and skip formatting entirely when the
//! level is filtered out.
//!
//! # Examples
//!
//! ```
//! use rust_sink_logger::{info, warning, error};
//!
//! // Basic logging
//! info!("Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!("Server listening on port {}", port);
//!
//! // Routed to the "db" category config, if one is registered
//! warning!(target: "db", "pool at {}%", 90);
//!
//! // Structured key/value context
//! error!("request failed"; "status" => 503, "path" => "/health");
//! ```

/// Log at an explicit level
///
/// # Examples
///
/// ```
/// use rust_sink_logger::{log, Level};
///
/// log!(Level::Info, "Simple message");
/// log!(Level::Error, "Error code: {}", 500);
/// log!(target: "net", Level::Warning, "retrying");
/// log!(Level::Info, "login"; "user_id" => 42, "admin" => false);
/// ```
#[macro_export]
macro_rules! log {
    (target: $target:expr, $level:expr, $msg:literal; $($key:literal => $value:expr),+ $(,)?) => {
        $crate::__log_record!(
            $crate::Logger::category_config($target),
            $level,
            $msg,
            $crate::LogContext::new()$(.with_field($key, $value))+
        )
    };
    (target: $target:expr, $level:expr, $($arg:tt)+) => {
        $crate::__log_record!(
            $crate::Logger::category_config($target),
            $level,
            format!($($arg)+),
            $crate::LogContext::new()
        )
    };
    ($level:expr, $msg:literal; $($key:literal => $value:expr),+ $(,)?) => {
        $crate::__log_record!(
            $crate::Logger::config(),
            $level,
            $msg,
            $crate::LogContext::new()$(.with_field($key, $value))+
        )
    };
    ($level:expr, $($arg:tt)+) => {
        $crate::__log_record!(
            $crate::Logger::config(),
            $level,
            format!($($arg)+),
            $crate::LogContext::new()
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_record {
    ($config:expr, $level:expr, $message:expr, $context:expr) => {{
        let config = $config;
        let level: $crate::Level = $level;
        if config.is_enabled(level) {
            config.dispatch(
                &$crate::LogRecord::new(level, $message)
                    .with_location(file!(), line!())
                    .with_context($context),
            );
        }
    }};
}

/// Log a trace-level message.
///
/// ```
/// use rust_sink_logger::trace;
/// trace!("Entering function: calculate()");
/// trace!("Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::log!(target: $target, $crate::Level::Trace, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::log!(target: $target, $crate::Level::Debug, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// ```
/// use rust_sink_logger::info;
/// info!("Application started");
/// info!("Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::log!(target: $target, $crate::Level::Info, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::log!(target: $target, $crate::Level::Warning, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// use rust_sink_logger::error;
/// let error_code = 404;
/// error!("Request failed with code {}", error_code);
/// ```
#[macro_export]
macro_rules! error {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::log!(target: $target, $crate::Level::Error, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::log!(target: $target, $crate::Level::Fatal, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Fatal, $($arg)+)
    };
}
