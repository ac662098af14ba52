use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::error::{DeskError, Result};

/// Initialize structured logging system.
///
/// `format` selects the console layer ("text" or "json"). When `log_file` is
/// given, a daily-rolling JSON file layer is added and its guard returned; the
/// caller must hold it for as long as logs should be flushed.
pub fn init_logging(log_level: Option<&str>, format: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))
        .map_err(|e| DeskError::InvalidConfig(format!("Failed to create log filter: {e}")))?;

    let console_layer = if format == "json" {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .boxed()
    };

    let registry = Registry::default().with(env_filter).with(console_layer);

    let guard = if let Some(log_path) = log_file {
        let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = log_path
            .file_name()
            .map_or_else(|| "schoolbus-desk.log".to_string(), |n| n.to_string_lossy().into_owned());
        let (non_blocking_appender, guard) = non_blocking(rolling::daily(directory, file_name));

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(true)
            .json();

        registry
            .with(file_layer)
            .try_init()
            .map_err(|e| DeskError::Other(format!("Failed to install subscriber: {e}")))?;
        Some(guard)
    } else {
        registry
            .try_init()
            .map_err(|e| DeskError::Other(format!("Failed to install subscriber: {e}")))?;
        None
    };

    info!("Logging system initialized");
    Ok(guard)
}

/// Performance timing utilities
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    /// Log the elapsed time and return it
    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = self.operation,
            duration_ms = duration.as_secs_f64() * 1000.0,
            "Operation completed"
        );
        duration
    }
}
