//! Logging initialization.
//!
//! Verbosity comes from `RUST_LOG` (default `info`). Logs always go to
//! stderr; an optional file mirror uses a non-blocking writer whose guard
//! must be held for the lifetime of the process.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::errors::{NodeupError, NodeupResult};

/// Initialize the global subscriber.
///
/// Returns the file writer guard when a log file was requested; dropping it
/// stops the background writer, so keep it alive until exit.
pub fn init(log_file: Option<&Path>) -> NodeupResult<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|e| {
                NodeupError::Config(format!(
                    "failed to create log file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let (writer, guard) = tracing_appender::non_blocking(file);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()
                .map_err(|e| NodeupError::Internal(format!("logging already initialized: {}", e)))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| NodeupError::Internal(format!("logging already initialized: {}", e)))?;
            Ok(None)
        }
    }
}
