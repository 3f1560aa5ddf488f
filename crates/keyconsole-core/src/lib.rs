//! Core types and utilities for the key console
//!
//! Holds the data model shared with the backend, layered configuration,
//! the core error type and the logging bootstrap used by the binaries.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, ConsoleConfig, LoggingConfig, SessionConfig, TokenStoreKind};
pub use error::{Error, Result};
pub use types::{
    AccessToken, ApiKey, CreateKeysRequest, Item, ItemRef, KeyId, ListKeysParams, MachineInfo,
    PaginatedResult, PaginationInfo, RegisterRequest, User,
};

/// Guard that flushes file logging on drop; keep it alive for the program lifetime
pub type LogGuard = tracing_appender::non_blocking::WorkerGuard;

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level. When a log file is
/// configured, output goes there through a non-blocking writer and the
/// returned guard must be held until exit.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed or the log
/// directory cannot be created.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<LogGuard>> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let json = config.format.eq_ignore_ascii_case("json");

    let (writer, guard) = match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            std::fs::create_dir_all(dir).map_err(Error::LogDir)?;
            let file_name = path
                .file_name()
                .ok_or(Error::setting("logging.file", "must name a file"))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (fmt::writer::BoxMakeWriter::new(writer), Some(guard))
        }
        None => (fmt::writer::BoxMakeWriter::new(std::io::stderr), None),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(writer))
            .try_init()
    };

    result.map_err(|e| Error::Subscriber(e.to_string()))?;
    Ok(guard)
}
