//! Logging initialization.
//!
//! Installs a `tracing_subscriber` registry with an `EnvFilter` and either a
//! human-readable or a JSON `fmt` layer on stderr. Executed statements are
//! emitted on the [`QUERY_TARGET`] target and can be routed to their own JSON
//! layer.

use crate::config::LoggingConfig;
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Target carrying one event per executed SQL statement.
pub const QUERY_TARGET: &str = "queries";

/// Builds the filter: `RUST_LOG` wins over the configured level.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(level)?),
    }
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(&config.level)?;

    let stderr_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };

    let queries_layer = config.log_queries.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
                metadata.target() == QUERY_TARGET
            }))
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(queries_layer)
        .try_init()
        .ok();

    Ok(())
}
