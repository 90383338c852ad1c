//! Structured logging with tracing

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the global tracing subscriber.
///
/// The filter honours `RUST_LOG` when set, otherwise falls back to the
/// configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.format {
        LogFormat::Pretty => builder.pretty().finish().try_init(),
        LogFormat::Json => builder.json().finish().try_init(),
        LogFormat::Compact => builder.compact().finish().try_init(),
    }
}
