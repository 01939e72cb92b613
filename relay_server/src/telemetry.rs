//! Logging setup.
//!
//! The filter comes from `RUST_LOG`; without it the relay logs its own
//! events at `info`.

use crate::config::LogFormat;
use crate::error::RelayError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "relay_server=info";

/// Install the global subscriber.
pub fn init(format: LogFormat) -> Result<(), RelayError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init(),
    };
    result.map_err(|e| RelayError::Telemetry(e.to_string()))
}
