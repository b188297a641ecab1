//! Logging setup for the export binary
//!
//! The library only emits `tracing` events; installing the subscriber is done here, once, at
//! startup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Filter used when `RUST_LOG` is not set
pub fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,sqlx=warn,hyper=info,hyper_util=info"
    } else {
        "info,sqlx=warn"
    }
}

/// Initialize the fmt subscriber with an `EnvFilter`
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

    let fmt_layer = fmt::layer().with_filter(filter);
    let registry = tracing_subscriber::registry().with(fmt_layer);
    registry.init();

    tracing::debug!("Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(default_filter()).is_ok());
    }
}
