//! Logging initialization.
//!
//! `tracing-subscriber` with an env-filter; JSON output for production,
//! human-readable for development. The filter defaults to the configured
//! level but `RUST_LOG` always wins.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Initialize the global tracing subscriber.
///
/// Calling this twice is an error in tracing; callers own process startup
/// and do it once.
pub fn init_logging(service: &str, config: &ObservabilityConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("campus_core={}", config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logging {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()?;
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()?;
    }

    tracing::info!(service, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent_failure() {
        let config = ObservabilityConfig::default();
        // First init in the test process may succeed or fail depending on
        // test ordering; the second must fail cleanly rather than panic.
        let _ = init_logging("campus-test", &config);
        assert!(init_logging("campus-test", &config).is_err());
    }
}
