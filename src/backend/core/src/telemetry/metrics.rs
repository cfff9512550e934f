//! Prometheus metrics.
//!
//! Installs the `metrics` recorder backed by a Prometheus registry. The
//! returned handle renders the exposition format for the `/metrics`
//! endpoint. Counters emitted elsewhere in the crate:
//!
//! - `campus_errors_total{code, category}` - every constructed error
//! - `campus_auth_errors_total{error_type}` - rejected authentications

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder and return its render handle.
///
/// Returns `None` when a recorder is already installed (tests, embedded
/// use); metrics then flow to the existing recorder and the endpoint
/// renders empty.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder installed");
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Metrics recorder already installed; /metrics will be empty");
            None
        }
    }
}
