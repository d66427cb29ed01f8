//! Prometheus exporter.
//!
//! Installs the global `metrics` recorder and serves its rendering on a
//! separate listener, so scraping never shares a port with the API.
//!
//! # Exported Metrics
//!
//! - `bookings_created_total` - Bookings created
//! - `booking_conflicts_total` - Requests refused for overlapping a confirmed booking
//! - `booking_status_transitions_total{to}` - Status changes by target status
//! - `booking_notifications_failed_total{kind}` - Notifications that could not be sent
//! - `booking_store_errors_total{operation}` - Unexpected database failures

use axum::{Router, routing::get};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and register metric descriptions.
///
/// Must be called once, before any metric is recorded.
///
/// # Errors
///
/// Returns [`BuildError`] if a global recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    booking_core::metrics::describe();
    booking_postgres::describe_metrics();
    tracing::info!("Business metrics registered");
    Ok(handle)
}

/// Router exposing `GET /metrics`.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}
