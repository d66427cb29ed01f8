//! Booking engine server.
//!
//! Wires the PostgreSQL adapters, the HTTP router and the Prometheus
//! exporter into one process. The binary in `main.rs` only loads `.env`,
//! sets up tracing and hands a [`Config`] to [`BookingApp`].

pub mod app;
pub mod config;
pub mod metrics;
pub mod notifications;

pub use app::{BookingApp, ProductionService};
pub use config::Config;
pub use notifications::TracingNotifier;
