//! Application wiring and lifecycle.
//!
//! [`BookingApp::build`] connects to `PostgreSQL`, applies migrations, wires
//! the service to its adapters and binds both listeners.
//! [`BookingApp::run`] serves until SIGINT or SIGTERM, then drains.

use crate::config::Config;
use crate::metrics::{install_recorder, metrics_router};
use crate::notifications::TracingNotifier;
use axum::Router;
use booking_core::{BookingService, SystemClock};
use booking_postgres::{PostgresBookingStore, PostgresPropertyCatalog};
use booking_web::booking_router;
use sqlx::postgres::PgPoolOptions;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// The booking service as deployed.
pub type ProductionService =
    BookingService<PostgresBookingStore, PostgresPropertyCatalog, TracingNotifier>;

/// A fully wired, bound server ready to run.
pub struct BookingApp {
    config: Config,
    store: PostgresBookingStore,
    app: Router,
    listener: TcpListener,
    metrics: Router,
    metrics_listener: TcpListener,
}

impl BookingApp {
    /// Build the application from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the metrics recorder cannot be installed, the
    /// database is unreachable, migrations fail, or a port cannot be bound.
    pub async fn build(config: Config) -> Result<Self, Box<dyn Error>> {
        let prometheus = install_recorder()?;

        info!(database = %config.database.redacted_url(), "Connecting to PostgreSQL");
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
            .idle_timeout(Some(Duration::from_secs(config.database.idle_timeout)))
            .connect(&config.database.url)
            .await?;

        let store = PostgresBookingStore::from_pool(pool.clone());
        if config.database.run_migrations {
            store.migrate().await?;
            info!("Migrations applied");
        }

        let service: ProductionService = BookingService::new(
            store.clone(),
            PostgresPropertyCatalog::from_pool(pool),
            TracingNotifier::new(),
            Arc::new(SystemClock),
        );

        let listener = TcpListener::bind(config.bind_addr()).await?;
        let metrics_listener = TcpListener::bind(config.metrics_addr()).await?;

        Ok(Self {
            app: booking_router(Arc::new(service)),
            metrics: metrics_router(prometheus),
            config,
            store,
            listener,
            metrics_listener,
        })
    }

    /// Serve until a shutdown signal, then stop the metrics listener and
    /// close the pool within the configured grace period.
    ///
    /// # Errors
    ///
    /// Returns error if the API server fails.
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        let Self {
            config,
            store,
            app,
            listener,
            metrics,
            metrics_listener,
        } = self;
        let grace = config.shutdown_timeout();
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        info!(address = %listener.local_addr()?, "API listening");
        info!(address = %metrics_listener.local_addr()?, "Metrics listening at /metrics");

        let metrics_server = tokio::spawn(async move {
            axum::serve(metrics_listener, metrics)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
        });

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server stopped, initiating graceful shutdown...");
        let _ = shutdown_tx.send(());

        match tokio::time::timeout(grace, metrics_server).await {
            Ok(Ok(Ok(()))) => info!("Metrics server stopped"),
            Ok(Ok(Err(e))) => warn!(error = %e, "Metrics server failed"),
            Ok(Err(e)) => warn!(error = %e, "Metrics server task failed"),
            Err(_) => warn!("Metrics server shutdown timed out"),
        }

        if tokio::time::timeout(grace, store.close()).await.is_err() {
            warn!("Database pool close timed out");
        }

        info!("Graceful shutdown complete");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }
}
