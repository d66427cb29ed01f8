//! Booking engine HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Start PostgreSQL
//! docker run -d -p 5432:5432 -e POSTGRES_PASSWORD=postgres -e POSTGRES_DB=bookings postgres:16
//!
//! # Run server
//! cargo run --bin booking-server
//! ```

use booking_server::config::DEFAULT_LOG_FILTER;
use booking_server::{BookingApp, Config};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.server.log_level)
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        database = %config.database.redacted_url(),
        address = %config.bind_addr(),
        metrics = %config.metrics_addr(),
        "Configuration loaded"
    );

    let app = BookingApp::build(config).await?;
    tracing::info!("Booking server initialized");

    app.run().await
}
