//! Booking HTTP router.

use crate::handlers::{bookings, health};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};
use booking_core::{BookingNotifier, BookingService, BookingStore, PropertyCatalog};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the full API router.
///
/// # Routes
///
/// - `GET /health` - Liveness
/// - `GET /api/bookings` - List with filters and pagination
/// - `POST /api/bookings` - Create
/// - `GET /api/bookings/:id` - Fetch
/// - `PUT /api/bookings/:id` - Edit
/// - `DELETE /api/bookings/:id` - Delete
/// - `PATCH /api/bookings/:id/status` - Status transition
/// - `PATCH /api/bookings/:id/payment-status` - Payment status
/// - `POST /api/availability` - Availability check
///
/// Requests are traced and tagged with a correlation id.
pub fn booking_router<S, C, N>(service: Arc<BookingService<S, C, N>>) -> Router
where
    S: BookingStore + 'static,
    C: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    let api = Router::new()
        .route(
            "/bookings",
            get(bookings::list_bookings::<S, C, N>).post(bookings::create_booking::<S, C, N>),
        )
        .route(
            "/bookings/:id",
            get(bookings::get_booking::<S, C, N>)
                .put(bookings::update_booking::<S, C, N>)
                .delete(bookings::delete_booking::<S, C, N>),
        )
        .route(
            "/bookings/:id/status",
            patch(bookings::update_status::<S, C, N>),
        )
        .route(
            "/bookings/:id/payment-status",
            patch(bookings::update_payment_status::<S, C, N>),
        )
        .route(
            "/availability",
            post(bookings::check_availability::<S, C, N>),
        )
        .with_state(AppState::new(service));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}
