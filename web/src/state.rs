//! Application state for the booking handlers.

use booking_core::BookingService;
use std::sync::Arc;

/// State shared across all HTTP handlers.
///
/// Generic over the store, catalog and notifier so the same router serves
/// the Postgres-backed binary and the in-memory test setup.
pub struct AppState<S, C, N> {
    /// The booking service every handler calls into.
    pub service: Arc<BookingService<S, C, N>>,
}

impl<S, C, N> AppState<S, C, N> {
    /// Wraps a shared service.
    #[must_use]
    pub const fn new(service: Arc<BookingService<S, C, N>>) -> Self {
        Self { service }
    }
}

// Manual impl: the derive would require `S: Clone, C: Clone, N: Clone`.
impl<S, C, N> Clone for AppState<S, C, N> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}
