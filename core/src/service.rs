//! The booking service: one handle over the injected environment.
//!
//! Operations are split by component: availability checks in
//! [`availability`](crate::availability), mutations in
//! [`lifecycle`](crate::lifecycle), reads in [`query`](crate::query).

use crate::booking_number::BookingNumberGenerator;
use crate::environment::{BookingNotifier, BookingStore, Clock, NotificationKind, PropertyCatalog};
use crate::metrics;
use crate::types::{Booking, Property};
use std::sync::Arc;

/// Booking operations over an injected store, catalog, notifier and clock.
///
/// Each call is an independent async task; the service holds no locks and
/// relies on the store's conditional writes for the no-double-booking rule.
pub struct BookingService<S, C, N> {
    pub(crate) store: S,
    pub(crate) catalog: C,
    pub(crate) notifier: N,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) numbers: BookingNumberGenerator,
}

impl<S, C, N> BookingService<S, C, N>
where
    S: BookingStore,
    C: PropertyCatalog,
    N: BookingNotifier,
{
    /// Creates a service with the default booking number generator.
    #[must_use]
    pub fn new(store: S, catalog: C, notifier: N, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            catalog,
            notifier,
            clock,
            numbers: BookingNumberGenerator::default(),
        }
    }

    /// Sends a notification, logging failures instead of returning them.
    pub(crate) async fn notify(&self, kind: NotificationKind, booking: &Booking, property: &Property) {
        if let Err(error) = self.notifier.notify(kind, booking, property).await {
            ::metrics::counter!(metrics::NOTIFICATIONS_FAILED, "kind" => kind.as_str()).increment(1);
            tracing::warn!(
                booking_id = %booking.id,
                booking_number = %booking.booking_number,
                kind = %kind,
                error = %error,
                "Booking notification failed"
            );
        }
    }
}
