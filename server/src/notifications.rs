//! Notification delivery for the server binary.

use booking_core::{Booking, BookingNotifier, NotificationKind, NotifyError, Property};
use std::future::Future;

/// Writes each notification to the log instead of sending it.
///
/// Stands in for guest email until a delivery channel is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    /// Create a notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BookingNotifier for TracingNotifier {
    fn notify(
        &self,
        kind: NotificationKind,
        booking: &Booking,
        property: &Property,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send {
        tracing::info!(
            kind = %kind,
            booking_id = %booking.id,
            booking_number = %booking.booking_number,
            recipient = %booking.customer.email,
            property = %property.title,
            check_in = %booking.stay.check_in(),
            check_out = %booking.stay.check_out(),
            total = %booking.total_amount,
            "Booking notification"
        );
        std::future::ready(Ok(()))
    }
}
