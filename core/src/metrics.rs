//! Metric names recorded by the booking service.
//!
//! Recording goes through the `metrics` facade; the binary installs an
//! exporter and calls [`describe`] once at startup.

use ::metrics::{Unit, describe_counter};

/// Bookings successfully created.
pub const BOOKINGS_CREATED: &str = "bookings_created_total";
/// Requests refused because a confirmed booking held the dates.
pub const BOOKING_CONFLICTS: &str = "booking_conflicts_total";
/// Status transitions applied, labelled by target status.
pub const STATUS_TRANSITIONS: &str = "booking_status_transitions_total";
/// Notifications that could not be delivered, labelled by kind.
pub const NOTIFICATIONS_FAILED: &str = "booking_notifications_failed_total";

/// Registers descriptions for every booking metric.
pub fn describe() {
    describe_counter!(BOOKINGS_CREATED, Unit::Count, "Total number of bookings created");
    describe_counter!(
        BOOKING_CONFLICTS,
        Unit::Count,
        "Total number of booking requests refused because the dates were taken"
    );
    describe_counter!(
        STATUS_TRANSITIONS,
        Unit::Count,
        "Total number of booking status transitions, by target status"
    );
    describe_counter!(
        NOTIFICATIONS_FAILED,
        Unit::Count,
        "Total number of booking notifications that failed to send"
    );
}
