//! Fixtures for dates, customers and bookings.
//!
//! These panic on malformed literals, which is what a test wants.

#![allow(clippy::expect_used)]

use crate::mocks::test_clock;
use booking_core::{
    Booking, BookingId, BookingNumber, BookingStatus, Clock, Customer, Money, NewBooking,
    PaymentStatus, PropertyId, StayDates,
};
use chrono::NaiveDate;

/// Parses an ISO `YYYY-MM-DD` date.
///
/// # Panics
///
/// Panics if `iso` is not a valid date.
#[must_use]
pub fn date(iso: &str) -> NaiveDate {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d").expect("fixture date should be YYYY-MM-DD")
}

/// A valid customer.
#[must_use]
pub fn customer() -> Customer {
    Customer {
        name: "Ana Ruiz".to_string(),
        email: "ana.ruiz@example.com".to_string(),
        phone: "+34 600 123 456".to_string(),
        address: Some("Calle Mayor 1, Madrid".to_string()),
    }
}

/// A valid create request for two guests.
///
/// # Panics
///
/// Panics if either date literal is malformed.
#[must_use]
pub fn new_booking(property_id: PropertyId, check_in: &str, check_out: &str) -> NewBooking {
    NewBooking {
        property_id,
        customer: customer(),
        check_in: date(check_in),
        check_out: date(check_out),
        guests: 2,
        special_requests: None,
        notes: None,
    }
}

/// A stored-shape booking with a unique number, stamped at [`test_clock`].
#[must_use]
pub fn booking(property_id: PropertyId, stay: StayDates, status: BookingStatus) -> Booking {
    let id = BookingId::new();
    let at = test_clock().now();
    let tag: String = id.as_uuid().simple().to_string().chars().take(9).collect();
    Booking {
        id,
        booking_number: BookingNumber::new(format!("BK{}", tag.to_uppercase())),
        property_id,
        customer: customer(),
        stay,
        guests: 2,
        total_amount: Money::ZERO,
        status,
        payment_status: PaymentStatus::Pending,
        special_requests: None,
        notes: None,
        created_at: at,
        updated_at: at,
    }
}
