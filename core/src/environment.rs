//! Injected dependencies.
//!
//! The booking service never reaches for process-wide state: the store, the
//! property catalog, the notifier and the clock are all passed in at
//! construction. Production adapters live in `booking-postgres` and
//! `booking-server`; in-memory doubles live in `booking-testing`.

use crate::error::{NotifyError, StoreError};
use crate::query::{BookingFilter, PageRequest};
use crate::types::{
    Booking, BookingId, BookingNumber, BookingStatus, Property, PropertyId, StayDates,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```ignore
/// // Production - uses system clock
/// let clock = SystemClock;
///
/// // Test - fixed time for deterministic tests
/// let clock = booking_testing::test_clock();
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Persistence for booking records.
///
/// # Conditional writes
///
/// [`insert`](Self::insert) and [`update`](Self::update) must be atomic with
/// respect to the no-double-booking rule: if the written booking is
/// `confirmed` and overlaps another confirmed booking of the same property,
/// the write fails with [`StoreError::Overlap`] and nothing is persisted.
/// This closes the window between an availability read and the write.
///
/// [`update`](Self::update) is also conditional on the status the caller
/// read, so a read-modify-write never overwrites a concurrent status change.
///
/// # Implementations
///
/// - `PostgresBookingStore`: exclusion constraint on confirmed date ranges,
///   `WHERE status = $expected` on updates
/// - `InMemoryBookingStore`: check and write under one lock
pub trait BookingStore: Send + Sync {
    /// Persists a new booking.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Overlap`] if the booking is confirmed and collides
    /// - [`StoreError::DuplicateBookingNumber`] if the number is taken
    /// - [`StoreError::Database`] on connectivity failure
    fn insert(&self, booking: &Booking) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replaces a stored booking, matched by id, provided its stored status
    /// is still `expected`. Nothing is written otherwise.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no booking has this id
    /// - [`StoreError::StatusChanged`] if the stored status is no longer
    ///   `expected`
    /// - [`StoreError::Overlap`] if the new state is confirmed and collides
    /// - [`StoreError::Database`] on connectivity failure
    fn update(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a booking. Returns false if it did not exist.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on connectivity failure.
    fn delete(&self, id: BookingId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Loads a booking by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on connectivity failure.
    fn get(&self, id: BookingId) -> impl Future<Output = Result<Option<Booking>, StoreError>> + Send;

    /// Exact-match lookup used by the booking number generator.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on connectivity failure.
    fn booking_number_exists(
        &self,
        number: &BookingNumber,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Confirmed bookings of `property_id` whose range overlaps `stay`,
    /// leaving out `exclude` if given.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on connectivity failure.
    fn find_confirmed_overlaps(
        &self,
        property_id: PropertyId,
        stay: StayDates,
        exclude: Option<BookingId>,
    ) -> impl Future<Output = Result<Vec<Booking>, StoreError>> + Send;

    /// One page of bookings matching `filter`, newest first, and the total
    /// number of matches.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on connectivity failure.
    fn list(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<(Vec<Booking>, u64), StoreError>> + Send;
}

/// Read access to the external property catalog.
pub trait PropertyCatalog: Send + Sync {
    /// Looks up a property. `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] if the catalog cannot be reached.
    fn get_by_id(
        &self,
        id: PropertyId,
    ) -> impl Future<Output = Result<Option<Property>, StoreError>> + Send;
}

/// What happened to a booking, for the notification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// A booking request was created.
    Received,
    /// The booking was confirmed.
    Confirmed,
    /// Booking details changed.
    Updated,
    /// The booking was cancelled.
    Cancelled,
}

impl NotificationKind {
    /// Lowercase event name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Confirmed => "confirmed",
            Self::Updated => "updated",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound booking notifications (guest email and the like).
///
/// Called after a mutation has been persisted. Failures are logged by the
/// service and never undo the mutation.
pub trait BookingNotifier: Send + Sync {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// [`NotifyError`] if delivery failed.
    fn notify(
        &self,
        kind: NotificationKind,
        booking: &Booking,
        property: &Property,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}
