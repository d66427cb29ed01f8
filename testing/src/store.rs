//! In-memory booking store.

use booking_core::{
    Booking, BookingFilter, BookingId, BookingNumber, BookingStatus, BookingStore, PageRequest,
    PropertyId, StayDates, StoreError,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory [`BookingStore`].
///
/// The overlap check and the write happen under one lock acquisition, so
/// concurrent writers get the same guarantee as the exclusion constraint in
/// PostgreSQL: at most one of two overlapping confirmed bookings is stored.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    bookings: Arc<Mutex<HashMap<BookingId, Booking>>>,
    forced_collisions: Arc<AtomicU32>,
    forced_duplicates: Arc<AtomicU32>,
}

impl InMemoryBookingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a booking as-is, bypassing every check.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the lock is poisoned.
    pub fn seed(&self, booking: Booking) -> Result<(), StoreError> {
        self.bookings
            .lock()
            .map_err(|_| poisoned())?
            .insert(booking.id, booking);
        Ok(())
    }

    /// Makes the next `count` booking-number existence checks report a
    /// collision.
    pub fn force_number_collisions(&self, count: u32) {
        self.forced_collisions.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` inserts fail with
    /// [`StoreError::DuplicateBookingNumber`], as if another writer took the
    /// number between the existence check and the insert.
    pub fn force_insert_duplicates(&self, count: u32) {
        self.forced_duplicates.store(count, Ordering::SeqCst);
    }

    /// Every stored booking, in no particular order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Booking> {
        self.bookings
            .lock()
            .map(|bookings| bookings.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Confirmed bookings of one property.
    #[must_use]
    pub fn confirmed_for(&self, property_id: PropertyId) -> Vec<Booking> {
        self.snapshot()
            .into_iter()
            .filter(|booking| booking.property_id == property_id && booking.is_confirmed())
            .collect()
    }

    fn take_forced_collision(&self) -> bool {
        take_one(&self.forced_collisions)
    }

    fn take_forced_duplicate(&self) -> bool {
        take_one(&self.forced_duplicates)
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
            remaining.checked_sub(1)
        })
        .is_ok()
}

fn poisoned() -> StoreError {
    StoreError::Database("in-memory store lock poisoned".to_string())
}

/// Refuses `booking` if it is confirmed and another confirmed booking of
/// the same property overlaps it.
fn guard_overlap(bookings: &HashMap<BookingId, Booking>, booking: &Booking) -> Result<(), StoreError> {
    if !booking.is_confirmed() {
        return Ok(());
    }
    let collides = bookings.values().any(|other| {
        other.id != booking.id
            && other.property_id == booking.property_id
            && other.is_confirmed()
            && other.stay.overlaps(&booking.stay)
    });
    if collides {
        return Err(StoreError::Overlap {
            property_id: booking.property_id,
            check_in: booking.stay.check_in(),
            check_out: booking.stay.check_out(),
        });
    }
    Ok(())
}

impl BookingStore for InMemoryBookingStore {
    fn insert(&self, booking: &Booking) -> impl Future<Output = Result<(), StoreError>> + Send {
        let forced = self.take_forced_duplicate();
        let bookings = Arc::clone(&self.bookings);
        let booking = booking.clone();

        async move {
            if forced {
                return Err(StoreError::DuplicateBookingNumber(booking.booking_number));
            }
            let mut bookings = bookings.lock().map_err(|_| poisoned())?;
            if bookings
                .values()
                .any(|other| other.booking_number == booking.booking_number)
            {
                return Err(StoreError::DuplicateBookingNumber(booking.booking_number));
            }
            guard_overlap(&bookings, &booking)?;
            bookings.insert(booking.id, booking);
            Ok(())
        }
    }

    fn update(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let bookings = Arc::clone(&self.bookings);
        let booking = booking.clone();

        async move {
            let mut bookings = bookings.lock().map_err(|_| poisoned())?;
            match bookings.get(&booking.id) {
                None => return Err(StoreError::NotFound(booking.id)),
                Some(stored) if stored.status != expected => {
                    return Err(StoreError::StatusChanged {
                        id: booking.id,
                        expected,
                    });
                }
                Some(_) => {}
            }
            guard_overlap(&bookings, &booking)?;
            bookings.insert(booking.id, booking);
            Ok(())
        }
    }

    fn delete(&self, id: BookingId) -> impl Future<Output = Result<bool, StoreError>> + Send {
        let bookings = Arc::clone(&self.bookings);

        async move {
            Ok(bookings
                .lock()
                .map_err(|_| poisoned())?
                .remove(&id)
                .is_some())
        }
    }

    fn get(&self, id: BookingId) -> impl Future<Output = Result<Option<Booking>, StoreError>> + Send {
        let bookings = Arc::clone(&self.bookings);

        async move { Ok(bookings.lock().map_err(|_| poisoned())?.get(&id).cloned()) }
    }

    fn booking_number_exists(
        &self,
        number: &BookingNumber,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        let forced = self.take_forced_collision();
        let bookings = Arc::clone(&self.bookings);
        let number = number.clone();

        async move {
            if forced {
                return Ok(true);
            }
            Ok(bookings
                .lock()
                .map_err(|_| poisoned())?
                .values()
                .any(|booking| booking.booking_number == number))
        }
    }

    fn find_confirmed_overlaps(
        &self,
        property_id: PropertyId,
        stay: StayDates,
        exclude: Option<BookingId>,
    ) -> impl Future<Output = Result<Vec<Booking>, StoreError>> + Send {
        let bookings = Arc::clone(&self.bookings);

        async move {
            Ok(bookings
                .lock()
                .map_err(|_| poisoned())?
                .values()
                .filter(|booking| {
                    booking.property_id == property_id
                        && booking.is_confirmed()
                        && Some(booking.id) != exclude
                        && booking.stay.overlaps(&stay)
                })
                .cloned()
                .collect())
        }
    }

    fn list(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<(Vec<Booking>, u64), StoreError>> + Send {
        let bookings = Arc::clone(&self.bookings);
        let filter = filter.clone();

        async move {
            let mut matching: Vec<Booking> = bookings
                .lock()
                .map_err(|_| poisoned())?
                .values()
                .filter(|booking| filter.matches(booking))
                .cloned()
                .collect();
            matching.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.booking_number.as_str().cmp(a.booking_number.as_str()))
            });

            let total = matching.len() as u64;
            let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
            let items = matching
                .into_iter()
                .skip(offset)
                .take(page.limit() as usize)
                .collect();
            Ok((items, total))
        }
    }
}
