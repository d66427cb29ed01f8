//! Booking Lifecycle Manager: every write to a booking goes through here.
//!
//! Dates or property changes re-run the availability check (excluding the
//! booking itself) and re-price through [`crate::pricing`]. Promotion to
//! `confirmed` re-validates availability and is then written through the
//! store's conditional update, so the loser of a race gets
//! [`BookingError::PropertyUnavailable`].
//!
//! Every update is conditional on the status it was computed from. A write
//! that loses to a concurrent status change is recomputed from a fresh read
//! rather than overwriting that change.

use crate::environment::{BookingNotifier, BookingStore, NotificationKind, PropertyCatalog};
use crate::error::{BookingError, Result, StoreError};
use crate::metrics;
use crate::service::BookingService;
use crate::types::{
    Booking, BookingChanges, BookingId, BookingStatus, NewBooking, PaymentStatus, Property,
    PropertyId, StayDates, validate_free_text, validate_guests,
};

/// Inserts tried when a freshly generated number loses a race to another
/// insert.
const INSERT_ATTEMPTS: u32 = 3;

/// Read-modify-write attempts per update. At most two status transitions can
/// follow any read, so the third attempt sees a settled status.
const WRITE_ATTEMPTS: u32 = 3;

impl<S, C, N> BookingService<S, C, N>
where
    S: BookingStore,
    C: PropertyCatalog,
    N: BookingNotifier,
{
    /// Creates a `pending` booking.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] for bad dates, a past check-in, guest
    ///   count out of range, a malformed email or oversized text
    /// - [`BookingError::NotFound`] if the property does not exist
    /// - [`BookingError::PropertyUnavailable`] if a confirmed booking
    ///   overlaps the range
    /// - [`BookingError::GenerationExhausted`] if no unique booking number
    ///   could be found
    /// - [`BookingError::Storage`] on store failure
    pub async fn create(&self, input: NewBooking) -> Result<Booking> {
        input.customer.validate()?;
        validate_guests(input.guests)?;
        validate_free_text(input.special_requests.as_deref(), input.notes.as_deref())?;
        let stay = StayDates::new(input.check_in, input.check_out)?;

        let now = self.clock.now();
        let today = now.date_naive();
        if stay.check_in() < today {
            return Err(BookingError::Validation(format!(
                "check-in date ({}) cannot be in the past (today is {today})",
                stay.check_in()
            )));
        }

        let (property, total_amount) = self
            .require_available(input.property_id, stay, None)
            .await?;

        let mut booking = Booking {
            id: BookingId::new(),
            booking_number: self.numbers.generate(&self.store, now).await?,
            property_id: property.id,
            customer: input.customer,
            stay,
            guests: input.guests,
            total_amount,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            special_requests: input.special_requests,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        let mut attempt = 1;
        loop {
            match self.store.insert(&booking).await {
                Ok(()) => break,
                Err(StoreError::DuplicateBookingNumber(number)) if attempt < INSERT_ATTEMPTS => {
                    tracing::debug!(booking_number = %number, attempt, "Booking number taken at insert");
                    attempt += 1;
                    booking.booking_number = self.numbers.generate(&self.store, now).await?;
                }
                Err(StoreError::DuplicateBookingNumber(_)) => {
                    return Err(BookingError::GenerationExhausted { attempts: attempt });
                }
                Err(error) => return Err(store_failure(error)),
            }
        }

        ::metrics::counter!(metrics::BOOKINGS_CREATED).increment(1);
        tracing::info!(
            booking_id = %booking.id,
            booking_number = %booking.booking_number,
            property_id = %booking.property_id,
            stay = %booking.stay,
            nights = booking.nights(),
            total_amount = %booking.total_amount,
            "Booking created"
        );

        self.notify(NotificationKind::Received, &booking, &property).await;
        Ok(booking)
    }

    /// Applies a partial edit.
    ///
    /// If dates or property change, the effective range is re-validated,
    /// availability is re-checked without this booking, and the total is
    /// recomputed. The edit never changes the status; if the status moves
    /// while the edit is in flight, the edit is re-applied to a fresh read.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the booking or the new property does
    ///   not exist
    /// - [`BookingError::Validation`] for invalid fields
    /// - [`BookingError::PropertyUnavailable`] if the new range collides
    /// - [`BookingError::Storage`] on store failure
    pub async fn update(&self, id: BookingId, changes: BookingChanges) -> Result<Booking> {
        let mut attempt = 1;
        let (updated, property) = loop {
            let current = self.get(id).await?;
            let (updated, property) = self.apply_changes(&current, &changes).await?;
            match self.store.update(&updated, current.status).await {
                Ok(()) => break (updated, property),
                Err(error) => retry_stale(error, &mut attempt)?,
            }
        };

        tracing::info!(
            booking_id = %updated.id,
            booking_number = %updated.booking_number,
            stay = %updated.stay,
            total_amount = %updated.total_amount,
            repriced = property.is_some(),
            "Booking updated"
        );

        let property = match property {
            Some(property) => Some(property),
            None => self.property_for_notice(updated.property_id).await,
        };
        if let Some(property) = property {
            self.notify(NotificationKind::Updated, &updated, &property).await;
        }
        Ok(updated)
    }

    /// The edited booking, and the property if the stay was re-checked.
    async fn apply_changes(
        &self,
        current: &Booking,
        changes: &BookingChanges,
    ) -> Result<(Booking, Option<Property>)> {
        let mut updated = current.clone();

        if let Some(customer) = changes.customer.clone() {
            customer.validate()?;
            updated.customer = customer;
        }
        if let Some(guests) = changes.guests {
            validate_guests(guests)?;
            updated.guests = guests;
        }
        changes.validate_free_text()?;
        if let Some(special_requests) = &changes.special_requests {
            updated.special_requests.clone_from(special_requests);
        }
        if let Some(notes) = &changes.notes {
            updated.notes.clone_from(notes);
        }

        let property = if changes.touches_stay() {
            let property_id = changes.property_id.unwrap_or(current.property_id);
            let stay = StayDates::new(
                changes.check_in.unwrap_or(current.stay.check_in()),
                changes.check_out.unwrap_or(current.stay.check_out()),
            )?;
            let (property, total_amount) = self
                .require_available(property_id, stay, Some(current.id))
                .await?;
            updated.property_id = property_id;
            updated.stay = stay;
            updated.total_amount = total_amount;
            Some(property)
        } else {
            None
        };

        updated.updated_at = self.clock.now();
        Ok((updated, property))
    }

    /// Removes a booking permanently.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the booking does not exist
    /// - [`BookingError::Storage`] on store failure
    pub async fn delete(&self, id: BookingId) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(BookingError::booking_not_found(id));
        }
        tracing::info!(booking_id = %id, "Booking deleted");
        Ok(())
    }

    /// Moves a booking along the status graph.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the booking does not exist
    /// - [`BookingError::InvalidTransition`] if `next` is not reachable from
    ///   the current status; the stored status is left unchanged
    /// - [`BookingError::PropertyUnavailable`] when confirming over another
    ///   confirmed booking
    /// - [`BookingError::Storage`] on store failure
    pub async fn update_status(&self, id: BookingId, next: BookingStatus) -> Result<Booking> {
        let mut attempt = 1;
        let (booking, previous, property) = loop {
            let mut booking = self.get(id).await?;
            let previous = booking.status;
            if !previous.can_transition_to(next) {
                tracing::debug!(booking_id = %id, from = %previous, to = %next, "Rejected status transition");
                return Err(BookingError::InvalidTransition {
                    from: previous,
                    to: next,
                });
            }

            let property = if next == BookingStatus::Confirmed {
                let (property, _) = self
                    .require_available(booking.property_id, booking.stay, Some(id))
                    .await?;
                Some(property)
            } else {
                None
            };

            booking.status = next;
            booking.updated_at = self.clock.now();
            match self.store.update(&booking, previous).await {
                Ok(()) => break (booking, previous, property),
                Err(error) => retry_stale(error, &mut attempt)?,
            }
        };

        ::metrics::counter!(metrics::STATUS_TRANSITIONS, "to" => next.as_str()).increment(1);
        tracing::info!(
            booking_id = %booking.id,
            booking_number = %booking.booking_number,
            from = %previous,
            to = %next,
            "Booking status changed"
        );

        let kind = match next {
            BookingStatus::Confirmed => Some(NotificationKind::Confirmed),
            BookingStatus::Cancelled => Some(NotificationKind::Cancelled),
            BookingStatus::Pending | BookingStatus::Completed => None,
        };
        if let Some(kind) = kind {
            let property = match property {
                Some(property) => Some(property),
                None => self.property_for_notice(booking.property_id).await,
            };
            if let Some(property) = property {
                self.notify(kind, &booking, &property).await;
            }
        }
        Ok(booking)
    }

    /// Sets the payment status.
    ///
    /// Any value is accepted; the payment graph is available as
    /// [`PaymentStatus::can_transition_to`] for callers that enforce it.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the booking does not exist
    /// - [`BookingError::Storage`] on store failure
    pub async fn update_payment_status(&self, id: BookingId, next: PaymentStatus) -> Result<Booking> {
        let mut attempt = 1;
        let (booking, previous) = loop {
            let mut booking = self.get(id).await?;
            let previous = booking.payment_status;
            booking.payment_status = next;
            booking.updated_at = self.clock.now();
            match self.store.update(&booking, booking.status).await {
                Ok(()) => break (booking, previous),
                Err(error) => retry_stale(error, &mut attempt)?,
            }
        };

        tracing::info!(
            booking_id = %booking.id,
            booking_number = %booking.booking_number,
            from = %previous,
            to = %next,
            "Payment status changed"
        );
        Ok(booking)
    }

    async fn property_for_notice(&self, property_id: PropertyId) -> Option<Property> {
        match self.catalog.get_by_id(property_id).await {
            Ok(Some(property)) => Some(property),
            Ok(None) => {
                tracing::warn!(property_id = %property_id, "Skipping notification: property not found");
                None
            }
            Err(error) => {
                tracing::warn!(property_id = %property_id, error = %error, "Skipping notification: catalog lookup failed");
                None
            }
        }
    }
}

/// Passes a stale-status refusal while attempts remain, so the caller
/// re-reads and re-applies; anything else becomes the operation's error.
fn retry_stale(error: StoreError, attempt: &mut u32) -> Result<()> {
    match error {
        StoreError::StatusChanged { id, expected } if *attempt < WRITE_ATTEMPTS => {
            tracing::debug!(booking_id = %id, expected = %expected, attempt = *attempt, "Status changed under write, retrying");
            *attempt += 1;
            Ok(())
        }
        error => Err(store_failure(error)),
    }
}

fn store_failure(error: StoreError) -> BookingError {
    if matches!(error, StoreError::Overlap { .. }) {
        ::metrics::counter!(metrics::BOOKING_CONFLICTS).increment(1);
        tracing::warn!(error = %error, "Conditional write refused by store");
    }
    error.into()
}
