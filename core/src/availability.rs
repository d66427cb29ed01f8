//! Availability Checker.
//!
//! Only `confirmed` bookings hold dates. A request is available when no
//! confirmed booking of the same property overlaps its half-open
//! `[check_in, check_out)` range, so a stay may begin on the day another
//! ends.

use crate::environment::{BookingNotifier, BookingStore, PropertyCatalog};
use crate::error::{BookingError, Result};
use crate::metrics;
use crate::pricing::compute_total;
use crate::service::BookingService;
use crate::types::{Booking, BookingId, Money, Property, PropertyId, StayDates};
use serde::Serialize;

/// Why a range is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The property id does not resolve in the catalog.
    PropertyNotFound,
    /// A confirmed booking overlaps the range.
    Conflict,
}

/// Result of an availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityReport {
    /// Property that was checked.
    pub property_id: PropertyId,
    /// Range that was checked.
    #[serde(flatten)]
    pub stay: StayDates,
    /// True if the range can be booked.
    pub available: bool,
    /// Nights in the range.
    pub nights: u32,
    /// Projected total; zero when not available.
    pub total_amount: Money,
    /// Ranges of the confirmed bookings that overlap the request.
    pub conflicts: Vec<StayDates>,
    /// Set when `available` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,
}

impl AvailabilityReport {
    /// Report for a property that does not exist.
    #[must_use]
    pub fn property_not_found(property_id: PropertyId, stay: StayDates) -> Self {
        Self {
            property_id,
            stay,
            available: false,
            nights: stay.nights(),
            total_amount: Money::ZERO,
            conflicts: Vec::new(),
            reason: Some(UnavailableReason::PropertyNotFound),
        }
    }

    /// Evaluates `stay` against `bookings` of `property`.
    ///
    /// Only confirmed bookings that overlap `stay` and are not `exclude`
    /// count as conflicts, so any superset of the real conflicts may be
    /// passed in.
    ///
    /// # Errors
    ///
    /// [`BookingError::Validation`] if the total overflows.
    pub fn evaluate(
        property: &Property,
        stay: StayDates,
        exclude: Option<BookingId>,
        bookings: &[Booking],
    ) -> Result<Self> {
        let conflicts: Vec<StayDates> = bookings
            .iter()
            .filter(|booking| booking.property_id == property.id)
            .filter(|booking| booking.is_confirmed())
            .filter(|booking| Some(booking.id) != exclude)
            .filter(|booking| booking.stay.overlaps(&stay))
            .map(|booking| booking.stay)
            .collect();

        let nights = stay.nights();
        let available = conflicts.is_empty();
        let total_amount = if available {
            compute_total(nights, property.nightly_price)?
        } else {
            Money::ZERO
        };

        Ok(Self {
            property_id: property.id,
            stay,
            available,
            nights,
            total_amount,
            conflicts,
            reason: (!available).then_some(UnavailableReason::Conflict),
        })
    }
}

impl<S, C, N> BookingService<S, C, N>
where
    S: BookingStore,
    C: PropertyCatalog,
    N: BookingNotifier,
{
    /// Checks whether `stay` can be booked at `property_id`.
    ///
    /// A missing property is reported in the result, not as an error.
    /// `exclude` leaves a booking out of the overlap set, for re-checking a
    /// booking that is being edited. Pure read.
    ///
    /// # Errors
    ///
    /// [`BookingError::Storage`] if the store or catalog fails.
    pub async fn check_availability(
        &self,
        property_id: PropertyId,
        stay: StayDates,
        exclude: Option<BookingId>,
    ) -> Result<AvailabilityReport> {
        let Some(property) = self.catalog.get_by_id(property_id).await? else {
            return Ok(AvailabilityReport::property_not_found(property_id, stay));
        };
        let overlapping = self
            .store
            .find_confirmed_overlaps(property_id, stay, exclude)
            .await?;
        AvailabilityReport::evaluate(&property, stay, exclude, &overlapping)
    }

    /// Availability check for mutation paths: a missing property or a
    /// conflict becomes an error. Returns the property and the priced total.
    pub(crate) async fn require_available(
        &self,
        property_id: PropertyId,
        stay: StayDates,
        exclude: Option<BookingId>,
    ) -> Result<(Property, Money)> {
        let property = self
            .catalog
            .get_by_id(property_id)
            .await?
            .ok_or_else(|| BookingError::property_not_found(property_id))?;
        let overlapping = self
            .store
            .find_confirmed_overlaps(property_id, stay, exclude)
            .await?;
        let report = AvailabilityReport::evaluate(&property, stay, exclude, &overlapping)?;

        if !report.available {
            ::metrics::counter!(metrics::BOOKING_CONFLICTS).increment(1);
            tracing::warn!(
                property_id = %property_id,
                stay = %stay,
                conflicts = report.conflicts.len(),
                "Requested dates overlap a confirmed booking"
            );
            return Err(BookingError::PropertyUnavailable {
                property_id,
                check_in: stay.check_in(),
                check_out: stay.check_out(),
            });
        }

        Ok((property, report.total_amount))
    }
}
