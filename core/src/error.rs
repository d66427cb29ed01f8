//! Error types for booking operations.
//!
//! Business-rule failures are reported as [`BookingError`] variants and never
//! panic. Store adapters report [`StoreError`], which converts into the
//! matching business error so `?` works across the storage seam.

use crate::types::{BookingId, BookingNumber, BookingStatus, PropertyId};
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// The kind of record a [`BookingError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// A booking record.
    Booking,
    /// A property catalog entry.
    Property,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Booking => write!(f, "Booking"),
            Self::Property => write!(f, "Property"),
        }
    }
}

/// Errors returned by booking operations.
#[derive(Error, Debug)]
pub enum BookingError {
    /// Malformed input: bad dates, bad email, guest count out of range.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A booking or property id does not resolve.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// What was looked up.
        resource: Resource,
        /// The id that did not resolve.
        id: Uuid,
    },

    /// A confirmed booking already occupies part of the requested range.
    #[error("Property {property_id} is not available from {check_in} to {check_out}")]
    PropertyUnavailable {
        /// Property that was requested.
        property_id: PropertyId,
        /// Requested check-in date.
        check_in: NaiveDate,
        /// Requested check-out date.
        check_out: NaiveDate,
    },

    /// The requested status change is not an edge of the status graph.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: BookingStatus,
        /// Requested status.
        to: BookingStatus,
    },

    /// Every booking-number candidate collided with an existing booking.
    #[error("Could not generate a unique booking number after {attempts} attempts")]
    GenerationExhausted {
        /// Number of candidates tried.
        attempts: u32,
    },

    /// The store failed in a way the caller cannot fix.
    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl BookingError {
    /// Shorthand for a [`BookingError::NotFound`] on a booking.
    #[must_use]
    pub const fn booking_not_found(id: BookingId) -> Self {
        Self::NotFound {
            resource: Resource::Booking,
            id: *id.as_uuid(),
        }
    }

    /// Shorthand for a [`BookingError::NotFound`] on a property.
    #[must_use]
    pub const fn property_not_found(id: PropertyId) -> Self {
        Self::NotFound {
            resource: Resource::Property,
            id: *id.as_uuid(),
        }
    }

    /// Stable, machine-readable error code.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PropertyUnavailable { .. } => "PROPERTY_UNAVAILABLE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::GenerationExhausted { .. } => "GENERATION_EXHAUSTED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if the caller caused the error and can fix the request.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound { .. }
                | Self::PropertyUnavailable { .. }
                | Self::InvalidTransition { .. }
        )
    }

    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::GenerationExhausted { .. })
    }
}

impl From<StoreError> for BookingError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Overlap {
                property_id,
                check_in,
                check_out,
            } => Self::PropertyUnavailable {
                property_id,
                check_in,
                check_out,
            },
            StoreError::NotFound(id) => Self::booking_not_found(id),
            other => Self::Storage(other),
        }
    }
}

/// Errors reported by [`BookingStore`](crate::environment::BookingStore)
/// and [`PropertyCatalog`](crate::environment::PropertyCatalog) adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The conditional write was refused: a confirmed booking for the same
    /// property already overlaps the written range.
    #[error("Confirmed booking overlaps {check_in}..{check_out} for property {property_id}")]
    Overlap {
        /// Property of the refused write.
        property_id: PropertyId,
        /// Check-in of the refused write.
        check_in: NaiveDate,
        /// Check-out of the refused write.
        check_out: NaiveDate,
    },

    /// The booking number is already taken.
    #[error("Booking number already exists: {0}")]
    DuplicateBookingNumber(BookingNumber),

    /// The booking to update does not exist.
    #[error("Booking not found: {0}")]
    NotFound(BookingId),

    /// The conditional update was refused: the stored status moved on since
    /// the caller read it.
    #[error("Booking {id} is no longer {expected}")]
    StatusChanged {
        /// Booking of the refused write.
        id: BookingId,
        /// Status the caller read.
        expected: BookingStatus,
    },

    /// Connectivity or query failure.
    #[error("Database error: {0}")]
    Database(String),
}

/// Error reported by a [`BookingNotifier`](crate::environment::BookingNotifier).
///
/// Notification failures are logged by the caller and never roll back the
/// booking mutation that triggered them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);
