//! # Booking Core
//!
//! Availability, pricing and lifecycle rules for rental bookings.
//!
//! ## Components
//!
//! - **Booking Number Generator** ([`booking_number`]): unique human-facing
//!   references, retried on collision
//! - **Availability Checker** ([`availability`]): half-open overlap test
//!   against confirmed bookings, nights and projected total
//! - **Booking Lifecycle Manager** ([`lifecycle`]): create, edit, delete and
//!   the status and payment-status changes
//! - **Booking Query Service** ([`query`]): get-by-id and filtered listing
//!
//! All four hang off [`BookingService`], which is constructed with its
//! dependencies ([`environment`]) instead of reading process-wide state.
//!
//! ## Invariant
//!
//! No two `confirmed` bookings of the same property overlap. The service
//! checks before writing, and the store refuses any write that would break
//! the rule, so concurrent requests cannot both win.
//!
//! ## Example
//!
//! ```ignore
//! use booking_core::*;
//!
//! let service = BookingService::new(store, catalog, notifier, Arc::new(SystemClock));
//! let booking = service.create(new_booking).await?;
//! let booking = service.update_status(booking.id, BookingStatus::Confirmed).await?;
//! ```

pub mod availability;
pub mod booking_number;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod pricing;
pub mod query;
pub mod service;
pub mod types;

pub use availability::{AvailabilityReport, UnavailableReason};
pub use booking_number::BookingNumberGenerator;
pub use environment::{
    BookingNotifier, BookingStore, Clock, NotificationKind, PropertyCatalog, SystemClock,
};
pub use error::{BookingError, NotifyError, Resource, Result, StoreError};
pub use pricing::{compute_total, derive_nights};
pub use query::{BookingFilter, Page, PageRequest, Pagination};
pub use service::BookingService;
pub use types::{
    Booking, BookingChanges, BookingId, BookingNumber, BookingStatus, Customer, Money,
    NewBooking, PaymentStatus, Property, PropertyId, StayDates,
};
