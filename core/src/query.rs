//! Booking Query Service: get-by-id and filtered, paginated listing.

use crate::environment::{BookingNotifier, BookingStore, PropertyCatalog};
use crate::error::{BookingError, Result};
use crate::service::BookingService;
use crate::types::{Booking, BookingId, BookingStatus, PaymentStatus, PropertyId};
use serde::Serialize;

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// List filters. Every `Some` field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    /// Case-insensitive substring over booking number, customer name and
    /// customer email.
    pub search: Option<String>,
    /// Exact booking status.
    pub status: Option<BookingStatus>,
    /// Exact payment status.
    pub payment_status: Option<PaymentStatus>,
    /// Exact property.
    pub property_id: Option<PropertyId>,
}

impl BookingFilter {
    /// Sets the search term; blank terms are ignored.
    #[must_use]
    pub fn with_search(mut self, term: impl AsRef<str>) -> Self {
        let term = term.as_ref().trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }

    /// Returns true if `booking` passes every filter.
    ///
    /// Stores that cannot push filters down to a query language use this
    /// directly; SQL stores mirror it.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        if self.status.is_some_and(|status| booking.status != status) {
            return false;
        }
        if self
            .payment_status
            .is_some_and(|status| booking.payment_status != status)
        {
            return false;
        }
        if self.property_id.is_some_and(|id| booking.property_id != id) {
            return false;
        }
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                [
                    booking.booking_number.as_str(),
                    booking.customer.name.as_str(),
                    booking.customer.email.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
            }
        }
    }
}

/// A requested page, already clamped to valid bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Builds a page request; `page` is 1-based. Missing values take the
    /// defaults (page 1, limit 10) and the limit is clamped to `1..=100`.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total matching records.
    pub total: u64,
    /// Total pages at this page size.
    pub pages: u64,
}

impl Pagination {
    /// Metadata for `request` given `total` matches.
    #[must_use]
    pub const fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(request.limit as u64),
        }
    }
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Where this page sits in the full result.
    pub pagination: Pagination,
}

impl<S, C, N> BookingService<S, C, N>
where
    S: BookingStore,
    C: PropertyCatalog,
    N: BookingNotifier,
{
    /// Loads one booking.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if no booking has this id
    /// - [`BookingError::Storage`] on store failure
    pub async fn get(&self, id: BookingId) -> Result<Booking> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(id))
    }

    /// Lists bookings matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// [`BookingError::Storage`] on store failure.
    pub async fn list(&self, filter: &BookingFilter, page: PageRequest) -> Result<Page<Booking>> {
        let (items, total) = self.store.list(filter, page).await?;
        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }
}
