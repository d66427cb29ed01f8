//! Booking endpoints.
//!
//! Thin adapters: parse the request, call the [`BookingService`], wrap the
//! result in the envelope. All business rules live in `booking-core`.
//!
//! [`BookingService`]: booking_core::BookingService

use crate::error::AppError;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CorrelationId};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use booking_core::{
    AvailabilityReport, Booking, BookingChanges, BookingFilter, BookingId, BookingNotifier,
    BookingStatus, BookingStore, NewBooking, PageRequest, PaymentStatus, PropertyCatalog,
    PropertyId, StayDates,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

/// Query string of `GET /api/bookings`.
///
/// Status values arrive as text so that an unknown value is reported as a
/// validation error naming the accepted values. Empty strings are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// 1-based page, default 1.
    pub page: Option<u32>,
    /// Page size, default 10, at most 100.
    pub limit: Option<u32>,
    /// Substring over booking number, customer name and email.
    pub search: Option<String>,
    /// Booking status filter.
    pub status: Option<String>,
    /// Payment status filter.
    pub payment_status: Option<String>,
    /// Property filter.
    pub property_id: Option<Uuid>,
}

impl ListParams {
    fn into_query(self) -> Result<(BookingFilter, PageRequest), AppError> {
        let status = non_empty(self.status)
            .map(|value| value.parse::<BookingStatus>())
            .transpose()?;
        let payment_status = non_empty(self.payment_status)
            .map(|value| value.parse::<PaymentStatus>())
            .transpose()?;

        let mut filter = BookingFilter {
            search: None,
            status,
            payment_status,
            property_id: self.property_id.map(PropertyId::from_uuid),
        };
        if let Some(search) = self.search {
            filter = filter.with_search(search);
        }

        Ok((filter, PageRequest::new(self.page, self.limit)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of `POST /api/availability`.
#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    /// Property to check.
    pub property_id: Uuid,
    /// First night.
    pub check_in: NaiveDate,
    /// Departure day.
    pub check_out: NaiveDate,
    /// Booking to leave out of the overlap set, when re-checking an edit.
    #[serde(default)]
    pub exclude_booking_id: Option<Uuid>,
}

/// Body of `PATCH /api/bookings/:id/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Target booking status.
    pub status: String,
}

/// Body of `PATCH /api/bookings/:id/payment-status`.
#[derive(Debug, Deserialize)]
pub struct PaymentStatusRequest {
    /// Target payment status.
    pub payment_status: String,
}

/// List bookings.
///
/// # Endpoint
///
/// ```text
/// GET /api/bookings?page=1&limit=10&search=smith&status=confirmed
/// ```
///
/// # Errors
///
/// 400 for an unknown status value, 500 on store failure.
pub async fn list_bookings<S, C, N>(
    State(state): State<AppState<S, C, N>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<ApiResponse<Vec<Booking>>, AppError>
where
    S: BookingStore + 'static,
    C: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    let (filter, page) = params.into_query()?;
    let page = state.service.list(&filter, page).await?;
    Ok(ApiResponse::page(page))
}

/// Fetch one booking.
///
/// # Errors
///
/// 404 if the booking does not exist.
pub async fn get_booking<S, C, N>(
    State(state): State<AppState<S, C, N>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<Booking>, AppError>
where
    S: BookingStore + 'static,
    C: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    let booking = state.service.get(BookingId::from_uuid(id)).await?;
    Ok(ApiResponse::ok(booking))
}

/// Create a booking.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings
/// Content-Type: application/json
///
/// {
///   "property_id": "…",
///   "customer": { "name": "Ada", "email": "ada@example.com", "phone": "+44 20 7946 0000" },
///   "check_in": "2025-06-01",
///   "check_out": "2025-06-04",
///   "guests": 2
/// }
/// ```
///
/// Responds 201 with the stored booking, including its booking number and
/// computed total.
///
/// # Errors
///
/// 400 for invalid input or unavailable dates, 404 for an unknown property,
/// 503 if no booking number could be allocated.
pub async fn create_booking<S, C, N>(
    State(state): State<AppState<S, C, N>>,
    correlation_id: CorrelationId,
    ApiJson(input): ApiJson<NewBooking>,
) -> Result<ApiResponse<Booking>, AppError>
where
    S: BookingStore + 'static,
    C: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    tracing::debug!(
        correlation_id = %correlation_id.0,
        property_id = %input.property_id,
        "Create booking request"
    );
    let booking = state.service.create(input).await?;
    Ok(ApiResponse::created(booking))
}

/// Edit a booking. Changing dates or property re-checks availability and
/// reprices.
///
/// # Errors
///
/// 400 for invalid input or unavailable dates, 404 for an unknown booking or
/// property.
pub async fn update_booking<S, C, N>(
    State(state): State<AppState<S, C, N>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<BookingChanges>,
) -> Result<ApiResponse<Booking>, AppError>
where
    S: BookingStore + 'static,
    C: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    let booking = state
        .service
        .update(BookingId::from_uuid(id), changes)
        .await?;
    Ok(ApiResponse::ok(booking))
}

/// Delete a booking.
///
/// # Errors
///
/// 404 if the booking does not exist.
pub async fn delete_booking<S, C, N>(
    State(state): State<AppState<S, C, N>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<()>, AppError>
where
    S: BookingStore + 'static,
    C: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    state.service.delete(BookingId::from_uuid(id)).await?;
    Ok(ApiResponse::message("Booking deleted successfully"))
}

/// Check whether a property is free for a date range.
///
/// An unknown property is reported in the body (`available: false`,
/// `reason: "property_not_found"`), not as a 404.
///
/// # Errors
///
/// 400 if `check_out` is not after `check_in`.
pub async fn check_availability<S, C, N>(
    State(state): State<AppState<S, C, N>>,
    ApiJson(request): ApiJson<AvailabilityRequest>,
) -> Result<ApiResponse<AvailabilityReport>, AppError>
where
    S: BookingStore + 'static,
    C: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    let stay = StayDates::new(request.check_in, request.check_out)?;
    let report = state
        .service
        .check_availability(
            PropertyId::from_uuid(request.property_id),
            stay,
            request.exclude_booking_id.map(BookingId::from_uuid),
        )
        .await?;
    Ok(ApiResponse::ok(report))
}

/// Move a booking through its status machine.
///
/// # Errors
///
/// 400 for an unknown status, a transition outside the graph, or a
/// confirmation that would double-book; 404 if the booking does not exist.
pub async fn update_status<S, C, N>(
    State(state): State<AppState<S, C, N>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<ApiResponse<Booking>, AppError>
where
    S: BookingStore + 'static,
    C: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    let next: BookingStatus = request.status.parse()?;
    let booking = state
        .service
        .update_status(BookingId::from_uuid(id), next)
        .await?;
    Ok(ApiResponse::ok(booking))
}

/// Set a booking's payment status.
///
/// # Errors
///
/// 400 for an unknown payment status, 404 if the booking does not exist.
pub async fn update_payment_status<S, C, N>(
    State(state): State<AppState<S, C, N>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<PaymentStatusRequest>,
) -> Result<ApiResponse<Booking>, AppError>
where
    S: BookingStore + 'static,
    C: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    let next: PaymentStatus = request.payment_status.parse()?;
    let booking = state
        .service
        .update_payment_status(BookingId::from_uuid(id), next)
        .await?;
    Ok(ApiResponse::ok(booking))
}
