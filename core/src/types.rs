//! Domain types for rental bookings.
//!
//! Identifiers, money, the validated stay range, both status enums and the
//! booking record itself, plus the input shapes accepted by the lifecycle
//! operations.

use crate::error::{BookingError, Result};
use crate::pricing::derive_nights;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum length of a customer name, in characters.
pub const MAX_NAME_LEN: usize = 100;
/// Maximum length of a customer phone number, in characters.
pub const MAX_PHONE_LEN: usize = 30;
/// Maximum length of a customer address, in characters.
pub const MAX_ADDRESS_LEN: usize = 500;
/// Maximum length of special requests, in characters.
pub const MAX_SPECIAL_REQUESTS_LEN: usize = 1000;
/// Maximum length of internal notes, in characters.
pub const MAX_NOTES_LEN: usize = 2000;
/// Smallest accepted party size.
pub const MIN_GUESTS: u32 = 1;
/// Largest accepted party size.
pub const MAX_GUESTS: u32 = 20;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a property in the external catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(Uuid);

impl PropertyId {
    /// Creates a new random `PropertyId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PropertyId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PropertyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-facing booking reference such as `BK482913X7Q`.
///
/// Distinct from [`BookingId`]; assigned once by the
/// [`BookingNumberGenerator`](crate::booking_number::BookingNumberGenerator).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingNumber(String);

impl BookingNumber {
    /// Wraps an existing booking number, e.g. one read back from storage.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Multiplies by a count with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, factor: u64) -> Option<Self> {
        match self.0.checked_mul(factor) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Stay dates
// ============================================================================

/// A half-open `[check_in, check_out)` range of at least one night.
///
/// The only constructor rejects empty and inverted ranges, so any value of
/// this type satisfies `check_out > check_in`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayDates {
    /// Validates and builds a stay range.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if `check_out` is not after `check_in`.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self> {
        if check_out <= check_in {
            return Err(BookingError::Validation(format!(
                "check-out date ({check_out}) must be after check-in date ({check_in})"
            )));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// First night of the stay.
    #[must_use]
    pub const fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// Departure day; not itself a night of the stay.
    #[must_use]
    pub const fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights, always at least 1.
    #[must_use]
    pub fn nights(&self) -> u32 {
        derive_nights(self.check_in, self.check_out)
    }

    /// Half-open overlap test: `[a,b)` and `[c,d)` overlap iff `a < d && c < b`.
    ///
    /// A stay ending on the day another begins does not overlap it.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

impl fmt::Display for StayDates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.check_in, self.check_out)
    }
}

// ============================================================================
// Status enums
// ============================================================================

/// Booking status.
///
/// ```text
/// pending ──► confirmed ──► completed
///    │            │
///    └────────────┴──► cancelled
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Requested, not yet holding the dates.
    Pending,
    /// Holding the dates; participates in the no-double-booking rule.
    Confirmed,
    /// Withdrawn. Terminal.
    Cancelled,
    /// Stay finished. Terminal.
    Completed,
}

impl BookingStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Confirmed, Self::Cancelled, Self::Completed];

    /// Lowercase wire and storage name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Returns true if `next` is an edge of the status graph.
    ///
    /// Self-transitions are not edges.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(BookingError::Validation(format!(
                "invalid booking status '{other}' (expected pending, confirmed, cancelled or completed)"
            ))),
        }
    }
}

/// Payment status, independent of [`BookingStatus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Nothing received.
    Pending,
    /// Deposit received.
    Partial,
    /// Fully paid.
    Paid,
    /// Paid amount returned.
    Refunded,
}

impl PaymentStatus {
    /// Lowercase wire and storage name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }

    /// Returns true if `next` is an edge of the payment graph:
    /// `pending → partial → paid`, `pending → paid`, `paid → refunded`.
    ///
    /// [`BookingService::update_payment_status`](crate::service::BookingService::update_payment_status)
    /// only validates membership; this is for callers that want the graph.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Partial | Self::Paid)
                | (Self::Partial, Self::Paid)
                | (Self::Paid, Self::Refunded)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            other => Err(BookingError::Validation(format!(
                "invalid payment status '{other}' (expected pending, partial, paid or refunded)"
            ))),
        }
    }
}

// ============================================================================
// Customer
// ============================================================================

/// Contact details embedded in a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Customer {
    /// Checks required fields, length bounds and email shape.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        require_text("customer name", &self.name, MAX_NAME_LEN)?;
        require_text("customer phone", &self.phone, MAX_PHONE_LEN)?;
        if !is_valid_email(&self.email) {
            return Err(BookingError::Validation(format!(
                "invalid customer email '{}'",
                self.email
            )));
        }
        if let Some(address) = &self.address {
            check_len("customer address", address, MAX_ADDRESS_LEN)?;
        }
        Ok(())
    }
}

/// Basic email shape check: one `@`, non-empty local part, dotted domain.
///
/// # Examples
///
/// ```
/// use booking_core::types::is_valid_email;
///
/// assert!(is_valid_email("guest@example.com"));
/// assert!(is_valid_email("guest+tag@mail.example.com"));
/// assert!(!is_valid_email("guest"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("guest@localhost"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain needs a dot with something on both sides of it
    if domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') {
        return false;
    }

    let valid_local = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    local.chars().all(valid_local) && domain.chars().all(valid_domain)
}

fn require_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BookingError::Validation(format!("{field} is required")));
    }
    check_len(field, value, max)
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(BookingError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

// ============================================================================
// Property (external catalog view)
// ============================================================================

/// The slice of a catalog listing the booking engine needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Catalog identifier.
    pub id: PropertyId,
    /// Listing title, used in notifications.
    pub title: String,
    /// Price of one night.
    pub nightly_price: Money,
}

// ============================================================================
// Booking
// ============================================================================

/// A booking record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Booking {
    /// Internal identifier.
    pub id: BookingId,
    /// Human-facing reference.
    pub booking_number: BookingNumber,
    /// Booked property.
    pub property_id: PropertyId,
    /// Guest contact details.
    pub customer: Customer,
    /// Stay range.
    #[serde(flatten)]
    pub stay: StayDates,
    /// Party size.
    pub guests: u32,
    /// `nights × nightly_price`, derived; never set directly by callers.
    pub total_amount: Money,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Guest's requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    /// Staff notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking last changed.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Number of nights booked.
    #[must_use]
    pub fn nights(&self) -> u32 {
        self.stay.nights()
    }

    /// Returns true if this booking holds its dates against others.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

/// Input for [`BookingService::create`](crate::service::BookingService::create).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewBooking {
    /// Property to book.
    pub property_id: PropertyId,
    /// Guest contact details.
    pub customer: Customer,
    /// First night.
    pub check_in: NaiveDate,
    /// Departure day.
    pub check_out: NaiveDate,
    /// Party size.
    pub guests: u32,
    /// Guest's requests.
    #[serde(default)]
    pub special_requests: Option<String>,
    /// Staff notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial edit for [`BookingService::update`](crate::service::BookingService::update).
///
/// Absent fields keep their stored value. For the free-text fields an
/// explicit `null` clears the stored value. Status, payment status and total
/// are not editable through this type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BookingChanges {
    /// Move the booking to another property.
    #[serde(default)]
    pub property_id: Option<PropertyId>,
    /// Replace the contact details.
    #[serde(default)]
    pub customer: Option<Customer>,
    /// New first night.
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    /// New departure day.
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    /// New party size.
    #[serde(default)]
    pub guests: Option<u32>,
    /// Replace (`Some(Some(_))`) or clear (`Some(None)`) the guest's requests.
    #[serde(default, deserialize_with = "present")]
    pub special_requests: Option<Option<String>>,
    /// Replace (`Some(Some(_))`) or clear (`Some(None)`) the staff notes.
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
}

/// Marks a field that appeared in the payload, even as `null`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl BookingChanges {
    /// Returns true if the edit touches dates or property, which requires
    /// re-checking availability and re-pricing.
    #[must_use]
    pub const fn touches_stay(&self) -> bool {
        self.check_in.is_some() || self.check_out.is_some() || self.property_id.is_some()
    }

    /// Checks the replacement free text, if any, against its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if either field is too long.
    pub fn validate_free_text(&self) -> Result<()> {
        validate_free_text(
            self.special_requests.as_ref().and_then(Option::as_deref),
            self.notes.as_ref().and_then(Option::as_deref),
        )
    }
}

/// Checks the party size bounds.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] outside `1..=20`.
pub fn validate_guests(guests: u32) -> Result<()> {
    if (MIN_GUESTS..=MAX_GUESTS).contains(&guests) {
        Ok(())
    } else {
        Err(BookingError::Validation(format!(
            "guests must be between {MIN_GUESTS} and {MAX_GUESTS}, got {guests}"
        )))
    }
}

/// Checks the optional free-text fields against their bounds.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] if either field is too long.
pub fn validate_free_text(special_requests: Option<&str>, notes: Option<&str>) -> Result<()> {
    if let Some(text) = special_requests {
        check_len("special requests", text, MAX_SPECIAL_REQUESTS_LEN)?;
    }
    if let Some(text) = notes {
        check_len("notes", text, MAX_NOTES_LEN)?;
    }
    Ok(())
}
