//! Nights and totals.
//!
//! Every mutation path derives these through the two functions below, so
//! `total_amount == nights × nightly_price` holds for any stored booking.

use crate::error::{BookingError, Result};
use crate::types::Money;
use chrono::NaiveDate;

/// Nights between two dates, rounding any partial day up.
///
/// Calendar dates have no partial days, so this is the day difference.
/// Returns 0 when `check_out` is not after `check_in`; callers validate
/// the range through [`StayDates`](crate::types::StayDates) first.
#[must_use]
pub fn derive_nights(check_in: NaiveDate, check_out: NaiveDate) -> u32 {
    let days = (check_out - check_in).num_days();
    u32::try_from(days).unwrap_or(0)
}

/// `nights × nightly_price`.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] if the total does not fit in a `u64`
/// number of cents.
pub fn compute_total(nights: u32, nightly_price: Money) -> Result<Money> {
    nightly_price
        .checked_multiply(u64::from(nights))
        .ok_or_else(|| {
            BookingError::Validation(format!(
                "total for {nights} nights at {nightly_price} per night is out of range"
            ))
        })
}
