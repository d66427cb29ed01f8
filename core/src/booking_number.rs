//! Booking Number Generator.
//!
//! Numbers look like `BK482913X7Q`: a fixed prefix, the last six digits of
//! the millisecond timestamp, and three random uppercase alphanumerics. The
//! timestamp part gives rough chronological order; the random part resolves
//! same-millisecond collisions without a shared counter.

use crate::environment::BookingStore;
use crate::error::{BookingError, Result};
use crate::types::BookingNumber;
use chrono::{DateTime, Utc};
use rand::Rng;

/// Prefix of every generated number.
pub const DEFAULT_PREFIX: &str = "BK";
/// Candidates tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

const SUFFIX_LEN: usize = 3;
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produces booking numbers that do not yet exist in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingNumberGenerator {
    prefix: String,
    max_attempts: u32,
}

impl BookingNumberGenerator {
    /// Creates a generator with a custom prefix and attempt bound.
    #[must_use]
    pub fn new(prefix: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            prefix: prefix.into(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Attempt bound.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draws candidates until one is unused.
    ///
    /// The time-derived stem is fixed for the whole call; only the random
    /// suffix is redrawn on collision.
    ///
    /// # Errors
    ///
    /// - [`BookingError::GenerationExhausted`] after `max_attempts` collisions
    /// - [`BookingError::Storage`] if the existence check fails
    pub async fn generate<S: BookingStore>(
        &self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<BookingNumber> {
        let stem = format!("{}{}", self.prefix, time_component(now));

        for attempt in 1..=self.max_attempts {
            let candidate = BookingNumber::new(format!("{stem}{}", random_suffix()));
            if !store.booking_number_exists(&candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!(attempt, candidate = %candidate, "Booking number collision");
        }

        tracing::warn!(
            attempts = self.max_attempts,
            stem = %stem,
            "Booking number generation exhausted"
        );
        Err(BookingError::GenerationExhausted {
            attempts: self.max_attempts,
        })
    }
}

impl Default for BookingNumberGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_MAX_ATTEMPTS)
    }
}

/// Last six digits of the millisecond timestamp, zero-padded.
#[must_use]
pub fn time_component(now: DateTime<Utc>) -> String {
    format!("{:06}", now.timestamp_millis().rem_euclid(1_000_000))
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
        .collect()
}
