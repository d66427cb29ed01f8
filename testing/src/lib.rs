//! # Booking Testing
//!
//! Test doubles for the booking engine.
//!
//! This crate provides:
//! - A fixed clock
//! - [`InMemoryBookingStore`] with the same conditional-write guarantee as
//!   the PostgreSQL store
//! - An in-memory property catalog and recording/failing notifiers
//! - Fixtures for dates, customers and booking requests
//!
//! ## Example
//!
//! ```ignore
//! use booking_testing::{test_env, fixtures};
//!
//! #[tokio::test]
//! async fn creates_pending_booking() {
//!     let env = test_env();
//!     let property = env.catalog.add_property(10_000);
//!     let booking = env.service
//!         .create(fixtures::new_booking(property.id, "2025-06-01", "2025-06-04"))
//!         .await
//!         .unwrap();
//!     assert_eq!(booking.nights(), 3);
//! }
//! ```

use booking_core::BookingService;
use std::sync::Arc;

pub mod collaborators;
pub mod fixtures;
pub mod store;

pub use collaborators::{FailingNotifier, InMemoryPropertyCatalog, RecordingNotifier};
pub use mocks::{FixedClock, test_clock};
pub use store::InMemoryBookingStore;

/// Mock implementations of environment traits
pub mod mocks {
    use booking_core::Clock;
    use chrono::{DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use booking_testing::mocks::FixedClock;
    /// use booking_core::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Booking service wired to the in-memory doubles.
pub type TestBookingService =
    BookingService<InMemoryBookingStore, InMemoryPropertyCatalog, RecordingNotifier>;

/// A service plus handles onto its doubles.
///
/// The store, catalog and notifier share state with the copies inside the
/// service, so tests can seed and inspect them directly.
pub struct TestEnv {
    /// The service under test.
    pub service: TestBookingService,
    /// Shared view of the service's store.
    pub store: InMemoryBookingStore,
    /// Shared view of the service's catalog.
    pub catalog: InMemoryPropertyCatalog,
    /// Shared view of the service's notifier.
    pub notifier: RecordingNotifier,
}

/// Service over empty in-memory doubles and [`test_clock`].
#[must_use]
pub fn test_env() -> TestEnv {
    let store = InMemoryBookingStore::new();
    let catalog = InMemoryPropertyCatalog::new();
    let notifier = RecordingNotifier::new();
    let service = BookingService::new(
        store.clone(),
        catalog.clone(),
        notifier.clone(),
        Arc::new(test_clock()),
    );
    TestEnv {
        service,
        store,
        catalog,
        notifier,
    }
}
