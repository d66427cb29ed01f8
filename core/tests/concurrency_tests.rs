//! Racing requests against a shared store.

#![allow(clippy::unwrap_used)]

use booking_core::{
    BookingChanges, BookingError, BookingService, BookingStatus, PaymentStatus, Property,
    PropertyCatalog, PropertyId, StoreError,
};
use booking_testing::fixtures::{date, new_booking};
use booking_testing::{
    InMemoryBookingStore, InMemoryPropertyCatalog, RecordingNotifier, test_clock, test_env,
};
use futures::future::join_all;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Catalog whose next lookup, once armed, parks until released.
#[derive(Clone, Default)]
struct GatedCatalog {
    inner: InMemoryPropertyCatalog,
    armed: Arc<AtomicBool>,
    reached: Arc<Notify>,
    release: Arc<Notify>,
}

impl GatedCatalog {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl PropertyCatalog for GatedCatalog {
    fn get_by_id(
        &self,
        id: PropertyId,
    ) -> impl Future<Output = Result<Option<Property>, StoreError>> + Send {
        let gate = self.clone();

        async move {
            if gate.armed.swap(false, Ordering::SeqCst) {
                gate.reached.notify_one();
                gate.release.notified().await;
            }
            gate.inner.get_by_id(id).await
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_confirmations_leave_exactly_one_winner() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let service = Arc::new(env.service);

    let tasks = (0..8).map(|_| {
        let service = Arc::clone(&service);
        let property_id = property.id;
        tokio::spawn(async move {
            let booking = service
                .create(new_booking(property_id, "2025-06-01", "2025-06-04"))
                .await?;
            service
                .update_status(booking.id, BookingStatus::Confirmed)
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(error) = result {
            assert!(
                matches!(error, BookingError::PropertyUnavailable { .. }),
                "loser should see PropertyUnavailable, got {error:?}"
            );
        }
    }
    assert_eq!(env.store.confirmed_for(property.id).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_identical_requests_confirmed_at_once() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let service = Arc::new(env.service);

    let first = service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();
    let second = service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    let confirm = |id| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.update_status(id, BookingStatus::Confirmed).await })
    };
    let (a, b) = tokio::join!(confirm(first.id), confirm(second.id));
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        Err(BookingError::PropertyUnavailable { .. })
    )));
    assert_eq!(env.store.confirmed_for(property.id).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_booking_numbers() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let service = Arc::new(env.service);

    let tasks = (0..50).map(|_| {
        let service = Arc::clone(&service);
        let property_id = property.id;
        tokio::spawn(async move {
            service
                .create(new_booking(property_id, "2025-06-01", "2025-06-04"))
                .await
        })
    });
    let numbers: HashSet<String> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().booking_number.as_str().to_string())
        .collect();

    assert_eq!(numbers.len(), 50);
    assert_eq!(env.store.snapshot().len(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disjoint_ranges_confirm_independently() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let service = Arc::new(env.service);

    let ranges = [
        ("2025-06-01", "2025-06-04"),
        ("2025-06-04", "2025-06-07"),
        ("2025-06-07", "2025-06-10"),
    ];
    let tasks = ranges.iter().map(|&(check_in, check_out)| {
        let service = Arc::clone(&service);
        let property_id = property.id;
        tokio::spawn(async move {
            let booking = service
                .create(new_booking(property_id, check_in, check_out))
                .await?;
            service
                .update_status(booking.id, BookingStatus::Confirmed)
                .await
        })
    });

    for joined in join_all(tasks).await {
        joined.unwrap().unwrap();
    }
    assert_eq!(env.store.confirmed_for(property.id).len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn edit_in_flight_does_not_undo_a_cancellation() {
    let catalog = GatedCatalog::default();
    let property = catalog.inner.add_property(10_000);
    let service = Arc::new(BookingService::new(
        InMemoryBookingStore::new(),
        catalog.clone(),
        RecordingNotifier::new(),
        Arc::new(test_clock()),
    ));

    let booking = service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();
    service
        .update_status(booking.id, BookingStatus::Confirmed)
        .await
        .unwrap();

    catalog.arm();
    let edit = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .update(
                    booking.id,
                    BookingChanges {
                        check_out: Some(date("2025-06-03")),
                        ..BookingChanges::default()
                    },
                )
                .await
        })
    };

    catalog.reached.notified().await;
    let cancelled = service
        .update_status(booking.id, BookingStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    catalog.release.notify_one();

    let edited = edit.await.unwrap().unwrap();
    assert_eq!(edited.status, BookingStatus::Cancelled);
    assert_eq!(edited.stay.check_out(), date("2025-06-03"));

    let stored = service.get(booking.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);
    assert_eq!(stored.nights(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn confirmation_in_flight_rechecks_a_cancellation() {
    let store = InMemoryBookingStore::new();
    let catalog = GatedCatalog::default();
    let property = catalog.inner.add_property(10_000);
    let service = Arc::new(BookingService::new(
        store.clone(),
        catalog.clone(),
        RecordingNotifier::new(),
        Arc::new(test_clock()),
    ));

    let booking = service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    catalog.arm();
    let confirm = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .update_status(booking.id, BookingStatus::Confirmed)
                .await
        })
    };

    catalog.reached.notified().await;
    service
        .update_status(booking.id, BookingStatus::Cancelled)
        .await
        .unwrap();
    catalog.release.notify_one();

    let outcome = confirm.await.unwrap();
    assert!(
        matches!(
            outcome,
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Confirmed,
            })
        ),
        "stale confirmation should be re-checked, got {outcome:?}"
    );
    let stored = service.get(booking.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);
    assert!(store.confirmed_for(property.id).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn payment_updates_racing_a_cancellation_keep_it() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let service = Arc::new(env.service);

    let booking = service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    let payments = (0..8).map(|_| {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .update_payment_status(booking.id, PaymentStatus::Paid)
                .await
        })
    });
    let cancel = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .update_status(booking.id, BookingStatus::Cancelled)
                .await
        })
    };

    for joined in join_all(payments).await {
        joined.unwrap().unwrap();
    }
    cancel.await.unwrap().unwrap();

    let stored = service.get(booking.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
}
