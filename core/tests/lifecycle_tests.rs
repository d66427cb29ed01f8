//! Booking lifecycle tests over the in-memory doubles.

#![allow(clippy::unwrap_used, clippy::panic)]

use booking_core::{
    BookingChanges, BookingError, BookingFilter, BookingId, BookingService, BookingStatus, Clock,
    Customer, Money, NotificationKind, PageRequest, PaymentStatus, PropertyId, Resource,
    StayDates, UnavailableReason,
};
use booking_testing::fixtures::{date, new_booking};
use booking_testing::{
    FailingNotifier, InMemoryBookingStore, InMemoryPropertyCatalog, test_clock, test_env,
};
use std::sync::Arc;

fn stay(check_in: &str, check_out: &str) -> StayDates {
    StayDates::new(date(check_in), date(check_out)).unwrap()
}

#[tokio::test]
async fn create_prices_nights_and_starts_pending() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);

    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::Pending);
    assert_eq!(booking.nights(), 3);
    assert_eq!(booking.total_amount, Money::from_cents(30_000));
    assert!(booking.booking_number.as_str().starts_with("BK"));
    assert_eq!(booking.booking_number.as_str().len(), 11);
    assert_eq!(booking.created_at, test_clock().now());

    let stored = env.service.get(booking.id).await.unwrap();
    assert_eq!(stored, booking);
    assert_eq!(env.notifier.kinds_for(booking.id), vec![NotificationKind::Received]);
}

#[tokio::test]
async fn pending_bookings_do_not_block_but_second_confirmation_fails() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);

    let first = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    let report = env
        .service
        .check_availability(property.id, stay("2025-06-03", "2025-06-05"), None)
        .await
        .unwrap();
    assert!(report.available);
    assert_eq!(report.total_amount, Money::from_cents(20_000));

    let second = env
        .service
        .create(new_booking(property.id, "2025-06-03", "2025-06-05"))
        .await
        .unwrap();

    env.service
        .update_status(first.id, BookingStatus::Confirmed)
        .await
        .unwrap();
    let result = env
        .service
        .update_status(second.id, BookingStatus::Confirmed)
        .await;

    match result {
        Err(BookingError::PropertyUnavailable {
            property_id,
            check_in,
            check_out,
        }) => {
            assert_eq!(property_id, property.id);
            assert_eq!(check_in, date("2025-06-03"));
            assert_eq!(check_out, date("2025-06-05"));
        }
        other => panic!("expected PropertyUnavailable, got {other:?}"),
    }
    let second = env.service.get(second.id).await.unwrap();
    assert_eq!(second.status, BookingStatus::Pending);
    assert_eq!(env.store.confirmed_for(property.id).len(), 1);
}

#[tokio::test]
async fn shrinking_a_confirmed_stay_reprices_without_self_collision() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();
    env.service
        .update_status(booking.id, BookingStatus::Confirmed)
        .await
        .unwrap();

    let updated = env
        .service
        .update(
            booking.id,
            BookingChanges {
                check_out: Some(date("2025-06-02")),
                ..BookingChanges::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.stay, stay("2025-06-01", "2025-06-02"));
    assert_eq!(updated.nights(), 1);
    assert_eq!(updated.total_amount, Money::from_cents(10_000));
    assert_eq!(updated.status, BookingStatus::Confirmed);
    assert_eq!(env.service.get(booking.id).await.unwrap(), updated);
}

#[tokio::test]
async fn deleting_a_confirmed_booking_frees_its_dates() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();
    env.service
        .update_status(booking.id, BookingStatus::Confirmed)
        .await
        .unwrap();

    let range = stay("2025-06-01", "2025-06-04");
    let before = env
        .service
        .check_availability(property.id, range, None)
        .await
        .unwrap();
    assert!(!before.available);

    env.service.delete(booking.id).await.unwrap();

    let after = env
        .service
        .check_availability(property.id, range, None)
        .await
        .unwrap();
    assert!(after.available);
    assert_eq!(after.total_amount, Money::from_cents(30_000));
}

#[tokio::test]
async fn terminal_status_cannot_be_left() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    env.service
        .update_status(booking.id, BookingStatus::Confirmed)
        .await
        .unwrap();
    env.service
        .update_status(booking.id, BookingStatus::Completed)
        .await
        .unwrap();
    let result = env
        .service
        .update_status(booking.id, BookingStatus::Pending)
        .await;

    assert!(matches!(
        result,
        Err(BookingError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Pending
        })
    ));
    assert_eq!(
        env.service.get(booking.id).await.unwrap().status,
        BookingStatus::Completed
    );
}

#[tokio::test]
async fn pending_cannot_skip_to_completed() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    let result = env
        .service
        .update_status(booking.id, BookingStatus::Completed)
        .await;
    assert!(matches!(result, Err(BookingError::InvalidTransition { .. })));
}

#[tokio::test]
async fn status_changes_send_matching_notifications() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    env.service
        .update_status(booking.id, BookingStatus::Confirmed)
        .await
        .unwrap();
    env.service
        .update_status(booking.id, BookingStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(
        env.notifier.kinds_for(booking.id),
        vec![
            NotificationKind::Received,
            NotificationKind::Confirmed,
            NotificationKind::Cancelled
        ]
    );
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);

    let zero_nights = new_booking(property.id, "2025-06-01", "2025-06-01");
    let inverted = new_booking(property.id, "2025-06-04", "2025-06-01");
    let past = new_booking(property.id, "2024-12-31", "2025-01-02");
    let mut no_guests = new_booking(property.id, "2025-06-01", "2025-06-04");
    no_guests.guests = 0;
    let mut crowd = new_booking(property.id, "2025-06-01", "2025-06-04");
    crowd.guests = 21;
    let mut bad_email = new_booking(property.id, "2025-06-01", "2025-06-04");
    bad_email.customer.email = "not-an-email".to_string();
    let mut long_notes = new_booking(property.id, "2025-06-01", "2025-06-04");
    long_notes.notes = Some("n".repeat(2001));

    for input in [zero_nights, inverted, past, no_guests, crowd, bad_email, long_notes] {
        let result = env.service.create(input).await;
        assert!(
            matches!(result, Err(BookingError::Validation(_))),
            "expected validation error, got {result:?}"
        );
    }
    assert!(env.store.snapshot().is_empty());
    assert!(env.notifier.sent().is_empty());
}

#[tokio::test]
async fn check_in_today_is_accepted() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-01-01", "2025-01-02"))
        .await
        .unwrap();
    assert_eq!(booking.nights(), 1);
}

#[tokio::test]
async fn unknown_property() {
    let env = test_env();
    let missing = PropertyId::new();

    let result = env
        .service
        .create(new_booking(missing, "2025-06-01", "2025-06-04"))
        .await;
    assert!(matches!(
        result,
        Err(BookingError::NotFound {
            resource: Resource::Property,
            ..
        })
    ));

    let report = env
        .service
        .check_availability(missing, stay("2025-06-01", "2025-06-04"), None)
        .await
        .unwrap();
    assert!(!report.available);
    assert_eq!(report.reason, Some(UnavailableReason::PropertyNotFound));
}

#[tokio::test]
async fn availability_reports_conflicting_ranges() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let held = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();
    env.service
        .update_status(held.id, BookingStatus::Confirmed)
        .await
        .unwrap();

    let report = env
        .service
        .check_availability(property.id, stay("2025-06-02", "2025-06-06"), None)
        .await
        .unwrap();
    assert!(!report.available);
    assert_eq!(report.total_amount, Money::ZERO);
    assert_eq!(report.conflicts, vec![held.stay]);

    let adjacent = env
        .service
        .check_availability(property.id, stay("2025-06-04", "2025-06-06"), None)
        .await
        .unwrap();
    assert!(adjacent.available);

    let excluded = env
        .service
        .check_availability(property.id, stay("2025-06-02", "2025-06-06"), Some(held.id))
        .await
        .unwrap();
    assert!(excluded.available);
}

#[tokio::test]
async fn create_over_confirmed_dates_is_refused() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let held = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();
    env.service
        .update_status(held.id, BookingStatus::Confirmed)
        .await
        .unwrap();

    let result = env
        .service
        .create(new_booking(property.id, "2025-06-03", "2025-06-05"))
        .await;
    assert!(matches!(result, Err(BookingError::PropertyUnavailable { .. })));
    assert_eq!(env.store.snapshot().len(), 1);
}

#[tokio::test]
async fn moving_to_another_property_reprices() {
    let env = test_env();
    let cheap = env.catalog.add_property(10_000);
    let pricey = env.catalog.add_property(25_000);
    let booking = env
        .service
        .create(new_booking(cheap.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    let updated = env
        .service
        .update(
            booking.id,
            BookingChanges {
                property_id: Some(pricey.id),
                ..BookingChanges::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.property_id, pricey.id);
    assert_eq!(updated.total_amount, Money::from_cents(75_000));
    assert_eq!(
        env.notifier.kinds_for(booking.id),
        vec![NotificationKind::Received, NotificationKind::Updated]
    );
}

#[tokio::test]
async fn editing_into_confirmed_dates_is_refused_and_leaves_booking_unchanged() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let held = env
        .service
        .create(new_booking(property.id, "2025-06-10", "2025-06-12"))
        .await
        .unwrap();
    env.service
        .update_status(held.id, BookingStatus::Confirmed)
        .await
        .unwrap();
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    let result = env
        .service
        .update(
            booking.id,
            BookingChanges {
                check_in: Some(date("2025-06-09")),
                check_out: Some(date("2025-06-11")),
                ..BookingChanges::default()
            },
        )
        .await;

    assert!(matches!(result, Err(BookingError::PropertyUnavailable { .. })));
    assert_eq!(env.service.get(booking.id).await.unwrap(), booking);
}

#[tokio::test]
async fn edit_without_date_changes_keeps_total() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    let updated = env
        .service
        .update(
            booking.id,
            BookingChanges {
                guests: Some(4),
                customer: Some(Customer {
                    name: "Luis Ruiz".to_string(),
                    email: "luis@example.com".to_string(),
                    phone: "600 000 001".to_string(),
                    address: None,
                }),
                special_requests: Some(Some("Late arrival".to_string())),
                ..BookingChanges::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.guests, 4);
    assert_eq!(updated.customer.name, "Luis Ruiz");
    assert_eq!(updated.special_requests.as_deref(), Some("Late arrival"));
    assert_eq!(updated.total_amount, booking.total_amount);
    assert_eq!(updated.booking_number, booking.booking_number);
}

#[tokio::test]
async fn edit_clears_free_text_only_when_asked() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let mut input = new_booking(property.id, "2025-06-01", "2025-06-04");
    input.special_requests = Some("Crib please".to_string());
    input.notes = Some("Returning guest".to_string());
    let booking = env.service.create(input).await.unwrap();

    let untouched = env
        .service
        .update(
            booking.id,
            BookingChanges {
                guests: Some(3),
                ..BookingChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(untouched.special_requests.as_deref(), Some("Crib please"));
    assert_eq!(untouched.notes.as_deref(), Some("Returning guest"));

    let cleared = env
        .service
        .update(
            booking.id,
            BookingChanges {
                special_requests: Some(None),
                ..BookingChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.special_requests, None);
    assert_eq!(cleared.notes.as_deref(), Some("Returning guest"));
    assert_eq!(env.service.get(booking.id).await.unwrap().special_requests, None);
}

#[tokio::test]
async fn edit_validates_fields() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    let crowd = env
        .service
        .update(
            booking.id,
            BookingChanges {
                guests: Some(30),
                ..BookingChanges::default()
            },
        )
        .await;
    assert!(matches!(crowd, Err(BookingError::Validation(_))));

    let inverted = env
        .service
        .update(
            booking.id,
            BookingChanges {
                check_out: Some(date("2025-05-30")),
                ..BookingChanges::default()
            },
        )
        .await;
    assert!(matches!(inverted, Err(BookingError::Validation(_))));
    assert_eq!(env.service.get(booking.id).await.unwrap(), booking);
}

#[tokio::test]
async fn missing_booking_is_not_found_everywhere() {
    let env = test_env();
    let id = BookingId::new();

    assert!(matches!(
        env.service.get(id).await,
        Err(BookingError::NotFound {
            resource: Resource::Booking,
            ..
        })
    ));
    assert!(matches!(
        env.service.update(id, BookingChanges::default()).await,
        Err(BookingError::NotFound { .. })
    ));
    assert!(matches!(
        env.service.delete(id).await,
        Err(BookingError::NotFound { .. })
    ));
    assert!(matches!(
        env.service.update_status(id, BookingStatus::Confirmed).await,
        Err(BookingError::NotFound { .. })
    ));
    assert!(matches!(
        env.service.update_payment_status(id, PaymentStatus::Paid).await,
        Err(BookingError::NotFound { .. })
    ));
}

#[tokio::test]
async fn payment_status_is_independent_of_booking_status() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    let paid = env
        .service
        .update_payment_status(booking.id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.status, BookingStatus::Pending);

    let refunded = env
        .service
        .update_payment_status(booking.id, PaymentStatus::Refunded)
        .await
        .unwrap();
    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn notifier_failure_does_not_roll_back() {
    let store = InMemoryBookingStore::new();
    let catalog = InMemoryPropertyCatalog::new();
    let notifier = FailingNotifier::new();
    let service = BookingService::new(
        store.clone(),
        catalog.clone(),
        notifier.clone(),
        Arc::new(test_clock()),
    );
    let property = catalog.add_property(10_000);

    let booking = service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();
    let confirmed = service
        .update_status(booking.id, BookingStatus::Confirmed)
        .await
        .unwrap();

    assert_eq!(notifier.attempts(), 2);
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(store.confirmed_for(property.id).len(), 1);
}

#[tokio::test]
async fn booking_number_collisions_are_retried_then_exhausted() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);

    env.store.force_number_collisions(9);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();
    assert!(booking.booking_number.as_str().starts_with("BK"));

    env.store.force_number_collisions(10);
    let result = env
        .service
        .create(new_booking(property.id, "2025-07-01", "2025-07-04"))
        .await;
    assert!(matches!(
        result,
        Err(BookingError::GenerationExhausted { attempts: 10 })
    ));
    assert_eq!(env.store.snapshot().len(), 1);
}

#[tokio::test]
async fn insert_duplicate_is_retried_with_a_fresh_number() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);

    env.store.force_insert_duplicates(2);
    let booking = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await
        .unwrap();

    assert_eq!(env.store.snapshot(), vec![booking.clone()]);
    assert_eq!(env.notifier.kinds_for(booking.id), vec![NotificationKind::Received]);
}

#[tokio::test]
async fn insert_duplicates_give_up_after_three_attempts() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);

    env.store.force_insert_duplicates(3);
    let result = env
        .service
        .create(new_booking(property.id, "2025-06-01", "2025-06-04"))
        .await;

    assert!(matches!(
        result,
        Err(BookingError::GenerationExhausted { attempts: 3 })
    ));
    assert!(env.store.snapshot().is_empty());
    assert!(env.notifier.sent().is_empty());
}

#[tokio::test]
async fn list_filters_searches_and_paginates() {
    let env = test_env();
    let property = env.catalog.add_property(10_000);
    let other = env.catalog.add_property(10_000);

    let mut ids = Vec::new();
    for day in 1..=5 {
        let mut input = new_booking(
            property.id,
            &format!("2025-07-{:02}", day * 2),
            &format!("2025-07-{:02}", day * 2 + 1),
        );
        input.customer.email = format!("guest{day}@example.com");
        ids.push(env.service.create(input).await.unwrap().id);
    }
    let mut vip = new_booking(other.id, "2025-08-01", "2025-08-03");
    vip.customer.name = "Marta VIP".to_string();
    vip.customer.email = "marta@Example.org".to_string();
    let vip = env.service.create(vip).await.unwrap();
    env.service
        .update_status(ids[0], BookingStatus::Confirmed)
        .await
        .unwrap();

    let all = env
        .service
        .list(&BookingFilter::default(), PageRequest::new(Some(1), Some(4)))
        .await
        .unwrap();
    assert_eq!(all.items.len(), 4);
    assert_eq!(all.pagination.total, 6);
    assert_eq!(all.pagination.pages, 2);

    let second_page = env
        .service
        .list(&BookingFilter::default(), PageRequest::new(Some(2), Some(4)))
        .await
        .unwrap();
    assert_eq!(second_page.items.len(), 2);

    let by_email = env
        .service
        .list(
            &BookingFilter::default().with_search("EXAMPLE.ORG"),
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_email.items.len(), 1);
    assert_eq!(by_email.items[0].id, vip.id);

    let by_number = env
        .service
        .list(
            &BookingFilter::default().with_search(vip.booking_number.as_str().to_lowercase()),
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_number.pagination.total, 1);

    let confirmed = env
        .service
        .list(
            &BookingFilter {
                status: Some(BookingStatus::Confirmed),
                ..BookingFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(confirmed.items.len(), 1);
    assert_eq!(confirmed.items[0].id, ids[0]);

    let for_other = env
        .service
        .list(
            &BookingFilter {
                property_id: Some(other.id),
                payment_status: Some(PaymentStatus::Pending),
                ..BookingFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(for_other.items.len(), 1);
}
