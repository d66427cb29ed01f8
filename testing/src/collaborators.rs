//! In-memory property catalog and notifiers.

use booking_core::{
    Booking, BookingId, BookingNotifier, Money, NotificationKind, NotifyError, Property,
    PropertyCatalog, PropertyId, StoreError,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory [`PropertyCatalog`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPropertyCatalog {
    properties: Arc<Mutex<HashMap<PropertyId, Property>>>,
}

impl InMemoryPropertyCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a property.
    pub fn insert(&self, property: Property) {
        if let Ok(mut properties) = self.properties.lock() {
            properties.insert(property.id, property);
        }
    }

    /// Adds a property with a fresh id at `nightly_price_cents` per night.
    #[must_use]
    pub fn add_property(&self, nightly_price_cents: u64) -> Property {
        let property = Property {
            id: PropertyId::new(),
            title: "Seaside Loft".to_string(),
            nightly_price: Money::from_cents(nightly_price_cents),
        };
        self.insert(property.clone());
        property
    }
}

impl PropertyCatalog for InMemoryPropertyCatalog {
    fn get_by_id(
        &self,
        id: PropertyId,
    ) -> impl Future<Output = Result<Option<Property>, StoreError>> + Send {
        let properties = Arc::clone(&self.properties);

        async move {
            Ok(properties
                .lock()
                .map_err(|_| StoreError::Database("catalog lock poisoned".to_string()))?
                .get(&id)
                .cloned())
        }
    }
}

/// Records every notification it is asked to send. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(NotificationKind, BookingId)>>>,
}

impl RecordingNotifier {
    /// Create a notifier with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<(NotificationKind, BookingId)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Kinds sent for one booking, oldest first.
    #[must_use]
    pub fn kinds_for(&self, id: BookingId) -> Vec<NotificationKind> {
        self.sent()
            .into_iter()
            .filter(|(_, booking_id)| *booking_id == id)
            .map(|(kind, _)| kind)
            .collect()
    }
}

impl BookingNotifier for RecordingNotifier {
    fn notify(
        &self,
        kind: NotificationKind,
        booking: &Booking,
        _property: &Property,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send {
        let sent = Arc::clone(&self.sent);
        let id = booking.id;

        async move {
            sent.lock()
                .map_err(|_| NotifyError("notifier lock poisoned".to_string()))?
                .push((kind, id));
            Ok(())
        }
    }
}

/// Fails every notification and counts the attempts.
#[derive(Debug, Clone, Default)]
pub struct FailingNotifier {
    attempts: Arc<AtomicUsize>,
}

impl FailingNotifier {
    /// Create a notifier that always fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notifications attempted.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl BookingNotifier for FailingNotifier {
    fn notify(
        &self,
        kind: NotificationKind,
        _booking: &Booking,
        _property: &Property,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        async move { Err(NotifyError(format!("mail relay unreachable for {kind}"))) }
    }
}
