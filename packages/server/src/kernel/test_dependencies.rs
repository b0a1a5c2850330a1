// TestDependencies - mock implementations for testing
//
// Provides scripted geocoders and in-memory stores that can be injected into
// ServerDeps for tests. Every mock records what it was asked to do.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    BaseEventStore, BaseGeocoder, BasePaymentStore, CoordinateResolver, ServerDeps,
    DEFAULT_SETTLEMENT_DELAY,
};
use crate::common::utils::{CallerTag, Coordinates};
use crate::common::{EventId, MemberId, PaymentId};
use crate::domains::events::models::{EventLocation, Membership};
use crate::domains::payments::models::{Payment, PaymentStatus};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Mock Geocoder
// =============================================================================

/// Geocoder answering from a script; an empty script fails every call.
pub struct MockGeocoder {
    name: &'static str,
    script: Mutex<VecDeque<Result<Coordinates, String>>>,
    calls: Mutex<Vec<(String, CallerTag)>>,
}

impl MockGeocoder {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_result(self, result: Result<Coordinates, String>) -> Self {
        self.push_result(result);
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.push_result(Err(message.to_string()));
        self
    }

    pub fn push_result(&self, result: Result<Coordinates, String>) {
        lock(&self.script).push_back(result);
    }

    pub fn fail_times(&self, times: usize, message: &str) {
        let mut script = lock(&self.script);
        for _ in 0..times {
            script.push_back(Err(message.to_string()));
        }
    }

    pub fn calls(&self) -> Vec<(String, CallerTag)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl BaseGeocoder for MockGeocoder {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn geocode(&self, address: &str, caller: CallerTag) -> Result<Coordinates> {
        lock(&self.calls).push((address.to_string(), caller));
        match lock(&self.script).pop_front() {
            Some(Ok(coordinates)) => Ok(coordinates),
            Some(Err(message)) => Err(anyhow!(message)),
            None => bail!("no scripted response"),
        }
    }
}

// =============================================================================
// In-memory Event Store
// =============================================================================

#[derive(Debug, Clone)]
struct StoredEvent {
    location: EventLocation,
    membership: Membership,
    paid_user_ids: Vec<MemberId>,
    ends_at: Option<DateTime<Utc>>,
    deleted: bool,
}

#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<HashMap<EventId, StoredEvent>>,
    coordinate_writes: Mutex<Vec<(EventId, Coordinates)>>,
    failing_coordinate_writes: Mutex<usize>,
    failing_sweep_loads: Mutex<usize>,
    /// Simulated concurrent writers: each one bumps the version before a persist
    concurrent_writers: Mutex<usize>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an active event with unlimited capacity, eligible for a coordinate lookup
    pub fn insert_event(&self, address: &str, coordinates: Option<Coordinates>) -> EventId {
        let id = EventId::new();
        let location = EventLocation {
            id,
            address: address.to_string(),
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            coordinates_recheck_after: Utc::now() - ChronoDuration::minutes(1),
        };
        let membership = Membership {
            event_id: id,
            capacity: None,
            busy: 0,
            participant_ids: Vec::new(),
            version: 0,
        };
        lock(&self.events).insert(
            id,
            StoredEvent {
                location,
                membership,
                paid_user_ids: Vec::new(),
                ends_at: None,
                deleted: false,
            },
        );
        id
    }

    pub fn set_capacity(&self, event_id: EventId, capacity: Option<i32>) {
        if let Some(event) = lock(&self.events).get_mut(&event_id) {
            event.membership.capacity = capacity;
        }
    }

    pub fn end_event(&self, event_id: EventId) {
        if let Some(event) = lock(&self.events).get_mut(&event_id) {
            event.ends_at = Some(Utc::now() - ChronoDuration::hours(1));
        }
    }

    pub fn delete_event(&self, event_id: EventId) {
        if let Some(event) = lock(&self.events).get_mut(&event_id) {
            event.deleted = true;
        }
    }

    pub fn delay_recheck(&self, event_id: EventId, until: DateTime<Utc>) {
        if let Some(event) = lock(&self.events).get_mut(&event_id) {
            event.location.coordinates_recheck_after = until;
        }
    }

    pub fn fail_coordinate_writes(&self, times: usize) {
        *lock(&self.failing_coordinate_writes) = times;
    }

    pub fn fail_sweep_loads(&self, times: usize) {
        *lock(&self.failing_sweep_loads) = times;
    }

    pub fn simulate_concurrent_writers(&self, writers: usize) {
        *lock(&self.concurrent_writers) = writers;
    }

    /// Successful coordinate writes, in order
    pub fn coordinate_writes(&self) -> Vec<(EventId, Coordinates)> {
        lock(&self.coordinate_writes).clone()
    }

    pub fn membership(&self, event_id: EventId) -> Option<Membership> {
        lock(&self.events)
            .get(&event_id)
            .map(|event| event.membership.clone())
    }

    pub fn paid_users(&self, event_id: EventId) -> Vec<MemberId> {
        lock(&self.events)
            .get(&event_id)
            .map(|event| event.paid_user_ids.clone())
            .unwrap_or_default()
    }

    fn take_failure(counter: &Mutex<usize>) -> bool {
        let mut remaining = lock(counter);
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl BaseEventStore for InMemoryEventStore {
    async fn find_active_missing_coordinates(&self) -> Result<Vec<EventLocation>> {
        if Self::take_failure(&self.failing_sweep_loads) {
            bail!("simulated load failure");
        }
        let now = Utc::now();
        Ok(lock(&self.events)
            .values()
            .filter(|event| !event.deleted)
            .filter(|event| event.ends_at.map_or(true, |ends_at| ends_at > now))
            .filter(|event| event.location.needs_coordinates())
            .map(|event| event.location.clone())
            .collect())
    }

    async fn set_coordinates(&self, event_id: EventId, coordinates: Coordinates) -> Result<()> {
        if Self::take_failure(&self.failing_coordinate_writes) {
            bail!("simulated write failure");
        }
        let mut events = lock(&self.events);
        let event = events
            .get_mut(&event_id)
            .ok_or_else(|| anyhow!("event {} not found", event_id))?;
        event.location.latitude = Some(coordinates.latitude);
        event.location.longitude = Some(coordinates.longitude);
        lock(&self.coordinate_writes).push((event_id, coordinates));
        Ok(())
    }

    async fn find_location(&self, event_id: EventId) -> Result<Option<EventLocation>> {
        Ok(lock(&self.events)
            .get(&event_id)
            .filter(|event| !event.deleted)
            .map(|event| event.location.clone()))
    }

    async fn load_membership(&self, event_id: EventId) -> Result<Option<Membership>> {
        Ok(lock(&self.events)
            .get(&event_id)
            .filter(|event| !event.deleted)
            .map(|event| event.membership.clone()))
    }

    async fn persist_membership(&self, membership: &Membership) -> Result<bool> {
        let mut events = lock(&self.events);
        let Some(event) = events.get_mut(&membership.event_id).filter(|e| !e.deleted) else {
            return Ok(false);
        };

        if Self::take_failure(&self.concurrent_writers) {
            event.membership.version += 1;
        }

        if event.membership.version != membership.version {
            return Ok(false);
        }
        event.membership = Membership {
            version: membership.version + 1,
            ..membership.clone()
        };
        Ok(true)
    }

    async fn add_paid_user(&self, event_id: EventId, user_id: MemberId) -> Result<()> {
        let mut events = lock(&self.events);
        let event = events
            .get_mut(&event_id)
            .ok_or_else(|| anyhow!("event {} not found", event_id))?;
        if !event.paid_user_ids.contains(&user_id) {
            event.paid_user_ids.push(user_id);
        }
        Ok(())
    }
}

// =============================================================================
// In-memory Payment Store
// =============================================================================

#[derive(Default)]
pub struct InMemoryPaymentStore {
    payments: Mutex<HashMap<PaymentId, Payment>>,
    failing_status_updates: Mutex<usize>,
    status_updates: Mutex<usize>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_pending(&self, event_id: EventId, user_id: MemberId) -> PaymentId {
        self.insert(event_id, user_id, PaymentStatus::Pending)
    }

    pub fn insert(&self, event_id: EventId, user_id: MemberId, status: PaymentStatus) -> PaymentId {
        let id = PaymentId::new();
        lock(&self.payments).insert(
            id,
            Payment {
                id,
                event_id,
                user_id,
                status,
                amount: 50_000,
                confirmation_url: Some(format!("https://pay.example/confirm/{}", id)),
            },
        );
        id
    }

    pub fn status(&self, payment_id: PaymentId) -> Option<PaymentStatus> {
        lock(&self.payments).get(&payment_id).map(|p| p.status)
    }

    pub fn fail_status_updates(&self, times: usize) {
        *lock(&self.failing_status_updates) = times;
    }

    /// Number of successful status writes
    pub fn status_update_count(&self) -> usize {
        *lock(&self.status_updates)
    }
}

#[async_trait]
impl BasePaymentStore for InMemoryPaymentStore {
    async fn find_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>> {
        Ok(lock(&self.payments).get(&payment_id).cloned())
    }

    async fn update_status(&self, payment_id: PaymentId, status: PaymentStatus) -> Result<()> {
        if InMemoryEventStore::take_failure(&self.failing_status_updates) {
            bail!("simulated status write failure");
        }
        if let Some(payment) = lock(&self.payments).get_mut(&payment_id) {
            payment.status = status;
            *lock(&self.status_updates) += 1;
        }
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub struct TestDependencies {
    pub primary_geocoder: Arc<MockGeocoder>,
    pub secondary_geocoder: Arc<MockGeocoder>,
    pub events: Arc<InMemoryEventStore>,
    pub payments: Arc<InMemoryPaymentStore>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            primary_geocoder: Arc::new(MockGeocoder::new("open map")),
            secondary_geocoder: Arc::new(MockGeocoder::new("yandex")),
            events: Arc::new(InMemoryEventStore::new()),
            payments: Arc::new(InMemoryPaymentStore::new()),
        }
    }

    /// Build ServerDeps over the shared mocks with the default settlement delay
    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.events.clone(),
            self.payments.clone(),
            CoordinateResolver::new(self.primary_geocoder.clone(), self.secondary_geocoder.clone()),
            DEFAULT_SETTLEMENT_DELAY,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
