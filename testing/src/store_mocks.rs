//! In-memory reservation store for fast, deterministic testing.

use chrono::NaiveDate;
use deskbook_core::identity::Identity;
use deskbook_core::reservation::Reservation;
use deskbook_core::seat::SeatId;
use deskbook_core::store::{ReservationStore, StoreError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

type Key = (Identity, NaiveDate, SeatId);

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<Key, Reservation>,
    next_insert_failure: Option<StoreError>,
}

/// `HashMap`-backed [`ReservationStore`].
///
/// Enforces the same `(date, seat)` uniqueness as the durable store. Clones
/// share the same underlying map, so a test can keep a handle for
/// assertions while the engine owns another.
///
/// # Example
///
/// ```
/// use deskbook_core::{Identity, Reservation, ReservationStore};
/// use deskbook_testing::{day, seat, InMemoryReservationStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryReservationStore::new();
/// store.insert(Reservation::new(Identity::from(1), day(2025, 6, 10), seat("A1"))).await?;
/// assert_eq!(store.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryReservationStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryReservationStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reservations
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map_or(0, |inner| inner.records.len())
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored reservation, ordered by date then seat.
    #[must_use]
    pub fn all(&self) -> Vec<Reservation> {
        let mut all: Vec<Reservation> = self
            .inner
            .lock()
            .map(|inner| inner.records.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by(|a, b| (a.date, &a.seat).cmp(&(b.date, &b.seat)));
        all
    }

    /// Make the next `insert` fail with `error` without touching the map.
    ///
    /// Simulates a concurrent writer winning the race between the engine's
    /// lookups and its insert, or a storage outage.
    pub fn fail_next_insert(&self, error: StoreError) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.next_insert_failure = Some(error);
        }
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Database("in-memory store lock poisoned".to_string()))?;
        f(&mut inner)
    }

    fn select(&self, predicate: impl Fn(&Reservation) -> bool) -> Result<Vec<Reservation>, StoreError> {
        self.with_inner(|inner| {
            Ok(inner
                .records
                .values()
                .filter(|r| predicate(r))
                .cloned()
                .collect())
        })
    }
}

impl ReservationStore for InMemoryReservationStore {
    fn find_by_seat_and_date(
        &self,
        date: NaiveDate,
        seat: &SeatId,
    ) -> impl Future<Output = Result<Option<Reservation>, StoreError>> + Send {
        let found = self
            .select(|r| r.date == date && &r.seat == seat)
            .map(|rows| rows.into_iter().next());
        async move { found }
    }

    fn find_by_identity_and_date(
        &self,
        identity: &Identity,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<Reservation>, StoreError>> + Send {
        let found = self
            .select(|r| r.date == date && &r.holder_identity == identity)
            .map(|rows| rows.into_iter().next());
        async move { found }
    }

    fn find(
        &self,
        identity: &Identity,
        date: NaiveDate,
        seat: &SeatId,
    ) -> impl Future<Output = Result<Option<Reservation>, StoreError>> + Send {
        let key = (identity.clone(), date, seat.clone());
        let found = self.with_inner(|inner| Ok(inner.records.get(&key).cloned()));
        async move { found }
    }

    fn list_by_identity(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Vec<Reservation>, StoreError>> + Send {
        let rows = self.select(|r| &r.holder_identity == identity);
        async move { rows }
    }

    fn list_by_date(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Reservation>, StoreError>> + Send {
        let rows = self.select(|r| r.date == date);
        async move { rows }
    }

    fn insert(&self, reservation: Reservation) -> impl Future<Output = Result<(), StoreError>> + Send {
        let result = self.with_inner(|inner| {
            if let Some(error) = inner.next_insert_failure.take() {
                return Err(error);
            }

            let taken = inner
                .records
                .values()
                .any(|r| r.date == reservation.date && r.seat == reservation.seat);
            if taken {
                return Err(StoreError::Conflict {
                    date: reservation.date,
                    seat: reservation.seat,
                });
            }

            let key = (
                reservation.holder_identity.clone(),
                reservation.date,
                reservation.seat.clone(),
            );
            inner.records.insert(key, reservation);
            Ok(())
        });
        async move { result }
    }

    fn delete(
        &self,
        identity: &Identity,
        date: NaiveDate,
        seat: &SeatId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let key = (identity.clone(), date, seat.clone());
        let result = self.with_inner(|inner| match inner.records.remove(&key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                identity: key.0.clone(),
                date: key.1,
                seat: key.2.clone(),
            }),
        });
        async move { result }
    }
}
