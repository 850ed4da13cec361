//! Reservation store trait and related types.
//!
//! This module defines the storage contract for reservations. The store
//! exclusively owns every [`Reservation`]; callers only ever see transient
//! query results.
//!
//! # Invariants
//!
//! - `(date, seat)` is unique: [`ReservationStore::insert`] fails with
//!   [`StoreError::Conflict`] when the seat is already held on that date.
//! - Records are keyed by `(holder_identity, date, seat)`; delete uses the
//!   full key.
//!
//! # Implementations
//!
//! - `SqliteReservationStore` (in `deskbook-sqlite`): durable storage
//! - `InMemoryReservationStore` (in `deskbook-testing`): fast, deterministic tests
//!
//! # Example
//!
//! ```no_run
//! use deskbook_core::store::{ReservationStore, StoreError};
//! use deskbook_core::Reservation;
//!
//! async fn book<S: ReservationStore>(store: &S, reservation: Reservation) -> Result<(), StoreError> {
//!     if store
//!         .find_by_seat_and_date(reservation.date, &reservation.seat)
//!         .await?
//!         .is_some()
//!     {
//!         return Err(StoreError::Conflict {
//!             date: reservation.date,
//!             seat: reservation.seat,
//!         });
//!     }
//!     store.insert(reservation).await
//! }
//! ```

use crate::identity::Identity;
use crate::reservation::Reservation;
use crate::seat::SeatId;
use chrono::NaiveDate;
use std::future::Future;
use thiserror::Error;

/// Errors that can occur during store operations.
///
/// `Conflict` and `NotFound` are internal signals; the booking engine
/// translates them into domain errors before they reach a caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The seat is already held on that date.
    #[error("Seat {seat} is already reserved on {date}")]
    Conflict {
        /// The contested date.
        date: NaiveDate,
        /// The contested seat.
        seat: SeatId,
    },

    /// No reservation matches the `(identity, date, seat)` key.
    #[error("No reservation for {identity} on {date} at {seat}")]
    NotFound {
        /// Holder identity looked up.
        identity: Identity,
        /// Date looked up.
        date: NaiveDate,
        /// Seat looked up.
        seat: SeatId,
    },

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// Schema migration error.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored row could not be decoded into a reservation.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// Storage abstraction for reservations.
///
/// Each operation is atomic with respect to the `(date, seat)` uniqueness
/// invariant. Implementations must be `Send + Sync` so a single handle can be
/// shared by concurrent requests.
pub trait ReservationStore: Send + Sync {
    /// Reservation holding `seat` on `date`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    fn find_by_seat_and_date(
        &self,
        date: NaiveDate,
        seat: &SeatId,
    ) -> impl Future<Output = Result<Option<Reservation>, StoreError>> + Send;

    /// Reservation held by `identity` on `date`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    fn find_by_identity_and_date(
        &self,
        identity: &Identity,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<Reservation>, StoreError>> + Send;

    /// Reservation under the full `(identity, date, seat)` key, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    fn find(
        &self,
        identity: &Identity,
        date: NaiveDate,
        seat: &SeatId,
    ) -> impl Future<Output = Result<Option<Reservation>, StoreError>> + Send;

    /// All reservations held by `identity`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    fn list_by_identity(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Vec<Reservation>, StoreError>> + Send;

    /// All reservations on `date`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    fn list_by_date(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Reservation>, StoreError>> + Send;

    /// Persist a new reservation.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Conflict`] if `(date, seat)` is already present
    /// - [`StoreError::Database`] if the write fails
    fn insert(&self, reservation: Reservation) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete the reservation under `(identity, date, seat)`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no such reservation exists
    /// - [`StoreError::Database`] if the write fails
    fn delete(
        &self,
        identity: &Identity,
        date: NaiveDate,
        seat: &SeatId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
