//! `SQLite` reservation store for the desk booking service.
//!
//! This crate provides the durable [`ReservationStore`] implementation. It
//! uses sqlx with a connection pool and supports:
//!
//! - Persistence across process restarts (a single local database file)
//! - `(date, seat)` uniqueness enforced by a unique index, so a lost race
//!   surfaces as [`StoreError::Conflict`] instead of a double booking
//! - In-place migration of databases written by earlier releases
//!
//! Every operation borrows a pooled connection for its own duration only;
//! there is no long-lived cursor shared between requests.
//!
//! # Example
//!
//! ```no_run
//! use deskbook_sqlite::SqliteReservationStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteReservationStore::connect("sqlite://bookings.db", 5).await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod schema;

use chrono::NaiveDate;
use deskbook_core::date::iso_week;
use deskbook_core::identity::Identity;
use deskbook_core::reservation::Reservation;
use deskbook_core::seat::SeatId;
use deskbook_core::store::{ReservationStore, StoreError};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

const SELECT_BOOKINGS: &str = r"
    SELECT CAST(user_id AS TEXT) AS user_id,
           COALESCE(username, '') AS username,
           COALESCE(name, '') AS name,
           date,
           place,
           COALESCE(guest_of, 0) AS guest_of,
           week,
           COALESCE(tg, '') AS tg
    FROM bookings
";

/// One row of the `bookings` table.
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    user_id: String,
    username: String,
    name: String,
    date: NaiveDate,
    place: String,
    guest_of: i64,
    week: Option<i64>,
    tg: String,
}

impl TryFrom<BookingRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let seat = SeatId::parse(&row.place).ok_or_else(|| {
            StoreError::CorruptRecord(format!("blank seat for {} on {}", row.user_id, row.date))
        })?;
        let week_number = row
            .week
            .and_then(|w| u32::try_from(w).ok())
            .unwrap_or_else(|| iso_week(row.date));

        Ok(Self {
            holder_identity: Identity::new(row.user_id),
            holder_username: row.username,
            holder_display_name: row.name,
            contact_handle: row.tg,
            date: row.date,
            seat,
            is_proxy: row.guest_of != 0,
            week_number,
        })
    }
}

fn database_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::Database(format!("{context}: {e}"))
}

fn into_reservations(rows: Vec<BookingRow>) -> Result<Vec<Reservation>, StoreError> {
    rows.into_iter().map(Reservation::try_from).collect()
}

/// `SQLite`-backed reservation store.
///
/// Cheap to clone; clones share the same pool.
#[derive(Clone, Debug)]
pub struct SqliteReservationStore {
    pool: SqlitePool,
}

impl SqliteReservationStore {
    /// Connect to the database at `url`, creating the file if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the URL is invalid or the
    /// connection cannot be established.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(database_error("Invalid database URL"))?
            .create_if_missing(true);
        Self::connect_with(options, max_connections).await
    }

    /// Connect with explicit connect options.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection cannot be established.
    pub async fn connect_with(options: SqliteConnectOptions, max_connections: u32) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(database_error("Failed to open database"))?;
        tracing::debug!(max_connections, "Opened SQLite pool");
        Ok(Self { pool })
    }

    /// Open a private in-memory database, already migrated.
    ///
    /// The pool is pinned to one connection that never expires, since every
    /// in-memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or migrated.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(database_error("Failed to open in-memory database"))?;
        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the schema up to date. Safe to call on every start.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Migration`] if the schema cannot be migrated.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        schema::migrate(&self.pool).await
    }

    /// Total number of stored reservations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await
            .map_err(database_error("Failed to count bookings"))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Close every pooled connection, waiting for in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl ReservationStore for SqliteReservationStore {
    async fn find_by_seat_and_date(
        &self,
        date: NaiveDate,
        seat: &SeatId,
    ) -> Result<Option<Reservation>, StoreError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("{SELECT_BOOKINGS} WHERE date = ? AND place = ?"))
                .bind(date)
                .bind(seat.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error("Failed to query seat"))?;

        row.map(Reservation::try_from).transpose()
    }

    async fn find_by_identity_and_date(
        &self,
        identity: &Identity,
        date: NaiveDate,
    ) -> Result<Option<Reservation>, StoreError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("{SELECT_BOOKINGS} WHERE user_id = ? AND date = ? LIMIT 1"))
                .bind(identity.as_str())
                .bind(date)
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error("Failed to query holder"))?;

        row.map(Reservation::try_from).transpose()
    }

    async fn find(
        &self,
        identity: &Identity,
        date: NaiveDate,
        seat: &SeatId,
    ) -> Result<Option<Reservation>, StoreError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "{SELECT_BOOKINGS} WHERE user_id = ? AND date = ? AND place = ?"
        ))
        .bind(identity.as_str())
        .bind(date)
        .bind(seat.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("Failed to query reservation"))?;

        row.map(Reservation::try_from).transpose()
    }

    async fn list_by_identity(&self, identity: &Identity) -> Result<Vec<Reservation>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!("{SELECT_BOOKINGS} WHERE user_id = ?"))
            .bind(identity.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(database_error("Failed to list reservations by holder"))?;

        into_reservations(rows)
    }

    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Reservation>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!("{SELECT_BOOKINGS} WHERE date = ?"))
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(database_error("Failed to list reservations by date"))?;

        into_reservations(rows)
    }

    #[tracing::instrument(skip(self, reservation), fields(date = %reservation.date, seat = %reservation.seat))]
    async fn insert(&self, reservation: Reservation) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO bookings (user_id, username, name, date, place, guest_of, week, tg)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(reservation.holder_identity.as_str())
        .bind(reservation.holder_username.as_str())
        .bind(reservation.holder_display_name.as_str())
        .bind(reservation.date)
        .bind(reservation.seat.as_str())
        .bind(i64::from(reservation.is_proxy))
        .bind(i64::from(reservation.week_number))
        .bind(reservation.contact_handle.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return StoreError::Conflict {
                        date: reservation.date,
                        seat: reservation.seat.clone(),
                    };
                }
            }
            StoreError::Database(format!("Failed to insert reservation: {e}"))
        })?;

        tracing::debug!("Reservation stored");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, identity: &Identity, date: NaiveDate, seat: &SeatId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM bookings WHERE user_id = ? AND date = ? AND place = ?")
            .bind(identity.as_str())
            .bind(date)
            .bind(seat.as_str())
            .execute(&self.pool)
            .await
            .map_err(database_error("Failed to delete reservation"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                identity: identity.clone(),
                date,
                seat: seat.clone(),
            });
        }

        tracing::debug!("Reservation deleted");
        Ok(())
    }
}
