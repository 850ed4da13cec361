//! Schema creation and in-place migration of the `bookings` table.
//!
//! Databases written by earlier releases of the bot may still be around:
//!
//! - v0: `user_id INTEGER`, no `tg` column, primary key `(user_id, date, place)`
//! - v1: same, with a nullable `tg` column appended (and, when the column was
//!   added by rebuilding the table, no primary key at all)
//! - v2 (current): `user_id TEXT`, `tg TEXT NOT NULL DEFAULT ''`, primary key
//!   `(user_id, date, place)` and a unique `(date, place)` index
//!
//! Every step below is idempotent and only ever adds or converts. Exact
//! duplicates of the full primary key collapse into one row. Legacy rows the
//! current schema cannot hold (a missing key column, or a second holder of a
//! seat on a date) are moved to `bookings_legacy_conflicts` rather than lost.

use deskbook_core::store::StoreError;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Schema version recorded in `PRAGMA user_version` once migration completes.
pub const SCHEMA_VERSION: i64 = 2;

const CREATE_BOOKINGS: &str = r"
    CREATE TABLE IF NOT EXISTS bookings (
        user_id TEXT NOT NULL,
        username TEXT,
        name TEXT,
        date TEXT NOT NULL,
        place TEXT NOT NULL,
        guest_of INTEGER DEFAULT 0,
        week INTEGER,
        tg TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (user_id, date, place)
    )
";

const CREATE_MIGRATED_BOOKINGS: &str = r"
    CREATE TABLE bookings_migrated (
        user_id TEXT NOT NULL,
        username TEXT,
        name TEXT,
        date TEXT NOT NULL,
        place TEXT NOT NULL,
        guest_of INTEGER DEFAULT 0,
        week INTEGER,
        tg TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (user_id, date, place)
    )
";

const COPY_INTO_MIGRATED: &str = r"
    INSERT OR IGNORE INTO bookings_migrated
        (user_id, username, name, date, place, guest_of, week, tg)
    SELECT CAST(user_id AS TEXT), username, name, date, place, guest_of, week, COALESCE(tg, '')
    FROM bookings
    ORDER BY rowid
";

/// Table holding legacy rows that could not stay in `bookings`.
pub const LEGACY_CONFLICTS_TABLE: &str = "bookings_legacy_conflicts";

const CREATE_LEGACY_CONFLICTS: &str = r"
    CREATE TABLE IF NOT EXISTS bookings_legacy_conflicts (
        user_id TEXT,
        username TEXT,
        name TEXT,
        date TEXT,
        place TEXT,
        guest_of INTEGER,
        week INTEGER,
        tg TEXT,
        reason TEXT NOT NULL
    )
";

const KEYLESS_ROWS: &str = "user_id IS NULL OR date IS NULL OR place IS NULL";

// The earliest written row keeps the seat.
const LOSING_DUPLICATES: &str =
    "rowid NOT IN (SELECT MIN(rowid) FROM bookings GROUP BY date, place)";

const CREATE_SEAT_DATE_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_date_place ON bookings (date, place)";

const CREATE_HOLDER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_bookings_user_date ON bookings (user_id, date)";

fn migration_error(step: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::Migration(format!("{step}: {e}"))
}

/// Bring the `bookings` table to [`SCHEMA_VERSION`].
///
/// Runs inside a single transaction: either every step applies or none does.
///
/// # Errors
///
/// Returns [`StoreError::Migration`] if any step fails.
#[tracing::instrument(skip(pool))]
pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    let mut tx = pool.begin().await.map_err(migration_error("begin"))?;

    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(&mut *tx)
        .await
        .map_err(migration_error("read schema version"))?;

    sqlx::query(CREATE_BOOKINGS)
        .execute(&mut *tx)
        .await
        .map_err(migration_error("create bookings"))?;

    let columns = table_columns(&mut tx).await?;

    if !columns.iter().any(|(name, _)| name == "tg") {
        tracing::info!("Adding contact handle column to bookings");
        sqlx::query("ALTER TABLE bookings ADD COLUMN tg TEXT NOT NULL DEFAULT ''")
            .execute(&mut *tx)
            .await
            .map_err(migration_error("add tg column"))?;
    }

    let user_id_is_integer = columns
        .iter()
        .any(|(name, kind)| name == "user_id" && kind.eq_ignore_ascii_case("INTEGER"));
    if user_id_is_integer {
        rebuild_with_text_identity(&mut tx).await?;
    }

    set_aside_double_bookings(&mut tx).await?;

    sqlx::query(CREATE_SEAT_DATE_INDEX)
        .execute(&mut *tx)
        .await
        .map_err(migration_error("create (date, place) index"))?;
    sqlx::query(CREATE_HOLDER_INDEX)
        .execute(&mut *tx)
        .await
        .map_err(migration_error("create (user_id, date) index"))?;

    // PRAGMA does not accept bound parameters.
    sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
        .execute(&mut *tx)
        .await
        .map_err(migration_error("write schema version"))?;

    tx.commit().await.map_err(migration_error("commit"))?;

    if version != SCHEMA_VERSION {
        tracing::info!(from = version, to = SCHEMA_VERSION, "Bookings schema migrated");
    }
    Ok(())
}

/// Current schema version of the database behind `pool`.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if the pragma cannot be read.
pub async fn schema_version(pool: &SqlitePool) -> Result<i64, StoreError> {
    sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to read schema version: {e}")))
}

async fn table_columns(tx: &mut Transaction<'_, Sqlite>) -> Result<Vec<(String, String)>, StoreError> {
    sqlx::query_as("SELECT name, type FROM pragma_table_info('bookings')")
        .fetch_all(&mut **tx)
        .await
        .map_err(migration_error("inspect bookings columns"))
}

/// Move legacy rows matching `filter` into the conflicts table.
///
/// Returns how many rows were moved.
async fn set_aside(
    tx: &mut Transaction<'_, Sqlite>,
    filter: &str,
    reason: &'static str,
) -> Result<u64, StoreError> {
    sqlx::query(CREATE_LEGACY_CONFLICTS)
        .execute(&mut **tx)
        .await
        .map_err(migration_error("create legacy conflicts table"))?;
    sqlx::query(&format!(
        "INSERT INTO {LEGACY_CONFLICTS_TABLE}
             (user_id, username, name, date, place, guest_of, week, tg, reason)
         SELECT CAST(user_id AS TEXT), username, name, date, place, guest_of, week, tg, ?
         FROM bookings WHERE {filter}"
    ))
    .bind(reason)
    .execute(&mut **tx)
    .await
    .map_err(migration_error("copy rows to legacy conflicts"))?;
    let moved = sqlx::query(&format!("DELETE FROM bookings WHERE {filter}"))
        .execute(&mut **tx)
        .await
        .map_err(migration_error("remove rows set aside"))?
        .rows_affected();
    Ok(moved)
}

/// Convert `user_id` from `INTEGER` to `TEXT`, restoring the primary key.
async fn rebuild_with_text_identity(tx: &mut Transaction<'_, Sqlite>) -> Result<(), StoreError> {
    let keyless = set_aside(tx, KEYLESS_ROWS, "missing_key").await?;
    if keyless > 0 {
        tracing::warn!(
            rows = keyless,
            table = LEGACY_CONFLICTS_TABLE,
            "Bookings without a user, date or seat were set aside"
        );
    }

    let before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(&mut **tx)
        .await
        .map_err(migration_error("count legacy rows"))?;

    sqlx::query("DROP TABLE IF EXISTS bookings_migrated")
        .execute(&mut **tx)
        .await
        .map_err(migration_error("drop stale rebuild table"))?;
    sqlx::query(CREATE_MIGRATED_BOOKINGS)
        .execute(&mut **tx)
        .await
        .map_err(migration_error("create rebuild table"))?;
    sqlx::query(COPY_INTO_MIGRATED)
        .execute(&mut **tx)
        .await
        .map_err(migration_error("copy legacy rows"))?;
    sqlx::query("DROP TABLE bookings")
        .execute(&mut **tx)
        .await
        .map_err(migration_error("drop legacy table"))?;
    sqlx::query("ALTER TABLE bookings_migrated RENAME TO bookings")
        .execute(&mut **tx)
        .await
        .map_err(migration_error("rename rebuild table"))?;

    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(&mut **tx)
        .await
        .map_err(migration_error("count migrated rows"))?;

    if after < before {
        tracing::warn!(
            dropped = before - after,
            "Booking rows sharing a user, date and seat collapsed into one during identity migration"
        );
    }
    tracing::info!(rows = after, "Converted bookings.user_id to text identities");
    Ok(())
}

/// Keep the earliest holder of each seat and date; set the rest aside so the
/// unique `(date, place)` index can be built.
async fn set_aside_double_bookings(tx: &mut Transaction<'_, Sqlite>) -> Result<(), StoreError> {
    let clashes: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT date, place, COUNT(*) FROM bookings
         GROUP BY date, place
         HAVING COUNT(*) > 1
         ORDER BY date, place",
    )
    .fetch_all(&mut **tx)
    .await
    .map_err(migration_error("scan for double bookings"))?;

    if clashes.is_empty() {
        return Ok(());
    }

    let moved = set_aside(tx, LOSING_DUPLICATES, "double_booking").await?;
    for (date, place, count) in &clashes {
        tracing::warn!(
            date = %date,
            place = %place,
            holders = *count,
            table = LEGACY_CONFLICTS_TABLE,
            "Legacy data double-booked a seat; later rows were set aside"
        );
    }
    tracing::warn!(rows = moved, "Double-booked legacy rows set aside");
    Ok(())
}
