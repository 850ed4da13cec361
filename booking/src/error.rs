//! Domain errors returned by the booking engine.

use chrono::NaiveDate;
use deskbook_core::date::DateError;
use deskbook_core::seat::SeatId;
use deskbook_core::store::StoreError;
use thiserror::Error;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Every way a booking request can be rejected.
///
/// All variants are recoverable at the request level: the caller is told the
/// reason and may resubmit. Storage-level conflict and not-found signals are
/// translated into `SeatTaken` / `NoSuchBooking` before they get here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// The date token was malformed, impossible, or in the past.
    #[error(transparent)]
    Date(#[from] DateError),

    /// The contact handle does not look like a handle (no `@`).
    #[error("Contact handle must contain '@', got {handle:?}")]
    InvalidContactHandle {
        /// The rejected handle.
        handle: String,
    },

    /// Someone already holds the seat on that date.
    #[error("Seat {seat} is already taken on {date}")]
    SeatTaken {
        /// Requested date.
        date: NaiveDate,
        /// Requested seat.
        seat: SeatId,
    },

    /// The actor already holds a seat on that date.
    #[error("Already booked seat {existing_seat} on {date}")]
    DuplicateBookingForDate {
        /// Requested date.
        date: NaiveDate,
        /// The seat the actor already holds.
        existing_seat: SeatId,
    },

    /// No matching reservation to cancel.
    #[error("No booking of seat {seat} on {date}")]
    NoSuchBooking {
        /// Requested date.
        date: NaiveDate,
        /// Requested seat.
        seat: SeatId,
    },

    /// The seat is not in the catalog (or the token was blank).
    #[error("Unknown seat {seat:?}")]
    UnknownSeat {
        /// The seat as supplied (uppercased when non-blank).
        seat: String,
    },

    /// The store failed for a reason other than a conflict.
    #[error("Storage unavailable: {0}")]
    Storage(String),
}

impl BookingError {
    /// Short, stable label for metrics and logs.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::Date(DateError::MalformedDate) => "malformed_date",
            Self::Date(DateError::InvalidCalendarDate) => "invalid_calendar_date",
            Self::Date(DateError::PastDate) => "past_date",
            Self::InvalidContactHandle { .. } => "invalid_contact_handle",
            Self::SeatTaken { .. } => "seat_taken",
            Self::DuplicateBookingForDate { .. } => "duplicate_booking_for_date",
            Self::NoSuchBooking { .. } => "no_such_booking",
            Self::UnknownSeat { .. } => "unknown_seat",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict { date, seat } => Self::SeatTaken { date, seat },
            StoreError::NotFound { date, seat, .. } => Self::NoSuchBooking { date, seat },
            other => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use deskbook_core::identity::Identity;

    fn seat(token: &str) -> SeatId {
        SeatId::parse(token).unwrap()
    }

    #[test]
    fn store_conflict_becomes_seat_taken() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let error = BookingError::from(StoreError::Conflict {
            date,
            seat: seat("A1"),
        });
        assert_eq!(error, BookingError::SeatTaken { date, seat: seat("A1") });
    }

    #[test]
    fn store_not_found_becomes_no_such_booking() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let error = BookingError::from(StoreError::NotFound {
            identity: Identity::from(1),
            date,
            seat: seat("A1"),
        });
        assert_eq!(error.reason_code(), "no_such_booking");
    }

    #[test]
    fn database_failures_stay_internal() {
        let error = BookingError::from(StoreError::Database("locked".to_string()));
        assert!(matches!(error, BookingError::Storage(ref m) if m.contains("locked")));
    }
}
