//! The reservation record.

use crate::date::iso_week;
use crate::identity::Identity;
use crate::seat::SeatId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One occupied seat on one date.
///
/// Reservations are never mutated in place: a cancellation deletes the record.
/// `week_number` is derived from `date` and stored redundantly for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Actor id, or a generated surrogate for proxy bookings
    pub holder_identity: Identity,
    /// Chat username of the holder (may be empty)
    pub holder_username: String,
    /// Display name of the holder (may be empty)
    pub holder_display_name: String,
    /// How to reach the holder, e.g. `@handle` (may be empty)
    pub contact_handle: String,
    /// Booked calendar date
    pub date: NaiveDate,
    /// Booked seat
    pub seat: SeatId,
    /// Booked on behalf of someone else
    pub is_proxy: bool,
    /// ISO week of `date`
    pub week_number: u32,
}

impl Reservation {
    /// Creates a reservation, deriving the week number from the date.
    #[must_use]
    pub fn new(holder_identity: Identity, date: NaiveDate, seat: SeatId) -> Self {
        Self {
            holder_identity,
            holder_username: String::new(),
            holder_display_name: String::new(),
            contact_handle: String::new(),
            date,
            seat,
            is_proxy: false,
            week_number: iso_week(date),
        }
    }

    /// Set the holder's username and display name
    #[must_use]
    pub fn with_holder(mut self, username: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.holder_username = username.into();
        self.holder_display_name = display_name.into();
        self
    }

    /// Set the contact handle
    #[must_use]
    pub fn with_contact(mut self, contact_handle: impl Into<String>) -> Self {
        self.contact_handle = contact_handle.into();
        self
    }

    /// Mark as a proxy booking
    #[must_use]
    pub const fn as_proxy(mut self) -> Self {
        self.is_proxy = true;
        self
    }
}
