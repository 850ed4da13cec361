//! Booking rules that vary by deployment.

use crate::error::BookingError;
use deskbook_core::seat::{SeatCatalog, SeatId, SeatPolicy};
use serde::{Deserialize, Serialize};

/// Default number of dates the availability scan looks at.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// How contact handles on new bookings are validated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactHandlePolicy {
    /// Store whatever was supplied, including an empty handle.
    Optional,
    /// The handle must contain `@`.
    #[default]
    RequireAt,
}

impl ContactHandlePolicy {
    /// Validate a handle under this policy.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidContactHandle`] if the policy requires an
    /// `@` and the handle has none.
    pub fn check(self, handle: &str) -> Result<(), BookingError> {
        match self {
            Self::RequireAt if !handle.contains('@') => Err(BookingError::InvalidContactHandle {
                handle: handle.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Rules applied uniformly by the booking engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPolicy {
    /// Whether seats outside the catalog may be booked.
    pub seats: SeatPolicy,
    /// Contact handle validation.
    pub contact_handles: ContactHandlePolicy,
    /// Number of consecutive dates (starting today) the availability scan covers.
    pub horizon_days: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            seats: SeatPolicy::default(),
            contact_handles: ContactHandlePolicy::default(),
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl BookingPolicy {
    /// Normalize a seat token and apply the seat policy against `catalog`.
    ///
    /// Under [`SeatPolicy::Unrestricted`] an unknown seat is accepted and
    /// logged, so operators can spot typos without blocking anyone.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::UnknownSeat`] for a blank token, or for a seat
    /// outside the catalog under [`SeatPolicy::CatalogOnly`].
    pub fn admit_seat(&self, catalog: &SeatCatalog, token: &str) -> Result<SeatId, BookingError> {
        let seat = SeatId::parse(token).ok_or_else(|| BookingError::UnknownSeat {
            seat: token.to_string(),
        })?;

        if catalog.contains(&seat) {
            return Ok(seat);
        }

        match self.seats {
            SeatPolicy::CatalogOnly => Err(BookingError::UnknownSeat {
                seat: seat.as_str().to_string(),
            }),
            SeatPolicy::Unrestricted => {
                tracing::warn!(%seat, "Booking a seat that is not in the catalog");
                Ok(seat)
            }
        }
    }
}
