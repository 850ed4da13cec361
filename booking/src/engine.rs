//! The booking engine: create, cancel and query reservations.
//!
//! Each operation is independent. Mutations run their read-check-write
//! sequence under a single async write gate, so two requests for the same
//! seat can never both pass the "is it free?" check. The store's own
//! `(date, seat)` uniqueness stays in place underneath as the last line of
//! defence; if it fires anyway the request fails with
//! [`BookingError::SeatTaken`].

use crate::error::{BookingError, Result};
use crate::metrics;
use crate::policy::BookingPolicy;
use chrono::{Days, NaiveDate};
use deskbook_core::date::{normalize, parse_date_token};
use deskbook_core::environment::{Clock, IdentityGenerator};
use deskbook_core::identity::Identity;
use deskbook_core::reservation::Reservation;
use deskbook_core::seat::{SeatCatalog, SeatId};
use deskbook_core::store::ReservationStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Someone a booking is made for, when it is not the actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyTarget {
    /// Name shown for the person the seat is held for.
    pub display_name: String,
}

/// A request to reserve a seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Who is asking.
    pub actor: Identity,
    /// The actor's username, stored on self-bookings.
    pub actor_username: String,
    /// The actor's display name, stored on self-bookings.
    pub actor_display_name: String,
    /// Raw `DD.MM.YY` token.
    pub date_token: String,
    /// Raw seat token, any case.
    pub seat_token: String,
    /// How to reach the holder (the target's handle for proxy bookings).
    pub contact_handle: String,
    /// Set when booking on behalf of someone else.
    pub proxy: Option<ProxyTarget>,
}

impl BookingRequest {
    /// A self-booking request.
    pub fn new(
        actor: Identity,
        date_token: impl Into<String>,
        seat_token: impl Into<String>,
        contact_handle: impl Into<String>,
    ) -> Self {
        Self {
            actor,
            actor_username: String::new(),
            actor_display_name: String::new(),
            date_token: date_token.into(),
            seat_token: seat_token.into(),
            contact_handle: contact_handle.into(),
            proxy: None,
        }
    }

    /// Attach the actor's username and display name.
    #[must_use]
    pub fn with_actor_names(mut self, username: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.actor_username = username.into();
        self.actor_display_name = display_name.into();
        self
    }

    /// Turn this into a booking on behalf of `display_name`.
    #[must_use]
    pub fn on_behalf_of(mut self, display_name: impl Into<String>) -> Self {
        self.proxy = Some(ProxyTarget {
            display_name: display_name.into(),
        });
        self
    }
}

/// A successful booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    /// Canonical date.
    pub date: NaiveDate,
    /// Normalized seat.
    pub seat: SeatId,
    /// Identity the reservation is keyed under (a fresh surrogate for proxy bookings).
    pub holder: Identity,
    /// Whether this was a proxy booking.
    pub is_proxy: bool,
    /// ISO week of `date`.
    pub week_number: u32,
}

/// A reservation that was removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelledBooking {
    /// Canonical date.
    pub date: NaiveDate,
    /// Normalized seat.
    pub seat: SeatId,
    /// Identity the reservation was keyed under.
    pub holder: Identity,
    /// Whether it was a proxy booking.
    pub was_proxy: bool,
}

/// One of the actor's own bookings.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnBooking {
    /// Booked date.
    pub date: NaiveDate,
    /// Booked seat.
    pub seat: SeatId,
}

/// Who sits where on a given date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatOccupancy {
    /// The occupied seat.
    pub seat: SeatId,
    /// The holder's contact handle (may be empty for old records).
    pub contact_handle: String,
    /// The holder's display name (may be empty).
    pub holder_display_name: String,
}

/// The nearest date with at least one free catalog seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// The first date with a free seat.
    pub date: NaiveDate,
    /// Free seats on that date, in catalog order.
    pub free_seats: Vec<SeatId>,
}

/// Orchestrates date normalization, policy checks and persistence.
///
/// Generic over the store, the clock and the surrogate identity generator so
/// tests can pin all three. Share one engine per process behind an `Arc`.
pub struct BookingEngine<S, C, G> {
    store: S,
    clock: C,
    identities: G,
    catalog: SeatCatalog,
    policy: BookingPolicy,
    write_gate: Mutex<()>,
}

impl<S, C, G> BookingEngine<S, C, G>
where
    S: ReservationStore,
    C: Clock,
    G: IdentityGenerator,
{
    /// Create an engine over `store`.
    pub fn new(store: S, clock: C, identities: G, catalog: SeatCatalog, policy: BookingPolicy) -> Self {
        Self {
            store,
            clock,
            identities,
            catalog,
            policy,
            write_gate: Mutex::new(()),
        }
    }

    /// The seat catalog.
    pub const fn catalog(&self) -> &SeatCatalog {
        &self.catalog
    }

    /// The active policy.
    pub const fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Today's date according to the engine's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Reserve a seat for the actor, or for someone else when `request.proxy` is set.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Date`] if the date token is malformed, impossible or past
    /// - [`BookingError::UnknownSeat`] if the seat is blank, or unknown under a catalog-only policy
    /// - [`BookingError::InvalidContactHandle`] if the handle fails the contact policy
    /// - [`BookingError::SeatTaken`] if the seat is already held on that date
    /// - [`BookingError::DuplicateBookingForDate`] if the actor already holds a seat that day
    /// - [`BookingError::Storage`] if the store fails
    #[tracing::instrument(
        skip(self, request),
        fields(actor = %request.actor, date = %request.date_token, seat = %request.seat_token, proxy = request.proxy.is_some())
    )]
    pub async fn create_booking(&self, request: BookingRequest) -> Result<BookingConfirmation> {
        let outcome = self.try_create_booking(request).await;
        match &outcome {
            Ok(confirmation) => {
                metrics::record_booking_created(confirmation.is_proxy);
                tracing::info!(
                    holder = %confirmation.holder,
                    date = %confirmation.date,
                    seat = %confirmation.seat,
                    week = confirmation.week_number,
                    "Seat booked"
                );
            }
            Err(error) => {
                metrics::record_booking_rejected(error.reason_code());
                log_rejection("Booking rejected", error);
            }
        }
        outcome
    }

    async fn try_create_booking(&self, request: BookingRequest) -> Result<BookingConfirmation> {
        let date = normalize(&request.date_token, self.clock.today())?;
        let seat = self.policy.admit_seat(&self.catalog, &request.seat_token)?;
        self.policy.contact_handles.check(&request.contact_handle)?;

        let _gate = self.write_gate.lock().await;

        if self.store.find_by_seat_and_date(date, &seat).await?.is_some() {
            return Err(BookingError::SeatTaken { date, seat });
        }

        // Proxy bookings are checked against the actor too.
        if let Some(existing) = self.store.find_by_identity_and_date(&request.actor, date).await? {
            return Err(BookingError::DuplicateBookingForDate {
                date,
                existing_seat: existing.seat,
            });
        }

        let reservation = match request.proxy {
            Some(target) => Reservation::new(self.identities.new_identity(), date, seat)
                .with_holder(String::new(), target.display_name)
                .as_proxy(),
            None => Reservation::new(request.actor, date, seat)
                .with_holder(request.actor_username, request.actor_display_name),
        }
        .with_contact(request.contact_handle);

        let confirmation = BookingConfirmation {
            date: reservation.date,
            seat: reservation.seat.clone(),
            holder: reservation.holder_identity.clone(),
            is_proxy: reservation.is_proxy,
            week_number: reservation.week_number,
        };

        self.store.insert(reservation).await?;
        Ok(confirmation)
    }

    /// Cancel one of the actor's own bookings.
    ///
    /// Only reservations keyed under `actor` can be cancelled here; proxy
    /// bookings are held under a surrogate identity and need
    /// [`cancel_any_booking`](Self::cancel_any_booking).
    ///
    /// # Errors
    ///
    /// - [`BookingError::Date`] if the date token is malformed, impossible or past
    /// - [`BookingError::UnknownSeat`] if the seat token is blank
    /// - [`BookingError::NoSuchBooking`] if the actor holds no such reservation
    /// - [`BookingError::Storage`] if the store fails
    #[tracing::instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn cancel_booking(&self, actor: &Identity, date_token: &str, seat_token: &str) -> Result<CancelledBooking> {
        let outcome = self.try_cancel_booking(actor, date_token, seat_token).await;
        record_cancellation(&outcome, false);
        outcome
    }

    async fn try_cancel_booking(&self, actor: &Identity, date_token: &str, seat_token: &str) -> Result<CancelledBooking> {
        let date = normalize(date_token, self.clock.today())?;
        let seat = parse_seat(seat_token)?;

        let _gate = self.write_gate.lock().await;

        let Some(existing) = self.store.find(actor, date, &seat).await? else {
            return Err(BookingError::NoSuchBooking { date, seat });
        };

        self.store.delete(actor, date, &seat).await?;
        Ok(CancelledBooking {
            date,
            seat,
            holder: existing.holder_identity,
            was_proxy: existing.is_proxy,
        })
    }

    /// Cancel whichever reservation holds `seat` on `date`, proxy bookings included.
    ///
    /// This is a privileged capability; the engine does not authorize the
    /// caller.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Date`] if the date token is malformed, impossible or past
    /// - [`BookingError::UnknownSeat`] if the seat token is blank
    /// - [`BookingError::NoSuchBooking`] if the seat is free on that date
    /// - [`BookingError::Storage`] if the store fails
    #[tracing::instrument(skip(self))]
    pub async fn cancel_any_booking(&self, date_token: &str, seat_token: &str) -> Result<CancelledBooking> {
        let outcome = self.try_cancel_any_booking(date_token, seat_token).await;
        record_cancellation(&outcome, true);
        outcome
    }

    async fn try_cancel_any_booking(&self, date_token: &str, seat_token: &str) -> Result<CancelledBooking> {
        let date = normalize(date_token, self.clock.today())?;
        let seat = parse_seat(seat_token)?;

        let _gate = self.write_gate.lock().await;

        let Some(existing) = self.store.find_by_seat_and_date(date, &seat).await? else {
            return Err(BookingError::NoSuchBooking { date, seat });
        };

        self.store.delete(&existing.holder_identity, date, &seat).await?;
        Ok(CancelledBooking {
            date,
            seat,
            holder: existing.holder_identity,
            was_proxy: existing.is_proxy,
        })
    }

    /// The actor's own bookings, earliest first.
    ///
    /// Past dates are included; nothing is ever purged automatically.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the store fails.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn list_own_bookings(&self, actor: &Identity) -> Result<Vec<OwnBooking>> {
        let mut bookings: Vec<OwnBooking> = self
            .store
            .list_by_identity(actor)
            .await?
            .into_iter()
            .map(|r| OwnBooking {
                date: r.date,
                seat: r.seat,
            })
            .collect();
        bookings.sort();
        tracing::debug!(count = bookings.len(), "Listed own bookings");
        Ok(bookings)
    }

    /// Every occupied seat on a date, ordered by seat.
    ///
    /// Past dates are allowed.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Date`] if the date token is malformed or impossible
    /// - [`BookingError::Storage`] if the store fails
    #[tracing::instrument(skip(self))]
    pub async fn list_bookings_on_date(&self, date_token: &str) -> Result<Vec<SeatOccupancy>> {
        let date = parse_date_token(date_token)?;
        let mut occupancy: Vec<SeatOccupancy> = self
            .store
            .list_by_date(date)
            .await?
            .into_iter()
            .map(|r| SeatOccupancy {
                seat: r.seat,
                contact_handle: r.contact_handle,
                holder_display_name: r.holder_display_name,
            })
            .collect();
        occupancy.sort_by(|a, b| a.seat.cmp(&b.seat));
        tracing::debug!(%date, count = occupancy.len(), "Listed bookings on date");
        Ok(occupancy)
    }

    /// Scan `horizon_days` consecutive dates starting at `from` for the first
    /// one with a free catalog seat.
    ///
    /// `Ok(None)` means every catalog seat is taken on every date in the
    /// window (or the catalog is empty); that is a normal outcome.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the store fails.
    #[tracing::instrument(skip(self))]
    pub async fn find_nearest_availability(&self, from: NaiveDate, horizon_days: u32) -> Result<Option<Availability>> {
        for offset in 0..horizon_days {
            let Some(date) = from.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };

            let taken: HashSet<SeatId> = self
                .store
                .list_by_date(date)
                .await?
                .into_iter()
                .map(|r| r.seat)
                .collect();
            let free_seats: Vec<SeatId> = self
                .catalog
                .iter()
                .filter(|seat| !taken.contains(*seat))
                .cloned()
                .collect();

            if !free_seats.is_empty() {
                metrics::record_availability_scan(Some(offset));
                tracing::debug!(%date, offset, free = free_seats.len(), "Found free seats");
                return Ok(Some(Availability { date, free_seats }));
            }
        }

        metrics::record_availability_scan(None);
        tracing::debug!("No free seats within horizon");
        Ok(None)
    }

    /// [`find_nearest_availability`](Self::find_nearest_availability) from
    /// today over the configured horizon.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the store fails.
    pub async fn nearest_availability(&self) -> Result<Option<Availability>> {
        self.find_nearest_availability(self.clock.today(), self.policy.horizon_days)
            .await
    }
}

fn parse_seat(token: &str) -> Result<SeatId> {
    SeatId::parse(token).ok_or_else(|| BookingError::UnknownSeat {
        seat: token.to_string(),
    })
}

fn record_cancellation(outcome: &Result<CancelledBooking>, administrative: bool) {
    match outcome {
        Ok(cancelled) => {
            metrics::record_booking_cancelled(administrative);
            tracing::info!(
                holder = %cancelled.holder,
                date = %cancelled.date,
                seat = %cancelled.seat,
                proxy = cancelled.was_proxy,
                administrative,
                "Booking cancelled"
            );
        }
        Err(error) => {
            metrics::record_cancellation_rejected(error.reason_code());
            log_rejection("Cancellation rejected", error);
        }
    }
}

fn log_rejection(message: &'static str, error: &BookingError) {
    if let BookingError::Storage(detail) = error {
        tracing::error!(error = %detail, "{message}");
    } else {
        tracing::debug!(reason = error.reason_code(), %error, "{message}");
    }
}
