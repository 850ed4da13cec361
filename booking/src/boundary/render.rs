//! Human-readable reply text.

use crate::engine::{Availability, BookingConfirmation, CancelledBooking, OwnBooking, SeatOccupancy};
use crate::error::BookingError;
use deskbook_core::date::{DateError, format_date_token};
use deskbook_core::seat::{SeatCatalog, SeatId};
use std::fmt::Write as _;

/// Introductory text sent for `/start`.
pub const INTRO: &str = "Hi! Book a desk with /book <DD.MM.YY> <seat> [@handle].\n\
Example: /book 25.12.25 A1 @me\n\
Cancel a booking: /cancel <DD.MM.YY> <seat>\n\
Your bookings: /mybookings\n\
Who sits where: /bookings <DD.MM.YY>\n\
Nearest free seat: /free\n\
Administrative commands are available to administrators only.";

/// Line appended to the introduction when the office map cannot be attached.
pub const MAP_UNAVAILABLE: &str = "(The office map is not available right now.)";

/// Refusal for privileged commands.
pub const NOT_ALLOWED: &str = "You are not allowed to use this command.";

/// Hint for lines that are not commands.
pub const NOT_A_COMMAND: &str = "Send /start to see the available commands.";

/// Render a booking confirmation.
#[must_use]
pub fn booked(confirmation: &BookingConfirmation) -> String {
    format!(
        "Booked seat {} on {}.",
        confirmation.seat,
        format_date_token(confirmation.date)
    )
}

/// Render a confirmation for a booking made on someone's behalf.
#[must_use]
pub fn booked_for(confirmation: &BookingConfirmation, display_name: &str, contact_handle: &str) -> String {
    format!(
        "Booked seat {} on {} for {display_name} ({contact_handle}).",
        confirmation.seat,
        format_date_token(confirmation.date)
    )
}

/// Render a cancellation.
#[must_use]
pub fn cancelled(cancelled: &CancelledBooking) -> String {
    let suffix = if cancelled.was_proxy { " (booked on someone's behalf)" } else { "" };
    format!(
        "Booking of seat {} on {} cancelled{suffix}.",
        cancelled.seat,
        format_date_token(cancelled.date)
    )
}

/// Render the caller's bookings.
#[must_use]
pub fn own_bookings(bookings: &[OwnBooking]) -> String {
    if bookings.is_empty() {
        return "You have no bookings.".to_string();
    }
    let mut text = String::from("Your bookings:");
    for booking in bookings {
        let _ = write!(text, "\n{} - {}", format_date_token(booking.date), booking.seat);
    }
    text
}

/// Render the occupancy of one date.
#[must_use]
pub fn bookings_on(date_token: &str, occupancy: &[SeatOccupancy]) -> String {
    if occupancy.is_empty() {
        return format!("No bookings on {date_token}.");
    }
    let mut text = format!("Bookings on {date_token}:");
    for entry in occupancy {
        let _ = write!(text, "\n{} - {}", entry.seat, contact_or_dash(&entry.contact_handle));
        if !entry.holder_display_name.is_empty() {
            let _ = write!(text, " ({})", entry.holder_display_name);
        }
    }
    text
}

/// Render the result of the availability scan.
#[must_use]
pub fn availability(found: Option<&Availability>, horizon_days: u32) -> String {
    match found {
        Some(availability) => format!(
            "Nearest free date: {}\nFree seats: {}",
            format_date_token(availability.date),
            seat_list(&availability.free_seats)
        ),
        None => format!("No free seats in the next {horizon_days} days."),
    }
}

/// Render a rejected request.
#[must_use]
pub fn error(error: &BookingError, catalog: &SeatCatalog) -> String {
    match error {
        BookingError::Date(DateError::MalformedDate) => "Invalid date format. Use DD.MM.YY.".to_string(),
        BookingError::Date(DateError::InvalidCalendarDate) => "That date does not exist.".to_string(),
        BookingError::Date(DateError::PastDate) => "That date is in the past.".to_string(),
        BookingError::InvalidContactHandle { .. } => {
            "The contact handle must look like @username.".to_string()
        }
        BookingError::SeatTaken { date, seat } => {
            format!("Seat {seat} is already taken on {}.", format_date_token(*date))
        }
        BookingError::DuplicateBookingForDate { date, existing_seat } => format!(
            "You already have seat {existing_seat} booked on {}.",
            format_date_token(*date)
        ),
        BookingError::NoSuchBooking { date, seat } => {
            format!("There is no booking of seat {seat} on {}.", format_date_token(*date))
        }
        BookingError::UnknownSeat { seat } if catalog.is_empty() => format!("Unknown seat {seat:?}."),
        BookingError::UnknownSeat { seat } => {
            let known: Vec<SeatId> = catalog.iter().cloned().collect();
            format!("Unknown seat {seat:?}. Seats: {}.", seat_list(&known))
        }
        BookingError::Storage(_) => "Bookings are temporarily unavailable, please try again later.".to_string(),
    }
}

fn seat_list(seats: &[SeatId]) -> String {
    seats.iter().map(SeatId::as_str).collect::<Vec<_>>().join(", ")
}

fn contact_or_dash(handle: &str) -> &str {
    if handle.is_empty() { "-" } else { handle }
}
