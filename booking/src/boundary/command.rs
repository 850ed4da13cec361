//! Slash-command parsing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Usage line for `/book`.
pub const BOOK_USAGE: &str = "Usage: /book <DD.MM.YY> <seat> [@handle]";
/// Usage line for `/cancel`.
pub const CANCEL_USAGE: &str = "Usage: /cancel <DD.MM.YY> <seat>";
/// Usage line for `/bookings`.
pub const BOOKINGS_USAGE: &str = "Usage: /bookings <DD.MM.YY>";
/// Usage line for `/admin_book`.
pub const ADMIN_BOOK_USAGE: &str = "Usage: /admin_book <@handle> <name> <DD.MM.YY> <seat>";
/// Usage line for `/admin_cancel`.
pub const ADMIN_CANCEL_USAGE: &str = "Usage: /admin_cancel <DD.MM.YY> <seat>";

/// A parsed command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Introduction and help.
    Start,
    /// Book a seat for yourself.
    Book {
        /// Raw date token.
        date: String,
        /// Raw seat token.
        seat: String,
        /// Explicit contact handle; the caller's own handle is used when absent.
        contact_handle: Option<String>,
    },
    /// Cancel one of your bookings.
    Cancel {
        /// Raw date token.
        date: String,
        /// Raw seat token.
        seat: String,
    },
    /// List your bookings.
    MyBookings,
    /// List everyone's bookings on a date.
    BookingsOn {
        /// Raw date token.
        date: String,
    },
    /// Find the nearest date with a free seat.
    Free,
    /// Book a seat on behalf of someone else (administrators only).
    AdminBook {
        /// The target's contact handle.
        contact_handle: String,
        /// The target's display name.
        display_name: String,
        /// Raw date token.
        date: String,
        /// Raw seat token.
        seat: String,
    },
    /// Cancel any booking (administrators only).
    AdminCancel {
        /// Raw date token.
        date: String,
        /// Raw seat token.
        seat: String,
    },
}

/// Why a line could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Blank input, or text that is not a slash command.
    #[error("Not a command")]
    NotACommand,

    /// A command nobody handles.
    #[error("Unknown command /{0}")]
    Unknown(String),

    /// A known command with the wrong arguments.
    #[error("{0}")]
    Usage(&'static str),
}

impl Command {
    /// Parse a line such as `/book 25.12.25 A1 @me`.
    ///
    /// A `@botname` suffix on the command word is ignored. Extra trailing
    /// arguments are ignored as well.
    ///
    /// # Errors
    ///
    /// - [`CommandError::NotACommand`] for blank input or text without a leading `/`
    /// - [`CommandError::Unknown`] for an unrecognized command word
    /// - [`CommandError::Usage`] when required arguments are missing
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let head = words
            .next()
            .and_then(|w| w.strip_prefix('/'))
            .ok_or(CommandError::NotACommand)?;
        let name = head.split('@').next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        match name.as_str() {
            "start" | "help" => Ok(Self::Start),
            "book" => match args.as_slice() {
                [date, seat, rest @ ..] => Ok(Self::Book {
                    date: (*date).to_string(),
                    seat: (*seat).to_string(),
                    contact_handle: rest.first().map(|h| (*h).to_string()),
                }),
                _ => Err(CommandError::Usage(BOOK_USAGE)),
            },
            "cancel" => match args.as_slice() {
                [date, seat, ..] => Ok(Self::Cancel {
                    date: (*date).to_string(),
                    seat: (*seat).to_string(),
                }),
                _ => Err(CommandError::Usage(CANCEL_USAGE)),
            },
            "mybookings" => Ok(Self::MyBookings),
            "bookings" => match args.as_slice() {
                [date, ..] => Ok(Self::BookingsOn {
                    date: (*date).to_string(),
                }),
                _ => Err(CommandError::Usage(BOOKINGS_USAGE)),
            },
            "free" => Ok(Self::Free),
            // The name may span several words: everything between the handle
            // and the trailing date and seat.
            "admin_book" => match args.as_slice() {
                [handle, name @ .., date, seat] if !name.is_empty() => Ok(Self::AdminBook {
                    contact_handle: (*handle).to_string(),
                    display_name: name.join(" "),
                    date: (*date).to_string(),
                    seat: (*seat).to_string(),
                }),
                _ => Err(CommandError::Usage(ADMIN_BOOK_USAGE)),
            },
            "admin_cancel" => match args.as_slice() {
                [date, seat, ..] => Ok(Self::AdminCancel {
                    date: (*date).to_string(),
                    seat: (*seat).to_string(),
                }),
                _ => Err(CommandError::Usage(ADMIN_CANCEL_USAGE)),
            },
            _ => Err(CommandError::Unknown(name)),
        }
    }

    /// Whether only administrators may run this command.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Self::AdminBook { .. } | Self::AdminCancel { .. })
    }
}
