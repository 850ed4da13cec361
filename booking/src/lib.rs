//! # Deskbook
//!
//! Seat reservations for a shared office: people claim a named desk for a
//! calendar date, may book on behalf of a colleague, and can ask for the
//! nearest date that still has a free seat.
//!
//! ## Architecture
//!
//! - [`engine`]: the [`BookingEngine`] with every create, cancel and query operation
//! - [`policy`]: seat catalog and contact handle rules, availability horizon
//! - [`boundary`]: slash-command parsing, admin authorization and reply text
//! - [`config`]: environment-driven [`Config`]
//! - [`metrics`]: business counters
//!
//! Storage lives behind [`ReservationStore`](deskbook_core::ReservationStore);
//! the production implementation is
//! [`SqliteReservationStore`](deskbook_sqlite::SqliteReservationStore).
//!
//! ## Quick Start
//!
//! ```no_run
//! use deskbook::{AdminList, BookingEngine, Config, Gateway};
//! use deskbook_core::{SystemClock, UuidIdentityGenerator};
//! use deskbook_sqlite::SqliteReservationStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let store = SqliteReservationStore::connect(&config.database.url, config.database.max_connections).await?;
//! store.migrate().await?;
//!
//! let engine = Arc::new(BookingEngine::new(
//!     store,
//!     SystemClock,
//!     UuidIdentityGenerator,
//!     config.seat_catalog(),
//!     config.booking_policy(),
//! ));
//! let _gateway = Gateway::new(
//!     engine,
//!     AdminList::new(config.booking.admin_ids.clone()),
//!     config.booking.intro_image_path.clone(),
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod boundary;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod policy;

pub use boundary::{Actor, AdminList, Command, CommandError, Gateway, Reply};
pub use config::{Config, ConfigError, ConsoleActorConfig};
pub use engine::{
    Availability, BookingConfirmation, BookingEngine, BookingRequest, CancelledBooking, OwnBooking, ProxyTarget,
    SeatOccupancy,
};
pub use error::{BookingError, Result};
pub use policy::{BookingPolicy, ContactHandlePolicy};
