//! # Deskbook Core
//!
//! Core types and traits for the shared-office seat reservation service.
//!
//! This crate holds everything that carries an invariant and nothing that
//! performs I/O:
//!
//! - **Date Normalizer** ([`date`]): `DD.MM.YY` tokens to canonical calendar dates
//! - **Seat Catalog** ([`seat`]): the fixed set of bookable seats
//! - **Reservation** ([`reservation`]): one occupied seat on one date
//! - **Reservation Store** ([`store`]): the storage contract both backends implement
//! - **Environment** ([`environment`]): injected clock and identity generation
//!
//! ## Architecture Principles
//!
//! - The store is the single source of truth; nothing caches reservations
//! - Identities are opaque tokens, whatever the upstream representation
//! - Dependencies are injected through traits, never reached through globals
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use deskbook_core::date::{normalize, DateError};
//!
//! let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap_or_default();
//! assert_eq!(
//!     normalize("11.06.25", today),
//!     Ok(NaiveDate::from_ymd_opt(2025, 6, 11).unwrap_or_default())
//! );
//! assert_eq!(normalize("09.06.25", today), Err(DateError::PastDate));
//! ```

pub mod date;
pub mod environment;
pub mod identity;
pub mod reservation;
pub mod seat;
pub mod store;

// Re-export commonly used types
pub use chrono::NaiveDate;
pub use date::{DateError, format_date_token, iso_week, normalize, parse_date_token};
pub use environment::{Clock, IdentityGenerator, SystemClock, UuidIdentityGenerator};
pub use identity::Identity;
pub use reservation::Reservation;
pub use seat::{SeatCatalog, SeatId, SeatPolicy};
pub use store::{ReservationStore, StoreError};
