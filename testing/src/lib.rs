//! # Deskbook Testing
//!
//! Testing utilities and helpers for the desk booking service.
//!
//! This crate provides:
//! - Mock implementations of the environment traits (`FixedClock`,
//!   `SequentialIdentityGenerator`)
//! - [`InMemoryReservationStore`], a `HashMap`-backed `ReservationStore`
//! - Fixture helpers for dates, seats and reservations
//!
//! ## Example
//!
//! ```ignore
//! use deskbook_testing::{test_clock, InMemoryReservationStore, SequentialIdentityGenerator};
//!
//! #[tokio::test]
//! async fn books_a_seat() {
//!     let engine = BookingEngine::new(
//!         InMemoryReservationStore::new(),
//!         test_clock(),
//!         SequentialIdentityGenerator::new(),
//!         SeatCatalog::new(["A1", "A2"]),
//!         BookingPolicy::default(),
//!     );
//!     // ...
//! }
//! ```

use chrono::NaiveDate;
use deskbook_core::environment::{Clock, IdentityGenerator};
use deskbook_core::identity::Identity;

mod store_mocks;

pub use store_mocks::InMemoryReservationStore;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, Identity, IdentityGenerator, NaiveDate};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same day, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use deskbook_testing::mocks::FixedClock;
    /// use deskbook_core::environment::Clock;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap_or_default();
    /// let clock = FixedClock::new(day);
    /// assert_eq!(clock.today(), clock.today());
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        today: NaiveDate,
    }

    impl FixedClock {
        /// Create a new fixed clock on the given day
        #[must_use]
        pub const fn new(today: NaiveDate) -> Self {
            Self { today }
        }
    }

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.today
        }
    }

    /// Create the default fixed clock for tests (2025-06-10, a Tuesday)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(super::helpers::day(2025, 6, 10))
    }

    /// Predictable surrogate identities: `guest-1`, `guest-2`, ...
    #[derive(Debug, Default)]
    pub struct SequentialIdentityGenerator {
        next: AtomicU64,
    }

    impl SequentialIdentityGenerator {
        /// Create a generator starting at `guest-1`
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }

        /// How many identities have been handed out
        #[must_use]
        pub fn issued(&self) -> u64 {
            self.next.load(Ordering::SeqCst)
        }
    }

    impl IdentityGenerator for SequentialIdentityGenerator {
        fn new_identity(&self) -> Identity {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            Identity::new(format!("guest-{n}"))
        }
    }
}

/// Test helpers and fixtures
pub mod helpers {
    use super::NaiveDate;
    use deskbook_core::seat::SeatId;

    /// Build a fixture date.
    ///
    /// # Panics
    ///
    /// Panics if the arguments do not form a real calendar date.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("fixture date should be valid")
    }

    /// Build a fixture seat.
    ///
    /// # Panics
    ///
    /// Panics if the token is blank.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn seat(token: &str) -> SeatId {
        SeatId::parse(token).expect("fixture seat should not be blank")
    }

    /// Install a test-friendly tracing subscriber.
    ///
    /// Safe to call from every test; only the first call installs anything.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::{day, init_test_tracing, seat};
pub use mocks::{FixedClock, SequentialIdentityGenerator, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.today(), clock.today());
        assert_eq!(clock.today(), day(2025, 6, 10));
    }

    #[test]
    fn sequential_identities_count_up() {
        let generator = SequentialIdentityGenerator::new();
        assert_eq!(generator.new_identity().as_str(), "guest-1");
        assert_eq!(generator.new_identity().as_str(), "guest-2");
        assert_eq!(generator.issued(), 2);
    }

    #[test]
    fn seat_helper_uppercases() {
        assert_eq!(seat("b3").as_str(), "B3");
    }
}
