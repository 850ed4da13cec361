//! Environment traits - injected dependencies for the booking engine.
//!
//! All sources of non-determinism (the current day, fresh identities) are
//! abstracted behind traits so that production and tests can plug in
//! different implementations.

use crate::identity::Identity;
use chrono::NaiveDate;
use uuid::Uuid;

/// Clock trait - abstracts "what day is it" for testability
///
/// Bookings are calendar-date based; no timezone handling is involved.
///
/// # Examples
///
/// ```ignore
/// // Test - fixed day for deterministic tests
/// struct FixedClock { today: NaiveDate }
/// impl Clock for FixedClock {
///     fn today(&self) -> NaiveDate {
///         self.today
///     }
/// }
/// ```
pub trait Clock: Send + Sync {
    /// The calendar day requests are evaluated against.
    fn today(&self) -> NaiveDate;
}

/// System clock reading the process-local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// The single "new identity" capability.
///
/// Proxy bookings are keyed under a freshly generated surrogate identity;
/// every call must return a token that has never been handed out before.
pub trait IdentityGenerator: Send + Sync {
    /// Generate a fresh, globally unique identity.
    fn new_identity(&self) -> Identity;
}

/// Production generator: random UUID v4 tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdentityGenerator;

impl IdentityGenerator for UuidIdentityGenerator {
    fn new_identity(&self) -> Identity {
        Identity::new(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_generator_never_repeats() {
        let generator = UuidIdentityGenerator;
        let a = generator.new_identity();
        let b = generator.new_identity();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
