//! Seat identifiers and the fixed seat catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A seat identifier, always uppercase.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(String);

impl SeatId {
    /// Normalize a raw seat token: trimmed and uppercased.
    ///
    /// Returns `None` for a blank token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_uppercase()))
    }

    /// Get the seat name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the booking engine treats seats outside the catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatPolicy {
    /// Any non-blank seat name can be booked; unknown seats are only logged.
    #[default]
    Unrestricted,
    /// Only catalog seats can be booked.
    CatalogOnly,
}

/// The fixed, enumerable set of bookable seats.
///
/// Iteration follows the configured order with duplicates removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeatCatalog {
    seats: Vec<SeatId>,
}

impl SeatCatalog {
    /// Build a catalog from raw seat tokens.
    ///
    /// Blank tokens are skipped; later duplicates of an earlier seat are dropped.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seats: Vec<SeatId> = Vec::new();
        for seat in tokens.into_iter().filter_map(|t| SeatId::parse(t.as_ref())) {
            if !seats.contains(&seat) {
                seats.push(seat);
            }
        }
        Self { seats }
    }

    /// Whether a raw token names a catalog seat (case-insensitive).
    #[must_use]
    pub fn is_known_seat(&self, token: &str) -> bool {
        SeatId::parse(token).is_some_and(|seat| self.contains(&seat))
    }

    /// Whether an already-normalized seat is in the catalog.
    #[must_use]
    pub fn contains(&self, seat: &SeatId) -> bool {
        self.seats.contains(seat)
    }

    /// All seats in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &SeatId> {
        self.seats.iter()
    }

    /// Number of seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether the catalog has no seats
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

impl<'a> IntoIterator for &'a SeatCatalog {
    type Item = &'a SeatId;
    type IntoIter = std::slice::Iter<'a, SeatId>;

    fn into_iter(self) -> Self::IntoIter {
        self.seats.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_tokens_are_uppercased() {
        assert_eq!(SeatId::parse(" a1 ").map(|s| s.to_string()), Some("A1".to_string()));
        assert_eq!(SeatId::parse("   "), None);
    }

    #[test]
    fn catalog_lookup_ignores_case() {
        let catalog = SeatCatalog::new(["A1", "A2"]);
        assert!(catalog.is_known_seat("a2"));
        assert!(!catalog.is_known_seat("B1"));
        assert!(!catalog.is_known_seat(""));
    }

    #[test]
    fn catalog_keeps_first_occurrence_order() {
        let catalog = SeatCatalog::new(["b2", "A1", "B2", "", "a1", "C3"]);
        let names: Vec<&str> = catalog.iter().map(SeatId::as_str).collect();
        assert_eq!(names, ["B2", "A1", "C3"]);
        assert_eq!(catalog.len(), 3);
    }
}
