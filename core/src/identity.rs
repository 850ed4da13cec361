//! Opaque actor identities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token identifying the actor that holds a reservation.
///
/// Real users arrive with a numeric id from the chat transport; proxy bookings
/// use a generated surrogate. Both are stored as text so the storage schema
/// does not depend on either representation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an `Identity` from any string token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identity, returning the token
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<i64> for Identity {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for Identity {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for Identity {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
