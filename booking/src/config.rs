//! Configuration management for the desk booking service.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unset variables fall back to their defaults; variables that are set but
//! cannot be parsed are reported as [`ConfigError`] instead of being ignored.

use crate::boundary::Actor;
use crate::policy::{BookingPolicy, ContactHandlePolicy, DEFAULT_HORIZON_DAYS};
use deskbook_core::identity::Identity;
use deskbook_core::seat::{SeatCatalog, SeatPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://bookings.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SEAT_CATALOG: &str = "A1,A2,A3,A4,B1,B2,B3,B4";
const DEFAULT_INTRO_IMAGE_PATH: &str = "office_map.png";
const DEFAULT_CONSOLE_ACTOR_ID: &str = "console";

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to a value that cannot be parsed.
    #[error("Invalid value for {variable}: {value:?} ({expected})")]
    InvalidValue {
        /// The environment variable name.
        variable: &'static str,
        /// The offending value.
        value: String,
        /// What would have been accepted.
        expected: &'static str,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Reservation database configuration
    pub database: DatabaseConfig,
    /// Booking rules and office layout
    pub booking: BookingConfig,
    /// Process-level settings
    pub server: ServerConfig,
}

/// Reservation database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

/// Booking rules and office layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Seat names in display order
    pub seats: Vec<String>,
    /// Identities allowed to use administrative commands
    pub admin_ids: Vec<Identity>,
    /// Whether seats outside the catalog may be booked
    pub seat_policy: SeatPolicy,
    /// Contact handle validation
    pub contact_handle_policy: ContactHandlePolicy,
    /// How many dates the availability scan covers
    pub horizon_days: u32,
    /// Image attached to the introductory reply
    pub intro_image_path: PathBuf,
}

/// Process-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Prometheus exporter listen address (exporter disabled when unset)
    pub metrics_addr: Option<String>,
    /// Who the console binary acts as
    pub console_actor: ConsoleActorConfig,
}

/// The caller the console binary impersonates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleActorConfig {
    /// `DESKBOOK_ACTOR_ID`
    pub id: Identity,
    /// `DESKBOOK_ACTOR_NAME`, falling back to `USER`
    pub display_name: String,
    /// `DESKBOOK_ACTOR_USERNAME`
    pub username: Option<String>,
}

impl ConsoleActorConfig {
    /// The actor commands typed at the console run as.
    #[must_use]
    pub fn actor(&self) -> Actor {
        let actor = Actor::new(self.id.clone(), self.display_name.clone());
        match &self.username {
            Some(username) => actor.with_username(username.clone()),
            None => actor,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is set to something
    /// that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is set to something
    /// that cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            database: DatabaseConfig {
                url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                max_connections: var("DATABASE_MAX_CONNECTIONS")
                    .map(|raw| parse_positive("DATABASE_MAX_CONNECTIONS", raw))
                    .transpose()?
                    .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            },
            booking: BookingConfig {
                seats: split_list(
                    &var("SEAT_CATALOG").unwrap_or_else(|| DEFAULT_SEAT_CATALOG.to_string()),
                ),
                admin_ids: var("ADMIN_IDS")
                    .map(|ids| split_list(&ids).into_iter().map(Identity::new).collect())
                    .unwrap_or_default(),
                seat_policy: var("SEAT_POLICY")
                    .map(|v| parse_seat_policy(&v))
                    .transpose()?
                    .unwrap_or_default(),
                contact_handle_policy: var("CONTACT_HANDLE_POLICY")
                    .map(|v| parse_contact_policy(&v))
                    .transpose()?
                    .unwrap_or_default(),
                horizon_days: parse_or(
                    "AVAILABILITY_HORIZON_DAYS",
                    var("AVAILABILITY_HORIZON_DAYS"),
                    DEFAULT_HORIZON_DAYS,
                    "a non-negative integer",
                )?,
                intro_image_path: var("INTRO_IMAGE_PATH")
                    .map_or_else(|| PathBuf::from(DEFAULT_INTRO_IMAGE_PATH), PathBuf::from),
            },
            server: ServerConfig {
                metrics_addr: var("METRICS_ADDR"),
                console_actor: ConsoleActorConfig {
                    id: var("DESKBOOK_ACTOR_ID")
                        .map_or_else(|| Identity::new(DEFAULT_CONSOLE_ACTOR_ID), Identity::new),
                    display_name: var("DESKBOOK_ACTOR_NAME")
                        .or_else(|| var("USER"))
                        .unwrap_or_default(),
                    username: var("DESKBOOK_ACTOR_USERNAME"),
                },
            },
        })
    }

    /// The seat catalog described by this configuration.
    #[must_use]
    pub fn seat_catalog(&self) -> SeatCatalog {
        SeatCatalog::new(&self.booking.seats)
    }

    /// The booking policy described by this configuration.
    #[must_use]
    pub const fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy {
            seats: self.booking.seat_policy,
            contact_handles: self.booking.contact_handle_policy,
            horizon_days: self.booking.horizon_days,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T: FromStr>(
    variable: &'static str,
    value: Option<String>,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            variable,
            value: raw,
            expected,
        }),
    }
}

fn parse_positive(variable: &'static str, raw: String) -> Result<u32, ConfigError> {
    match raw.parse::<NonZeroU32>() {
        Ok(n) => Ok(n.get()),
        Err(_) => Err(ConfigError::InvalidValue {
            variable,
            value: raw,
            expected: "a positive integer",
        }),
    }
}

fn parse_seat_policy(raw: &str) -> Result<SeatPolicy, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "unrestricted" | "any" => Ok(SeatPolicy::Unrestricted),
        "catalog" | "catalog_only" => Ok(SeatPolicy::CatalogOnly),
        _ => Err(ConfigError::InvalidValue {
            variable: "SEAT_POLICY",
            value: raw.to_string(),
            expected: "unrestricted or catalog",
        }),
    }
}

fn parse_contact_policy(raw: &str) -> Result<ContactHandlePolicy, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "required" | "require_at" => Ok(ContactHandlePolicy::RequireAt),
        "optional" => Ok(ContactHandlePolicy::Optional),
        _ => Err(ConfigError::InvalidValue {
            variable: "CONTACT_HANDLE_POLICY",
            value: raw.to_string(),
            expected: "required or optional",
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database.url, "sqlite://bookings.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.seat_catalog().len(), 8);
        assert!(config.booking.admin_ids.is_empty());
        assert_eq!(config.booking_policy(), BookingPolicy::default());
        assert_eq!(config.booking.intro_image_path, PathBuf::from("office_map.png"));
        assert_eq!(config.server.metrics_addr, None);
    }

    #[test]
    fn lists_are_trimmed_and_blank_entries_dropped() {
        let config = load(&[("SEAT_CATALOG", " c1, c2 ,,C3 "), ("ADMIN_IDS", "210993, 42")]).unwrap();
        assert_eq!(config.booking.seats, ["c1", "c2", "C3"]);
        assert_eq!(
            config.booking.admin_ids,
            [Identity::from(210_993), Identity::from(42)]
        );
    }

    #[test]
    fn policies_parse_case_insensitively() {
        let config = load(&[
            ("SEAT_POLICY", "Catalog"),
            ("CONTACT_HANDLE_POLICY", "OPTIONAL"),
            ("AVAILABILITY_HORIZON_DAYS", "14"),
        ])
        .unwrap();
        let policy = config.booking_policy();
        assert_eq!(policy.seats, SeatPolicy::CatalogOnly);
        assert_eq!(policy.contact_handles, ContactHandlePolicy::Optional);
        assert_eq!(policy.horizon_days, 14);
    }

    #[test]
    fn unparseable_values_are_errors() {
        assert!(matches!(
            load(&[("AVAILABILITY_HORIZON_DAYS", "a month")]),
            Err(ConfigError::InvalidValue { variable: "AVAILABILITY_HORIZON_DAYS", .. })
        ));
        assert!(matches!(
            load(&[("SEAT_POLICY", "strict")]),
            Err(ConfigError::InvalidValue { variable: "SEAT_POLICY", .. })
        ));
    }

    #[test]
    fn zero_connections_is_rejected() {
        assert!(matches!(
            load(&[("DATABASE_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::InvalidValue { variable: "DATABASE_MAX_CONNECTIONS", .. })
        ));
        assert!(matches!(
            load(&[("DATABASE_MAX_CONNECTIONS", "-3")]),
            Err(ConfigError::InvalidValue { variable: "DATABASE_MAX_CONNECTIONS", .. })
        ));
        assert_eq!(
            load(&[("DATABASE_MAX_CONNECTIONS", "1")]).unwrap().database.max_connections,
            1
        );
    }

    #[test]
    fn console_actor_comes_from_configuration() {
        let config = load(&[
            ("DESKBOOK_ACTOR_ID", "210993"),
            ("USER", "ivan_shell"),
            ("DESKBOOK_ACTOR_USERNAME", "ivan"),
        ])
        .unwrap();
        let actor = config.server.console_actor.actor();
        assert_eq!(actor.identity, Identity::from(210_993));
        assert_eq!(actor.display_name, "ivan_shell");
        assert_eq!(actor.handle().as_deref(), Some("@ivan"));

        let named = load(&[("DESKBOOK_ACTOR_NAME", "Ivan"), ("USER", "ivan_shell")]).unwrap();
        assert_eq!(named.server.console_actor.display_name, "Ivan");

        let anonymous = load(&[]).unwrap().server.console_actor.actor();
        assert_eq!(anonymous.identity, Identity::new("console"));
        assert_eq!(anonymous.handle(), None);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("DATABASE_URL", "  "), ("METRICS_ADDR", "")]).unwrap();
        assert_eq!(config.database.url, "sqlite://bookings.db");
        assert_eq!(config.server.metrics_addr, None);
    }
}
