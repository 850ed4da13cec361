//! Request/response boundary.
//!
//! Turns chat-style command lines into booking engine calls and engine
//! results into reply text. Authorization of privileged commands happens
//! here, against an externally supplied [`AdminList`]; the engine itself
//! never checks who is calling.

pub mod command;
pub mod gateway;
pub mod render;

pub use command::{Command, CommandError};
pub use gateway::Gateway;

use deskbook_core::identity::Identity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// The caller of a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable identity of the real user.
    pub identity: Identity,
    /// Username without the leading `@`, when the user has one.
    pub username: Option<String>,
    /// Name shown next to bookings.
    pub display_name: String,
}

impl Actor {
    /// Create an actor with no username.
    pub fn new(identity: impl Into<Identity>, display_name: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            username: None,
            display_name: display_name.into(),
        }
    }

    /// Attach a username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// The `@username` handle, if the actor has a username.
    #[must_use]
    pub fn handle(&self) -> Option<String> {
        self.username
            .as_deref()
            .map(|u| u.trim_start_matches('@'))
            .filter(|u| !u.is_empty())
            .map(|u| format!("@{u}"))
    }
}

/// Identities allowed to run administrative commands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminList {
    ids: HashSet<Identity>,
}

impl AdminList {
    /// Build the list from configured identities.
    pub fn new(ids: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Whether `identity` may run administrative commands.
    #[must_use]
    pub fn contains(&self, identity: &Identity) -> bool {
        self.ids.contains(identity)
    }

    /// Number of administrators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nobody is an administrator.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// What gets sent back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Message text.
    pub text: String,
    /// Image to attach, if any.
    pub image: Option<PathBuf>,
}

impl Reply {
    /// A text-only reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    /// Attach an image.
    #[must_use]
    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_derived_from_username() {
        let actor = Actor::new(7_i64, "Ivan").with_username("ivan");
        assert_eq!(actor.handle().as_deref(), Some("@ivan"));

        let already_prefixed = Actor::new(7_i64, "Ivan").with_username("@ivan");
        assert_eq!(already_prefixed.handle().as_deref(), Some("@ivan"));

        assert_eq!(Actor::new(7_i64, "Ivan").handle(), None);
    }

    #[test]
    fn admin_list_membership() {
        let admins = AdminList::new([Identity::from(210_993)]);
        assert!(admins.contains(&Identity::from(210_993)));
        assert!(!admins.contains(&Identity::from(1)));
        assert_eq!(admins.len(), 1);
        assert!(AdminList::default().is_empty());
    }
}
