//! Dispatches parsed commands to the booking engine.

use super::command::{Command, CommandError};
use super::{Actor, AdminList, Reply, render};
use crate::engine::{BookingEngine, BookingRequest};
use deskbook_core::environment::{Clock, IdentityGenerator};
use deskbook_core::store::ReservationStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Entry point for every inbound command.
///
/// Holds the shared engine, the administrator allow-list and the path of the
/// image attached to the introduction.
pub struct Gateway<S, C, G> {
    engine: Arc<BookingEngine<S, C, G>>,
    admins: AdminList,
    intro_image: PathBuf,
}

impl<S, C, G> Gateway<S, C, G>
where
    S: ReservationStore,
    C: Clock,
    G: IdentityGenerator,
{
    /// Create a gateway.
    pub fn new(engine: Arc<BookingEngine<S, C, G>>, admins: AdminList, intro_image: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            admins,
            intro_image: intro_image.into(),
        }
    }

    /// The engine behind this gateway.
    pub fn engine(&self) -> &Arc<BookingEngine<S, C, G>> {
        &self.engine
    }

    /// Parse and run one command line.
    pub async fn handle_line(&self, actor: &Actor, line: &str) -> Reply {
        match Command::parse(line) {
            Ok(command) => self.handle(actor, command).await,
            Err(CommandError::NotACommand) => Reply::text(render::NOT_A_COMMAND),
            Err(CommandError::Unknown(name)) => {
                Reply::text(format!("Unknown command /{name}. {}", render::NOT_A_COMMAND))
            }
            Err(CommandError::Usage(usage)) => Reply::text(usage),
        }
    }

    /// Run one parsed command on behalf of `actor`.
    #[tracing::instrument(skip(self, actor, command), fields(actor = %actor.identity))]
    pub async fn handle(&self, actor: &Actor, command: Command) -> Reply {
        if command.is_privileged() && !self.admins.contains(&actor.identity) {
            tracing::warn!(?command, "Refused privileged command");
            return Reply::text(render::NOT_ALLOWED);
        }

        let catalog = self.engine.catalog();
        match command {
            Command::Start => self.intro().await,

            Command::Book {
                date,
                seat,
                contact_handle,
            } => {
                let handle = contact_handle.or_else(|| actor.handle()).unwrap_or_default();
                let request = BookingRequest::new(actor.identity.clone(), date, seat, handle)
                    .with_actor_names(actor.username.clone().unwrap_or_default(), actor.display_name.clone());
                match self.engine.create_booking(request).await {
                    Ok(confirmation) => Reply::text(render::booked(&confirmation)),
                    Err(error) => Reply::text(render::error(&error, catalog)),
                }
            }

            Command::Cancel { date, seat } => {
                match self.engine.cancel_booking(&actor.identity, &date, &seat).await {
                    Ok(cancelled) => Reply::text(render::cancelled(&cancelled)),
                    Err(error) => Reply::text(render::error(&error, catalog)),
                }
            }

            Command::MyBookings => match self.engine.list_own_bookings(&actor.identity).await {
                Ok(bookings) => Reply::text(render::own_bookings(&bookings)),
                Err(error) => Reply::text(render::error(&error, catalog)),
            },

            Command::BookingsOn { date } => match self.engine.list_bookings_on_date(&date).await {
                Ok(occupancy) => Reply::text(render::bookings_on(&date, &occupancy)),
                Err(error) => Reply::text(render::error(&error, catalog)),
            },

            Command::Free => match self.engine.nearest_availability().await {
                Ok(found) => Reply::text(render::availability(
                    found.as_ref(),
                    self.engine.policy().horizon_days,
                )),
                Err(error) => Reply::text(render::error(&error, catalog)),
            },

            Command::AdminBook {
                contact_handle,
                display_name,
                date,
                seat,
            } => {
                let request = BookingRequest::new(actor.identity.clone(), date, seat, contact_handle.clone())
                    .with_actor_names(actor.username.clone().unwrap_or_default(), actor.display_name.clone())
                    .on_behalf_of(display_name.clone());
                match self.engine.create_booking(request).await {
                    Ok(confirmation) => Reply::text(render::booked_for(&confirmation, &display_name, &contact_handle)),
                    Err(error) => Reply::text(render::error(&error, catalog)),
                }
            }

            Command::AdminCancel { date, seat } => match self.engine.cancel_any_booking(&date, &seat).await {
                Ok(cancelled) => Reply::text(render::cancelled(&cancelled)),
                Err(error) => Reply::text(render::error(&error, catalog)),
            },
        }
    }

    async fn intro(&self) -> Reply {
        let reply = Reply::text(render::INTRO);
        match tokio::fs::try_exists(&self.intro_image).await {
            Ok(true) => reply.with_image(self.intro_image.clone()),
            Ok(false) | Err(_) => {
                tracing::warn!(path = %self.intro_image.display(), "Intro image not found, sending text only");
                Reply::text(format!("{}\n\n{}", render::INTRO, render::MAP_UNAVAILABLE))
            }
        }
    }
}
